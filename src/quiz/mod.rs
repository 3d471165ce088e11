pub mod engine;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub use engine::QuizEngine;
pub use error::QuizError;
pub use generator::QuizGenerator;
pub use types::{
    score_submission, validate_batch, ClientQuestion, QuizQuestion, QuizResult, QuizSubmission,
    OPTION_COUNT, QUESTIONS_PER_QUIZ,
};

pub fn configure_quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/courses/:id/quiz",
            get(handlers::get_quiz).post(handlers::submit_quiz),
        )
        .route(
            "/api/courses/:id/quiz/questions",
            post(handlers::replace_quiz_questions),
        )
}
