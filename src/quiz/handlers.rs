use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::engine::QuizEngine;
use super::error::QuizError;
use super::generator::QuizGenerator;
use super::types::{QuizResult, QuizSubmission};
use crate::auth::AuthenticatedUser;
use crate::shared::state::AppState;

fn engine(state: &AppState) -> QuizEngine {
    let generator = QuizGenerator::new(
        Arc::clone(&state.llm_provider),
        state.config.llm.model.clone(),
    );
    QuizEngine::new(state.conn.clone(), generator, state.config.quiz.allow_retakes)
}

/// Redacted question list for a course.
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, QuizError> {
    let questions = engine(&state).get_questions(course_id).await?;
    Ok(Json(serde_json::json!({ "questions": questions })))
}

/// Score the caller's answers and record completion on their enrollment.
pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<QuizResult>, QuizError> {
    let result = engine(&state)
        .submit(user.user_id, course_id, submission)
        .await?;
    Ok(Json(result))
}

/// Administrative wholesale replacement of a course's question set.
pub async fn replace_quiz_questions(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, QuizError> {
    let count = engine(&state).replace_questions(course_id, payload).await?;
    Ok(Json(serde_json::json!({
        "message": "Quiz questions added successfully",
        "courseId": course_id,
        "count": count
    })))
}
