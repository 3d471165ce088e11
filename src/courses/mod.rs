pub mod types;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::enrollments::{EnrollmentEngine, EnrollmentStatus};
use crate::shared::models::schema::courses;
use crate::shared::state::AppState;
use crate::shared::utils::DbPool;

pub use types::{Course, CourseSummary, CreateCourseRequest};

pub struct CourseEngine {
    db: DbPool,
}

impl CourseEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create_course(&self, req: CreateCourseRequest) -> Result<Course, String> {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            video_url: req.video_url,
            quiz_data: None,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        diesel::insert_into(courses::table)
            .values(&course)
            .execute(&mut conn)
            .map_err(|e| e.to_string())?;

        Ok(course)
    }

    pub async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        courses::table
            .filter(courses::id.eq(course_id))
            .first::<Course>(&mut conn)
            .optional()
            .map_err(|e| e.to_string())
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        courses::table
            .order(courses::title.desc())
            .load::<Course>(&mut conn)
            .map_err(|e| e.to_string())
    }
}

/// List the catalog together with the caller's enrollment status per course.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> impl IntoResponse {
    let engine = CourseEngine::new(state.conn.clone());
    let enrollments = EnrollmentEngine::new(state.conn.clone());

    let courses = match engine.list_courses().await {
        Ok(courses) => courses,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response()
        }
    };
    let mine = match enrollments.list_for_user(user.user_id).await {
        Ok(mine) => mine,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response()
        }
    };

    Json(serde_json::json!({
        "courses": courses.iter().map(CourseSummary::from).collect::<Vec<_>>(),
        "enrollments": mine.iter().map(EnrollmentStatus::from).collect::<Vec<_>>()
    }))
    .into_response()
}

/// Course detail plus the caller's enrollment, if any.
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
) -> impl IntoResponse {
    let engine = CourseEngine::new(state.conn.clone());
    let enrollments = EnrollmentEngine::new(state.conn.clone());

    match engine.get_course(course_id).await {
        Ok(Some(course)) => {
            let enrollment = match enrollments.find_for_user(user.user_id, course_id).await {
                Ok(enrollment) => enrollment,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": e })),
                    )
                        .into_response()
                }
            };
            Json(serde_json::json!({
                "course": CourseSummary::from(&course),
                "enrollment": enrollment
            }))
            .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Course not found" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(req): Json<CreateCourseRequest>,
) -> impl IntoResponse {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "title and description are required" })),
        )
            .into_response();
    }

    let engine = CourseEngine::new(state.conn.clone());
    match engine.create_course(req).await {
        Ok(course) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "course": CourseSummary::from(&course) })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

pub fn configure_course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/:id", get(get_course))
}
