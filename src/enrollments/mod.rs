use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::courses::{Course, CourseEngine, CourseSummary};
use crate::shared::models::schema::{courses, enrollments};
use crate::shared::state::AppState;
use crate::shared::utils::DbPool;

/// Watch progress at or above this percentage makes the quiz available.
pub const QUIZ_ELIGIBLE_THRESHOLD: f64 = 95.0;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = enrollments)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress: f64,
    pub completed: bool,
    pub quiz_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Derived lifecycle stage. Completion is terminal; before that the
    /// watch-progress threshold decides quiz availability.
    pub fn stage(&self) -> ProgressStage {
        if self.completed {
            ProgressStage::Completed
        } else if self.progress >= QUIZ_ELIGIBLE_THRESHOLD {
            ProgressStage::QuizEligible
        } else {
            ProgressStage::Watching
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Watching,
    QuizEligible,
    Completed,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Watching => write!(f, "watching"),
            Self::QuizEligible => write!(f, "quiz_eligible"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Per-course enrollment status as exposed on the catalog listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatus {
    pub course_id: Uuid,
    pub progress: f64,
    pub completed: bool,
}

impl From<&Enrollment> for EnrollmentStatus {
    fn from(e: &Enrollment) -> Self {
        Self {
            course_id: e.course_id,
            progress: e.progress,
            completed: e.completed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdateRequest {
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course: CourseSummary,
}

/// Progress may be refined by the client but never rolled back: the stored
/// value only moves toward 100.
pub fn apply_progress(current: f64, submitted: f64) -> f64 {
    submitted.clamp(0.0, 100.0).max(current)
}

pub struct EnrollmentEngine {
    db: DbPool,
}

impl EnrollmentEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Creates the caller's enrollment, or returns the existing one for the
    /// same (user, course) pair. The bool reports whether a row was created.
    pub async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<(Enrollment, bool), String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        let existing: Option<Enrollment> = enrollments::table
            .filter(enrollments::user_id.eq(user_id))
            .filter(enrollments::course_id.eq(course_id))
            .first(&mut conn)
            .optional()
            .map_err(|e| e.to_string())?;

        if let Some(enrollment) = existing {
            return Ok((enrollment, false));
        }

        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            progress: 0.0,
            completed: false,
            quiz_score: None,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(enrollments::table)
            .values(&enrollment)
            .execute(&mut conn)
            .map_err(|e| e.to_string())?;

        Ok((enrollment, true))
    }

    pub async fn get_enrollment(&self, enrollment_id: Uuid) -> Result<Option<Enrollment>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        enrollments::table
            .filter(enrollments::id.eq(enrollment_id))
            .first::<Enrollment>(&mut conn)
            .optional()
            .map_err(|e| e.to_string())
    }

    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        enrollments::table
            .filter(enrollments::user_id.eq(user_id))
            .filter(enrollments::course_id.eq(course_id))
            .first::<Enrollment>(&mut conn)
            .optional()
            .map_err(|e| e.to_string())
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        enrollments::table
            .filter(enrollments::user_id.eq(user_id))
            .order(enrollments::created_at.asc())
            .load::<Enrollment>(&mut conn)
            .map_err(|e| e.to_string())
    }

    pub async fn update_progress(
        &self,
        enrollment: &Enrollment,
        submitted: f64,
    ) -> Result<Enrollment, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        let applied = apply_progress(enrollment.progress, submitted);

        diesel::update(enrollments::table.filter(enrollments::id.eq(enrollment.id)))
            .set((
                enrollments::progress.eq(applied),
                enrollments::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| e.to_string())?;

        enrollments::table
            .filter(enrollments::id.eq(enrollment.id))
            .first::<Enrollment>(&mut conn)
            .map_err(|e| e.to_string())
    }

    pub async fn enrolled_courses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Enrollment, Course)>, String> {
        let mut conn = self.db.get().map_err(|e| e.to_string())?;

        enrollments::table
            .inner_join(courses::table)
            .filter(enrollments::user_id.eq(user_id))
            .order(enrollments::created_at.asc())
            .load::<(Enrollment, Course)>(&mut conn)
            .map_err(|e| e.to_string())
    }
}

/// Enroll the caller into a course. Re-enrolling returns the existing record.
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<EnrollRequest>,
) -> impl IntoResponse {
    let courses = CourseEngine::new(state.conn.clone());
    match courses.get_course(req.course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Course not found" })),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response()
        }
    }

    let engine = EnrollmentEngine::new(state.conn.clone());
    match engine.enroll(user.user_id, req.course_id).await {
        Ok((enrollment, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(serde_json::json!({ "enrollment": enrollment }))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

/// Record watch progress for the caller's own enrollment.
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(enrollment_id): Path<Uuid>,
    Json(req): Json<ProgressUpdateRequest>,
) -> impl IntoResponse {
    let engine = EnrollmentEngine::new(state.conn.clone());

    let enrollment = match engine.get_enrollment(enrollment_id).await {
        Ok(Some(enrollment)) => enrollment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Enrollment not found" })),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e })),
            )
                .into_response()
        }
    };

    if enrollment.user_id != user.user_id {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Enrollment belongs to another user" })),
        )
            .into_response();
    }

    match engine.update_progress(&enrollment, req.progress).await {
        Ok(updated) => {
            let stage = updated.stage();
            Json(serde_json::json!({ "enrollment": updated, "stage": stage })).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

/// The caller's enrollments with their course summaries.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> impl IntoResponse {
    let engine = EnrollmentEngine::new(state.conn.clone());

    match engine.enrolled_courses(user.user_id).await {
        Ok(rows) => {
            let enrolled: Vec<EnrolledCourse> = rows
                .into_iter()
                .map(|(enrollment, course)| EnrolledCourse {
                    course: CourseSummary::from(&course),
                    enrollment,
                })
                .collect();
            Json(serde_json::json!({ "enrolledCourses": enrolled })).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

pub fn configure_enrollment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/enroll", post(enroll))
        .route("/api/enrollments/:id", patch(update_progress))
        .route("/api/dashboard", get(dashboard))
}
