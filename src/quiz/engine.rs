use chrono::Utc;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::error::QuizError;
use super::generator::QuizGenerator;
use super::types::{
    score_submission, validate_batch, ClientQuestion, QuizQuestion, QuizResult, QuizSubmission,
};
use crate::courses::Course;
use crate::enrollments::Enrollment;
use crate::shared::models::schema::{courses, enrollments};
use crate::shared::utils::DbPool;

/// Quiz store and scoring gate. Questions live on the course row and are
/// replaced wholesale; the answer key is stripped before anything leaves
/// through the read path.
pub struct QuizEngine {
    db: DbPool,
    generator: QuizGenerator,
    allow_retakes: bool,
}

impl QuizEngine {
    pub fn new(db: DbPool, generator: QuizGenerator, allow_retakes: bool) -> Self {
        Self {
            db,
            generator,
            allow_retakes,
        }
    }

    /// Redacted question set for a course. Generates and persists the set on
    /// first access.
    pub async fn get_questions(&self, course_id: Uuid) -> Result<Vec<ClientQuestion>, QuizError> {
        let course = self.load_course(course_id)?;

        let questions = match stored_questions(&course) {
            Some(questions) => questions,
            None => {
                log::info!("course {course_id} has no stored quiz, generating");
                let generated = self
                    .generator
                    .generate(&course.title, &course.description)
                    .await?;
                self.store_questions(course_id, &generated)?;
                generated
            }
        };

        Ok(questions.iter().map(ClientQuestion::from).collect())
    }

    /// Administrative wholesale replacement of a course's question set.
    /// The batch is schema-validated as a unit; nothing is stored on failure.
    pub async fn replace_questions(
        &self,
        course_id: Uuid,
        payload: Value,
    ) -> Result<usize, QuizError> {
        if !payload.is_array() {
            return Err(QuizError::Validation(
                "Invalid or empty question list provided".to_string(),
            ));
        }
        let questions: Vec<QuizQuestion> = serde_json::from_value(payload)
            .map_err(|e| QuizError::Validation(format!("Invalid question format: {e}")))?;

        validate_batch(&questions).map_err(QuizError::Validation)?;

        // Shape is validated before existence: malformed input is 400 even
        // for unknown course ids.
        self.load_course(course_id)?;
        self.store_questions(course_id, &questions)?;

        Ok(questions.len())
    }

    /// Scores a submission against the stored answer key and records
    /// completion on the caller's enrollment.
    pub async fn submit(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        submission: QuizSubmission,
    ) -> Result<QuizResult, QuizError> {
        let course = self.load_course(course_id)?;

        let mut conn = self
            .db
            .get()
            .map_err(|e| QuizError::Database(e.to_string()))?;

        let enrollment: Enrollment = enrollments::table
            .filter(enrollments::user_id.eq(user_id))
            .filter(enrollments::course_id.eq(course_id))
            .first(&mut conn)
            .optional()
            .map_err(|e| QuizError::Database(e.to_string()))?
            .ok_or_else(|| QuizError::Forbidden("Not enrolled in course".to_string()))?;

        if enrollment.completed && !self.allow_retakes {
            return Err(QuizError::Forbidden("Quiz already completed".to_string()));
        }

        let questions = stored_questions(&course)
            .ok_or_else(|| QuizError::NotFound("Quiz questions not found".to_string()))?;

        let score = score_submission(&questions, &submission.answers);

        diesel::update(enrollments::table.filter(enrollments::id.eq(enrollment.id)))
            .set((
                enrollments::completed.eq(true),
                enrollments::quiz_score.eq(Some(score)),
                enrollments::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| QuizError::Database(e.to_string()))?;

        let updated: Enrollment = enrollments::table
            .filter(enrollments::id.eq(enrollment.id))
            .first(&mut conn)
            .map_err(|e| QuizError::Database(e.to_string()))?;

        log::info!(
            "user {user_id} scored {score} on course {course_id} quiz ({} questions)",
            questions.len()
        );

        Ok(QuizResult {
            score,
            enrollment: updated,
        })
    }

    fn load_course(&self, course_id: Uuid) -> Result<Course, QuizError> {
        let mut conn = self
            .db
            .get()
            .map_err(|e| QuizError::Database(e.to_string()))?;

        courses::table
            .filter(courses::id.eq(course_id))
            .first::<Course>(&mut conn)
            .optional()
            .map_err(|e| QuizError::Database(e.to_string()))?
            .ok_or_else(|| QuizError::NotFound("Course not found".to_string()))
    }

    fn store_questions(
        &self,
        course_id: Uuid,
        questions: &[QuizQuestion],
    ) -> Result<(), QuizError> {
        let mut conn = self
            .db
            .get()
            .map_err(|e| QuizError::Database(e.to_string()))?;

        let data = serde_json::to_value(questions)
            .map_err(|e| QuizError::Internal(e.to_string()))?;

        diesel::update(courses::table.filter(courses::id.eq(course_id)))
            .set((
                courses::quiz_data.eq(Some(data)),
                courses::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| QuizError::Database(e.to_string()))?;

        Ok(())
    }
}

/// The question set embedded on the course row, if a non-empty one is stored.
fn stored_questions(course: &Course) -> Option<Vec<QuizQuestion>> {
    let data = course.quiz_data.as_ref()?;
    let questions: Vec<QuizQuestion> = serde_json::from_value(data.clone()).ok()?;
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}
