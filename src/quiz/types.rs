use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::enrollments::Enrollment;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Size of a generated question set.
pub const QUESTIONS_PER_QUIZ: usize = 5;

/// A stored quiz question, answer key included. This type never crosses the
/// trust boundary on the read path; see [`ClientQuestion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: i32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i32,
}

impl QuizQuestion {
    pub fn validate(&self) -> Result<(), String> {
        if self.id < 1 {
            return Err(format!("question id {} is not a positive integer", self.id));
        }
        if self.question.trim().is_empty() {
            return Err(format!("question {} has empty text", self.id));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(format!(
                "question {} has {} options, expected {}",
                self.id,
                self.options.len(),
                OPTION_COUNT
            ));
        }
        if self.correct_answer < 0 || self.correct_answer as usize >= OPTION_COUNT {
            return Err(format!(
                "question {} has correct answer index {} out of range",
                self.id, self.correct_answer
            ));
        }
        Ok(())
    }
}

/// The public-facing question shape. The correct-answer field does not exist
/// here, so redaction holds for every serialization of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientQuestion {
    pub id: i32,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&QuizQuestion> for ClientQuestion {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// Submitted answer map: question id (stringified, as JSON object keys are)
/// to selected option index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub answers: HashMap<String, i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub score: i32,
    pub enrollment: Enrollment,
}

/// All-or-nothing batch validation: the first invalid element rejects the
/// whole set.
pub fn validate_batch(questions: &[QuizQuestion]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("question list is empty".to_string());
    }
    for question in questions {
        question.validate()?;
    }
    Ok(())
}

/// Percentage score over the stored question set, rounded half-up. Questions
/// without a submitted answer count as incorrect.
pub fn score_submission(questions: &[QuizQuestion], answers: &HashMap<String, i32>) -> i32 {
    if questions.is_empty() {
        return 0;
    }
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id.to_string()) == Some(&q.correct_answer))
        .count();
    ((correct as f64 / questions.len() as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i32, correct: i32) -> QuizQuestion {
        QuizQuestion {
            id,
            question: format!("Question {id}?"),
            options: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            correct_answer: correct,
        }
    }

    fn answers(pairs: &[(i32, i32)]) -> HashMap<String, i32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_score_three_of_five() {
        let questions: Vec<_> = (1..=5).map(|i| question(i, 0)).collect();
        let submitted = answers(&[(1, 0), (2, 0), (3, 0), (4, 1), (5, 2)]);
        assert_eq!(score_submission(&questions, &submitted), 60);
    }

    #[test]
    fn test_score_rounds_half_up() {
        let questions: Vec<_> = (1..=3).map(|i| question(i, 0)).collect();
        // 1/3 -> 33.33 -> 33
        assert_eq!(score_submission(&questions, &answers(&[(1, 0)])), 33);
        // 2/3 -> 66.67 -> 67
        assert_eq!(score_submission(&questions, &answers(&[(1, 0), (2, 0)])), 67);
    }

    #[test]
    fn test_score_missing_answers_count_incorrect() {
        let questions: Vec<_> = (1..=5).map(|i| question(i, 1)).collect();
        assert_eq!(score_submission(&questions, &answers(&[(1, 1)])), 20);
        assert_eq!(score_submission(&questions, &HashMap::new()), 0);
    }

    #[test]
    fn test_score_ignores_unknown_question_ids() {
        let questions: Vec<_> = (1..=2).map(|i| question(i, 0)).collect();
        let submitted = answers(&[(1, 0), (99, 0)]);
        assert_eq!(score_submission(&questions, &submitted), 50);
    }

    #[test]
    fn test_client_question_has_no_answer_key() {
        let q = question(1, 3);
        let json = serde_json::to_value(ClientQuestion::from(&q)).unwrap();
        assert!(json.get("correctAnswer").is_none());
        assert_eq!(json["id"], 1);
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_question_serde_uses_camel_case() {
        let q = question(2, 1);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswer"], 1);

        let parsed: QuizQuestion = serde_json::from_value(serde_json::json!({
            "id": 2,
            "question": "Question 2?",
            "options": ["A", "B", "C", "D"],
            "correctAnswer": 1
        }))
        .unwrap();
        assert_eq!(parsed, q);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let mut q = question(1, 0);
        q.options.pop();
        assert!(q.validate().is_err());

        let mut q = question(1, 4);
        assert!(q.validate().is_err());
        q.correct_answer = -1;
        assert!(q.validate().is_err());

        let q = question(0, 0);
        assert!(q.validate().is_err());

        let mut q = question(1, 0);
        q.question = "  ".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validate_batch_all_or_nothing() {
        let mut questions: Vec<_> = (1..=5).map(|i| question(i, 0)).collect();
        assert!(validate_batch(&questions).is_ok());

        questions[3].options.push("E".to_string());
        assert!(validate_batch(&questions).is_err());

        assert!(validate_batch(&[]).is_err());
    }
}
