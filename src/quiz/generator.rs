use serde_json::Value;
use std::sync::Arc;

use super::error::QuizError;
use super::types::{validate_batch, QuizQuestion, QUESTIONS_PER_QUIZ};
use crate::llm::LlmProvider;

/// Generates a fixed-size multiple-choice question set for a course from its
/// title and description. The LLM client is an explicit constructor
/// dependency so tests can plug in a double.
pub struct QuizGenerator {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl QuizGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { llm, model }
    }

    pub async fn generate(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Vec<QuizQuestion>, QuizError> {
        let prompt = build_prompt(title, description);
        let config = serde_json::json!({
            "model": self.model,
            "temperature": 0.7,
            "max_tokens": 2000,
            "response_format": { "type": "json_object" }
        });

        let content = self
            .llm
            .generate(&prompt, &config)
            .await
            .map_err(|e| QuizError::Upstream(e.to_string()))?;

        if content.trim().is_empty() {
            return Err(QuizError::Upstream(
                "no content received from generation service".to_string(),
            ));
        }

        let questions = parse_questions(&content).map_err(QuizError::Upstream)?;
        log::info!("generated {} quiz questions for course '{title}'", questions.len());
        Ok(questions)
    }
}

fn build_prompt(title: &str, description: &str) -> String {
    format!(
        r#"You are a quiz generator. Generate {QUESTIONS_PER_QUIZ} multiple-choice questions based on the course topic.
Return ONLY a JSON array of questions with this exact structure, no additional text or formatting:
[
  {{
    "id": 1,
    "question": "Question text here?",
    "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
    "correctAnswer": 0
  }}
]

Create a quiz for the course titled: "{title}" with description: "{description}""#
    )
}

/// Parses the generation reply. Accepts either a bare JSON array or an object
/// wrapping the array in a `questions` field; the whole payload is rejected
/// on the first shape violation.
fn parse_questions(content: &str) -> Result<Vec<QuizQuestion>, String> {
    let parsed: Value =
        serde_json::from_str(content).map_err(|e| format!("response is not valid JSON: {e}"))?;

    let list = match parsed {
        Value::Object(ref obj) if obj.contains_key("questions") => obj["questions"].clone(),
        other => other,
    };

    let questions: Vec<QuizQuestion> = serde_json::from_value(list)
        .map_err(|e| format!("invalid question format: {e}"))?;

    validate_batch(&questions)?;

    if questions.len() != QUESTIONS_PER_QUIZ {
        return Err(format!(
            "expected {QUESTIONS_PER_QUIZ} questions, got {}",
            questions.len()
        ));
    }

    Ok(questions)
}
