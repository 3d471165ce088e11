#[cfg(test)]
mod quiz_flow_integration_tests {
    use learnserver::llm::{LlmProvider, OpenAiClient};
    use learnserver::quiz::{score_submission, ClientQuestion, QuizGenerator, QuizQuestion};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn questions_json() -> serde_json::Value {
        json!([
            {"id": 1, "question": "What owns a value in Rust?", "options": ["A binding", "A pointer", "The heap", "The compiler"], "correctAnswer": 0},
            {"id": 2, "question": "What does Vec::push do?", "options": ["Removes", "Appends", "Sorts", "Clears"], "correctAnswer": 1},
            {"id": 3, "question": "Which trait enables printing with {}?", "options": ["Debug", "Clone", "Display", "Copy"], "correctAnswer": 2},
            {"id": 4, "question": "What does ? propagate?", "options": ["Panics", "Options only", "Errors", "Warnings"], "correctAnswer": 2},
            {"id": 5, "question": "Which keyword borrows?", "options": ["move", "ref", "&", "mut"], "correctAnswer": 2}
        ])
    }

    fn completion_body(content: &serde_json::Value) -> String {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generator_against_stubbed_completion_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(&questions_json()))
            .create_async()
            .await;

        let client: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
            "test-key".to_string(),
            Some(server.url()),
        ));
        let generator = QuizGenerator::new(client, "gpt-3.5-turbo".to_string());

        let questions = generator
            .generate("Rust Basics", "An introduction to ownership")
            .await
            .expect("generation should succeed");

        mock.assert_async().await;
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[2].correct_answer, 2);
    }

    #[tokio::test]
    async fn test_generator_accepts_wrapped_question_object() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(&json!({"questions": questions_json()})))
            .create_async()
            .await;

        let client: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
            "test-key".to_string(),
            Some(server.url()),
        ));
        let generator = QuizGenerator::new(client, "gpt-3.5-turbo".to_string());

        let questions = generator
            .generate("Rust Basics", "An introduction to ownership")
            .await
            .expect("wrapped object should be unwrapped");
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn test_generator_fails_on_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
            "test-key".to_string(),
            Some(server.url()),
        ));
        let generator = QuizGenerator::new(client, "gpt-3.5-turbo".to_string());

        let result = generator
            .generate("Rust Basics", "An introduction to ownership")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generator_fails_on_prose_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "Sure! Here are five questions..."}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
            "test-key".to_string(),
            Some(server.url()),
        ));
        let generator = QuizGenerator::new(client, "gpt-3.5-turbo".to_string());

        let result = generator
            .generate("Rust Basics", "An introduction to ownership")
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_four_of_five_scores_eighty() {
        let questions: Vec<QuizQuestion> =
            serde_json::from_value(questions_json()).expect("fixture parses");

        let answers: HashMap<String, i32> = [
            ("1".to_string(), 0),
            ("2".to_string(), 1),
            ("3".to_string(), 2),
            ("4".to_string(), 2),
            ("5".to_string(), 0), // wrong
        ]
        .into_iter()
        .collect();

        assert_eq!(score_submission(&questions, &answers), 80);
    }

    #[test]
    fn test_read_path_payload_never_contains_answers() {
        let questions: Vec<QuizQuestion> =
            serde_json::from_value(questions_json()).expect("fixture parses");
        let redacted: Vec<ClientQuestion> = questions.iter().map(ClientQuestion::from).collect();

        let payload = serde_json::to_value(serde_json::json!({ "questions": redacted })).unwrap();
        for item in payload["questions"].as_array().unwrap() {
            assert!(item.get("correctAnswer").is_none());
            assert!(item.get("correct_answer").is_none());
            assert!(item.get("id").is_some());
            assert!(item.get("question").is_some());
            assert_eq!(item["options"].as_array().unwrap().len(), 4);
        }
    }
}
