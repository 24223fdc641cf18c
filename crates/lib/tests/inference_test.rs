//! # Metadata Inference Tests
//!
//! Runs `infer_metadata` against a mocked OpenAI-compatible endpoint and
//! checks both the request that goes out and the record that comes back.

mod common;

use bookmeta::{
    infer_metadata, normalize, providers::ai::local::LocalAiProvider, InferenceError,
    MetadataPrompts, PromptError, UNKNOWN,
};
use common::{chat_completion, setup_tracing};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> LocalAiProvider {
    LocalAiProvider::new(
        format!("{}/v1/chat/completions", server.uri()),
        Some("test-key".to_string()),
        Some("gpt-3.5-turbo".to_string()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_infer_metadata_from_fenced_response() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    let fenced = "```json\n{\n  \"title\": \"the pragmatic programmer\",\n  \"authors\": [\"Andrew Hunt\", \"David Thomas\"],\n  \"language\": \"Unknown\",\n  \"publisher\": \"Addison-Wesley\",\n  \"edition\": \"1st\",\n  \"publication_date\": \"1999\",\n  \"ISBN\": \"Unknown\"\n}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "temperature": 0.0,
            "max_tokens": 300,
            "stream": false
        })))
        .and(body_string_contains("extracts metadata from text"))
        .and(body_string_contains("From Journeyman to Master"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(fenced)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let text = "The Pragmatic Programmer\nFrom Journeyman to Master";

    // --- 2. Act ---
    let raw = infer_metadata(&provider, text, MetadataPrompts::default())
        .await
        .expect("inference should succeed");
    let metadata = normalize(&raw, text, "upload_123");

    // --- 3. Assert ---
    assert_eq!(metadata.title, "the pragmatic programmer");
    assert_eq!(metadata.authors, "Andrew Hunt, David Thomas");
    assert_eq!(metadata.language, "English", "guessed from the word 'The'");
    assert_eq!(metadata.publisher, "Addison-Wesley");
    assert_eq!(metadata.isbn, UNKNOWN);
}

#[tokio::test]
async fn test_infer_metadata_accepts_structured_content() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": { "title": "Dune" } } }]
        })))
        .mount(&server)
        .await;

    let raw = infer_metadata(&provider_for(&server), "Dune", MetadataPrompts::default())
        .await
        .expect("structured content should be accepted");
    assert_eq!(raw["title"], "Dune");
}

#[tokio::test]
async fn test_infer_metadata_fails_without_choices() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let result = infer_metadata(&provider_for(&server), "text", MetadataPrompts::default()).await;
    assert!(matches!(
        result,
        Err(InferenceError::Provider(PromptError::EmptyResponse))
    ));
}

#[tokio::test]
async fn test_infer_metadata_surfaces_api_errors() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let result = infer_metadata(&provider_for(&server), "text", MetadataPrompts::default()).await;
    match result {
        Err(InferenceError::Provider(PromptError::AiApi(body))) => {
            assert!(body.contains("quota exceeded"))
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_infer_metadata_rejects_unparseable_content() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("Sorry, I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let result = infer_metadata(&provider_for(&server), "text", MetadataPrompts::default()).await;
    assert!(matches!(result, Err(InferenceError::Json(_))));
}

#[tokio::test]
async fn test_custom_prompts_are_used() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("You are a librarian."))
        .and(body_string_contains("Catalogue this: sample text"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_completion("{\"title\": \"Sample\"}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let prompts = MetadataPrompts {
        system_prompt: "You are a librarian.",
        user_prompt_template: "Catalogue this: {text}",
    };
    let raw = infer_metadata(&provider_for(&server), "sample text", prompts)
        .await
        .unwrap();
    assert_eq!(raw["title"], "Sample");
}
