use thiserror::Error;

/// Errors raised while talking to a completion provider.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider returned no choices")]
    EmptyResponse,
    #[error("Unexpected content format in AI provider response: {0}")]
    UnexpectedContent(String),
    #[error("AI provider is not configured: {0}")]
    MissingAiProvider(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Errors raised while turning sampled text into raw metadata.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Metadata query failed: {0}")]
    Provider(#[from] PromptError),
    #[error("Failed to decode JSON from AI provider response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("AI provider response is not a JSON object: {0}")]
    NotAnObject(String),
}
