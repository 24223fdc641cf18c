//! # AI Provider Factory
//!
//! Builds provider instances from a `ProviderConfig`. Both the server and the
//! CLI go through this function so a provider entry behaves identically
//! wherever it is configured.

use crate::{
    errors::PromptError,
    providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
    types::ProviderConfig,
};
use tracing::info;

/// Creates an AI provider instance from its configuration.
///
/// - `gemini` requires an API key; the URL is derived from the model name when absent.
/// - `local` targets any OpenAI-compatible chat completions endpoint and requires a URL.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, PromptError> {
    let options = config.generation_options();
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(
                        "api_key is required for the gemini provider.".to_string(),
                    )
                })?;
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                        config.model_name
                    )
                });
            info!("Configuring Gemini provider with URL: {}", api_url);
            Box::new(GeminiProvider::with_timeout(api_url, api_key, config.timeout())?.with_options(options))
        }
        "local" => {
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(
                        "api_url is required for the local provider. Set AI_API_URL in your .env file."
                            .to_string(),
                    )
                })?;
            info!("Configuring Local AI provider with URL: {}", api_url);
            Box::new(
                LocalAiProvider::with_timeout(
                    api_url,
                    config.api_key.clone().filter(|key| !key.is_empty()),
                    Some(config.model_name.clone()),
                    config.timeout(),
                )?
                .with_options(options),
            )
        }
        other => {
            return Err(PromptError::MissingAiProvider(format!(
                "Unsupported AI provider type '{other}'."
            )))
        }
    };

    Ok(provider)
}
