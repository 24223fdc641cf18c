//! # Metadata Inference
//!
//! Sends sampled document text to a completion provider and parses the JSON
//! object it answers with. Normalization of the result lives in
//! [`crate::metadata::normalize`].

use crate::{
    errors::InferenceError,
    metadata::RawMetadata,
    prompts::pdf::{METADATA_EXTRACTION_SYSTEM_PROMPT, METADATA_EXTRACTION_USER_PROMPT},
    providers::ai::AiProvider,
};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

/// The prompts for the metadata extraction task.
///
/// `user_prompt_template` must contain a `{text}` placeholder.
#[derive(Debug, Clone, Copy)]
pub struct MetadataPrompts<'a> {
    pub system_prompt: &'a str,
    pub user_prompt_template: &'a str,
}

impl Default for MetadataPrompts<'static> {
    fn default() -> Self {
        Self {
            system_prompt: METADATA_EXTRACTION_SYSTEM_PROMPT,
            user_prompt_template: METADATA_EXTRACTION_USER_PROMPT,
        }
    }
}

/// Asks the provider for the bibliographic metadata of `text`.
#[instrument(skip(ai_provider, text, prompts), fields(text_len = text.len()))]
pub async fn infer_metadata(
    ai_provider: &dyn AiProvider,
    text: &str,
    prompts: MetadataPrompts<'_>,
) -> Result<RawMetadata, InferenceError> {
    let user_prompt = prompts.user_prompt_template.replace("{text}", text);

    debug!(system_prompt = %prompts.system_prompt, "--> Sending metadata prompt to AI Provider");
    let response = ai_provider
        .generate(prompts.system_prompt, &user_prompt)
        .await?;
    debug!("<-- Metadata response from AI: {}", response);

    let metadata = parse_metadata_response(&response)?;
    info!("Parsed {} metadata fields from AI response.", metadata.len());
    Ok(metadata)
}

fn code_fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"```(?i:json)?\s*([\s\S]*?)```").expect("code fence pattern is a valid regex")
    })
}

/// Extracts the JSON object from a completion.
///
/// A surrounding markdown code fence (optionally labelled `json`) is stripped
/// first. If the remaining text still has prose around the object, the
/// outermost `{ ... }` span is parsed.
pub fn parse_metadata_response(response: &str) -> Result<RawMetadata, InferenceError> {
    let body = code_fence_pattern()
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| response.trim());

    let body = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => body,
    };

    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(InferenceError::NotAnObject(other.to_string())),
    }
}
