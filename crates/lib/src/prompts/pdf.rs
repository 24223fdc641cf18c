//! # PDF-Specific Prompts
//!
//! Prompt templates for inferring bibliographic metadata from text sampled
//! out of a PDF. The user prompt carries a `{text}` placeholder.

/// The system prompt for the metadata extraction task.
pub const METADATA_EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts metadata from text.";

/// The user prompt template for the metadata extraction task.
pub const METADATA_EXTRACTION_USER_PROMPT: &str = r#"Extract metadata from the following text and return it in JSON format with the fields: title, authors, language, publisher, edition, publication_date, and ISBN.
If a field cannot be extracted, return it as "Unknown".
{text}"#;
