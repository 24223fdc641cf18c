//! # bookmeta: Bibliographic Metadata Inference
//!
//! This crate provides the provider-facing half of the `bookmeta` workspace:
//! completion provider clients, the metadata prompts, the seven-field
//! `DocumentMetadata` record and its normalization rules. PDF handling lives
//! in `bookmeta-pdf`.

pub mod errors;
pub mod inference;
pub mod metadata;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::{InferenceError, PromptError};
pub use inference::{infer_metadata, parse_metadata_response, MetadataPrompts};
pub use metadata::{normalize, DocumentMetadata, RawMetadata, UNKNOWN};
pub use types::{GenerationOptions, ProviderConfig};
