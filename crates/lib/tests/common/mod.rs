#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the `bookmeta` integration tests.

use dotenvy::dotenv;
use serde_json::{json, Value};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();
    });
}

/// Builds an OpenAI-compatible chat completion body with a single choice.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}
