//! # Application Configuration
//!
//! This module defines the configuration structure for the `bookmeta-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables.

use bookmeta::prompts::pdf::{METADATA_EXTRACTION_SYSTEM_PROMPT, METADATA_EXTRACTION_USER_PROMPT};
use bookmeta::ProviderConfig;
use bookmeta_pdf::{FailurePolicy, DEFAULT_N_PAGES};
use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;

/// The task name used by the upload-and-process route.
pub const METADATA_EXTRACTION_TASK: &str = "metadata_extraction";

/// The provider name default tasks point at.
pub const DEFAULT_PROVIDER_NAME: &str = "default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where uploads are stored and processed.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Where finished artifacts are moved for listing, checking and download.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    /// The log file written by the server and served by `/logs`.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Boundary pages sampled when the request does not say.
    #[serde(default = "default_n_pages")]
    pub default_n_pages: u32,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// When set, `/pdf/*` and `/logs` require `Authorization: Bearer <api_token>`.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Applied to providers that do not set their own `timeout_secs`.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,
}

fn default_port() -> u16 {
    9090
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploaded_files")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("./processed_files")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("server.log")
}

fn default_n_pages() -> u32 {
    DEFAULT_N_PAGES
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Constructs a `config::Value` map of the default tasks from the library.
/// This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    let tasks = [(
        METADATA_EXTRACTION_TASK,
        (
            DEFAULT_PROVIDER_NAME,
            METADATA_EXTRACTION_SYSTEM_PROMPT,
            METADATA_EXTRACTION_USER_PROMPT,
        ),
    )];

    tasks
        .into_iter()
        .map(|(name, (provider, sys, user))| {
            let mut table = HashMap::new();
            table.insert("provider".to_string(), ConfigValue::from(provider));
            table.insert("system_prompt".to_string(), ConfigValue::from(sys));
            table.insert("user_prompt".to_string(), ConfigValue::from(user));
            (
                name.to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("env var pattern is a valid regex")
    })
}

/// Replaces `${VAR}` with the value of the environment variable, or nothing when unset.
pub fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            env::var(&caps["var"]).unwrap_or_default()
        })
        .into_owned()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    Ok(Some(substitute_env_vars(&content)))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Top-level keys like `port` and `upload_dir` are overridden by `PORT` and `UPLOAD_DIR`.
/// - Nested keys are overridden by `BOOKMETA_...` variables
///   (e.g., `BOOKMETA_PROVIDERS__DEFAULT__MODEL_NAME`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "local".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('local' or 'gemini').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    // Layer 3: User Prompt Overrides (Optional)
    let user_prompt_path = format!("{base_path}/prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!("Loading user prompt overrides from '{user_prompt_path}'.");
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 5: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("BOOKMETA")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    // Deserialize the fully resolved configuration into our `AppConfig` struct.
    let mut config: AppConfig = settings.try_deserialize()?;

    if let Some(timeout) = config.request_timeout_secs {
        for provider in config.providers.values_mut() {
            provider.timeout_secs.get_or_insert(timeout);
        }
    }

    Ok(config)
}
