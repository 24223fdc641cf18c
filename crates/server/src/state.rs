//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup: the configuration, the resolved tasks and the
//! instantiated AI provider clients.

use crate::config::AppConfig;
use bookmeta::providers::{ai::AiProvider, factory::create_provider};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// A map of fully resolved tasks, ready for use by handlers.
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    /// A map of instantiated AI providers, keyed by their name from the config.
    pub ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
}

impl AppState {
    /// Looks up a task together with the provider it runs on.
    pub fn task(&self, name: &str) -> anyhow::Result<(&ResolvedTask, &dyn AiProvider)> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Configuration for task '{name}' not found."))?;
        let provider = self.ai_providers.get(&task.provider).ok_or_else(|| {
            anyhow::anyhow!(
                "Provider '{}' for task '{name}' not found in providers map.",
                task.provider
            )
        })?;
        Ok((task, provider.as_ref()))
    }
}

/// Builds the shared application state from the configuration.
///
/// Instantiates an AI provider client for each entry in `providers`, checks
/// that every task is complete and creates the upload and processed
/// directories.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let mut ai_providers = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider = create_provider(provider_config)
            .map_err(|e| anyhow::anyhow!("Failed to create provider '{name}': {e}"))?;
        ai_providers.insert(name.clone(), provider);
    }

    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;
        if !ai_providers.contains_key(&provider) {
            return Err(anyhow::anyhow!(
                "Task '{name}' refers to unknown provider '{provider}'"
            ));
        }

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                system_prompt,
                user_prompt,
            },
        );
    }

    for dir in [&config.upload_dir, &config.processed_dir] {
        tokio::fs::create_dir_all(dir).await?;
    }
    info!(
        upload_dir = %config.upload_dir.display(),
        processed_dir = %config.processed_dir.display(),
        "Initialized storage directories."
    );

    Ok(AppState {
        config: Arc::new(config),
        tasks: Arc::new(resolved_tasks),
        ai_providers: Arc::new(ai_providers),
    })
}
