//! # `bookmeta` Library Crate
//!
//! The logic behind the `bookmeta` command-line tool: argument definitions,
//! provider construction and the two commands, `process` and `check`.

use anyhow::{Context, Result};
use bookmeta::{
    providers::{ai::AiProvider, factory::create_provider},
    types::DEFAULT_MAX_TOKENS,
    MetadataPrompts, ProviderConfig,
};
use bookmeta_pdf::{check, FailurePolicy, PdfManager, ProcessOptions, DEFAULT_N_PAGES};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer the metadata of a PDF, tag a renamed copy and print what was written
    Process(ProcessArgs),
    /// Print the Info dictionary of a PDF
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// The PDF to process. Outputs are written next to it.
    pub file: PathBuf,
    /// How many pages to sample from each end of the document.
    #[arg(long, default_value_t = DEFAULT_N_PAGES)]
    pub pages: u32,
    /// Also write `metadata/<stem>_metadata.json`.
    #[arg(long)]
    pub save_metadata: bool,
    /// Also write `metadata/<stem>_cover_page.pdf`.
    #[arg(long)]
    pub save_cover: bool,
    /// Abort when the provider fails instead of continuing with unknown fields.
    #[arg(long)]
    pub fail_fast: bool,
    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// The PDF to inspect.
    pub file: PathBuf,
}

/// Completion provider settings, taken from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// "local" for any OpenAI-compatible endpoint, or "gemini".
    #[arg(long, env = "AI_PROVIDER", default_value = "local")]
    pub provider: String,
    #[arg(long, env = "AI_API_URL")]
    pub api_url: Option<String>,
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "AI_MODEL")]
    pub model: String,
    #[arg(long, env = "AI_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    /// Request timeout in seconds. No timeout when unset.
    #[arg(long, env = "AI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl ProviderArgs {
    pub fn to_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            timeout_secs: self.timeout_secs,
        }
    }
}

impl ProcessArgs {
    pub fn options(&self) -> ProcessOptions {
        ProcessOptions {
            n_pages: self.pages,
            save_metadata: self.save_metadata,
            save_cover_page: self.save_cover,
            failure_policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::BestEffort
            },
        }
    }
}

// --- Public Entrypoint ---

/// The main entry point for the `bookmeta` library.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process(args) => handle_process(args).await,
        Commands::Check(args) => handle_check(args).await,
    }
}

// --- Command Handlers ---

async fn handle_process(args: ProcessArgs) -> Result<()> {
    info!("Starting 'process' command with args: {:?}", args.file);
    let ai_provider = create_provider(&args.provider.to_config())
        .context("Failed to configure the AI provider")?;
    let output = process_file(ai_provider.as_ref(), &args.file, &args.options()).await?;
    println!("{output}");
    Ok(())
}

async fn handle_check(args: CheckArgs) -> Result<()> {
    let output = check_file(args.file).await?;
    println!("{output}");
    Ok(())
}

/// Runs the pipeline on `file` and renders the outcome as pretty JSON.
pub async fn process_file(
    ai_provider: &dyn AiProvider,
    file: &Path,
    options: &ProcessOptions,
) -> Result<String> {
    let processed = PdfManager::new(ai_provider, MetadataPrompts::default())
        .process(file, options)
        .await
        .with_context(|| format!("Failed to process '{}'", file.display()))?;
    Ok(serde_json::to_string_pretty(&processed)?)
}

/// Returns the inspector dump of `file`.
pub async fn check_file(file: PathBuf) -> Result<String> {
    let display = file.display().to_string();
    tokio::task::spawn_blocking(move || check(&file))
        .await?
        .with_context(|| format!("Failed to check '{display}'"))
}
