//! # bookmeta: PDF Metadata from the Command Line
//!
//! A thin entrypoint; all logic lives in the `bookmeta_cli` library crate.

use anyhow::Result;
use bookmeta_cli::{run, Cli};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bookmeta_cli=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("[bookmeta error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
