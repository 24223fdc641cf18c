//! # bookmeta-server
//!
//! HTTP front end for the PDF metadata pipeline: upload a PDF, get back a
//! copy tagged with inferred bibliographic metadata and renamed after its
//! title.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod state;
pub mod types;

use crate::{
    config::{get_config, AppConfig},
    logging::init_tracing,
    router::create_router,
    state::build_app_state,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Configures and runs the web server.
///
/// This function initializes the application state, creates the router,
/// and starts the Axum server.
pub async fn run(listener: TcpListener, config: AppConfig) -> anyhow::Result<()> {
    debug!(?config, "Server configuration loaded");

    let app_state = build_app_state(config).await?;
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// The library's main entry point.
///
/// Loads configuration, sets up logging and the TCP listener, then calls `run`.
/// `BOOKMETA_CONFIG` may point at a config file outside the crate directory.
pub async fn start() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("BOOKMETA_CONFIG").ok();
    let config = get_config(config_path.as_deref())?;
    init_tracing(&config.log_file)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    run(listener, config).await
}
