use super::{AppError, AppState};
use crate::auth::middleware::ApiAccess;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use tracing::info;

/// Serves the server log file as plain text.
pub async fn logs_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
) -> Result<impl IntoResponse, AppError> {
    let log_file = &app_state.config.log_file;
    let content = match tokio::fs::read_to_string(log_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Log file not found.".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    info!("Serving log file '{}'.", log_file.display());
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    ))
}
