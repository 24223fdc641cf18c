use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/logs", get(handlers::logs_handler))
        .route("/pdf/pdf-list", get(handlers::list_uploaded_pdfs_handler))
        .route(
            "/pdf/processed-pdf-list",
            get(handlers::list_processed_pdfs_handler),
        )
        .route(
            "/pdf/pdf-upload-and-process",
            post(handlers::upload_and_process_handler)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/pdf/pdf-check", get(handlers::check_pdf_handler))
        .route("/pdf/pdf-download", get(handlers::download_pdf_handler))
        .route("/pdf/pdf-delete", delete(handlers::delete_pdf_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
