use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::MultipartError;
use bookmeta::{InferenceError, PromptError};
use bookmeta_pdf::PdfError;
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors from the PDF pipeline or the inspector.
    Pdf(PdfError),
    /// A malformed or oversized multipart body.
    Multipart(MultipartError),
    BadRequest(String),
    NotFound(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        AppError::Pdf(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.into())
    }
}

fn prompt_status(err: &PromptError) -> StatusCode {
    match err {
        PromptError::MissingAiProvider(_)
        | PromptError::ReqwestClientBuild(_)
        | PromptError::Regex(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PromptError::AiRequest(_)
        | PromptError::AiDeserialization(_)
        | PromptError::AiApi(_)
        | PromptError::EmptyResponse
        | PromptError::UnexpectedContent(_) => StatusCode::BAD_GATEWAY,
    }
}

fn pdf_status(err: &PdfError) -> StatusCode {
    match err {
        PdfError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PdfError::Open { .. } | PdfError::CoverExtraction { .. } | PdfError::Assembly { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PdfError::Inference(InferenceError::Provider(e)) => prompt_status(e),
        PdfError::Inference(_) => StatusCode::BAD_GATEWAY,
        PdfError::Io { .. } | PdfError::Serialization(_) | PdfError::Join(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Pdf(err) => {
                let status = pdf_status(&err);
                if status.is_server_error() {
                    error!("PdfError: {:?}", err);
                } else {
                    warn!("PdfError: {}", err);
                }
                (status, err.to_string())
            }
            AppError::Multipart(err) => {
                warn!("Multipart error: {}", err);
                (err.status(), err.body_text())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
