use bookmeta::InferenceError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the PDF processing pipeline.
///
/// `Open`, `Assembly`, `InvalidInput` and `Io` always abort a run. `Inference`
/// and `CoverExtraction` are recovered locally unless the run uses
/// [`FailurePolicy::FailFast`](crate::FailurePolicy::FailFast).
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to open PDF '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("Metadata inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Failed to extract cover page from '{}': {reason}", path.display())]
    CoverExtraction { path: PathBuf, reason: String },
    #[error("Failed to assemble PDF '{}': {reason}", path.display())]
    Assembly { path: PathBuf, reason: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize metadata: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("PDF worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PdfError {
    pub(crate) fn open(path: &Path, reason: impl ToString) -> Self {
        PdfError::Open {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn assembly(path: &Path, reason: impl ToString) -> Self {
        PdfError::Assembly {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn cover(path: &Path, reason: impl ToString) -> Self {
        PdfError::CoverExtraction {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        PdfError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
