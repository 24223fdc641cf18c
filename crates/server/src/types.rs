use bookmeta::DocumentMetadata;
use serde::{Deserialize, Serialize};

/// Query parameters of `POST /pdf/pdf-upload-and-process`.
#[derive(Debug, Deserialize, Default)]
pub struct ProcessParams {
    pub n_pages: Option<u32>,
    #[serde(default)]
    pub save_metadata: bool,
    #[serde(default)]
    pub save_cover_page: bool,
}

/// Query parameters of the routes that address one processed file.
#[derive(Debug, Deserialize)]
pub struct FileNameParams {
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadedFilesResponse {
    pub uploaded_files: Vec<String>,
    pub uploaded_files_string: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedFilesResponse {
    pub processed_files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub message: String,
    pub metadata: DocumentMetadata,
    pub metadata_file: Option<String>,
    pub cover_file: Option<String>,
    pub renamed_pdf: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub message: String,
    /// The inspector dump, one `/Key: value` line per entry.
    pub metadata: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
