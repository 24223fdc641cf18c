//! # PDF Route Handlers
//!
//! Upload-and-process plus the listing, inspection, download and deletion of
//! the files it produces.

use super::{AppError, AppState};
use crate::auth::middleware::ApiAccess;
use crate::config::METADATA_EXTRACTION_TASK;
use crate::types::{
    CheckResponse, FileNameParams, MessageResponse, ProcessParams, ProcessResponse,
    ProcessedFilesResponse, UploadedFilesResponse,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Multipart;
use bookmeta::MetadataPrompts;
use bookmeta_pdf::{check, unique_path, PdfError, PdfManager, ProcessOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// --- File name handling ---

fn is_pdf_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

/// Accepts a bare file name. Anything that could address another directory is rejected.
pub fn validate_file_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("File name must not be empty.".to_string()));
    }
    if name.contains(['/', '\\']) || name.contains("..") || name.chars().any(char::is_control) {
        return Err(AppError::BadRequest(format!("Invalid file name '{name}'.")));
    }
    Ok(name)
}

/// Reduces a client-supplied upload name to its final path component.
pub fn upload_file_name(raw: &str) -> Result<String, AppError> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let name = validate_file_name(last)?;
    if !is_pdf_name(name) {
        return Err(AppError::BadRequest(format!(
            "Only PDF files are accepted, got '{name}'."
        )));
    }
    Ok(name.to_string())
}

fn processed_file(app_state: &AppState, file_name: &str) -> Result<PathBuf, AppError> {
    let name = validate_file_name(file_name)?;
    let path = app_state.config.processed_dir.join(name);
    if !path.is_file() {
        return Err(AppError::NotFound(
            "File not found. Please process the file first.".to_string(),
        ));
    }
    Ok(path)
}

async fn list_pdf_files(dir: &Path) -> Result<Vec<String>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_pdf_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Moves `path` into `dir`, keeping its file name unless that is taken.
async fn move_into(path: &Path, dir: &Path) -> Result<PathBuf, AppError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("'{}' has no file name", path.display()))?;
    let target = unique_path(&dir.join(file_name));
    if tokio::fs::rename(path, &target).await.is_err() {
        // Rename fails across filesystems; fall back to copy and delete.
        tokio::fs::copy(path, &target).await?;
        tokio::fs::remove_file(path).await?;
    }
    Ok(target)
}

/// RFC 6266 `Content-Disposition` with an ASCII fallback and a UTF-8 `filename*`.
fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

// --- Handlers ---

/// Lists the PDFs in the upload directory.
pub async fn list_uploaded_pdfs_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
) -> Result<Json<UploadedFilesResponse>, AppError> {
    let uploaded_files = list_pdf_files(&app_state.config.upload_dir).await?;
    let uploaded_files_string = uploaded_files.join(", ");
    Ok(Json(UploadedFilesResponse {
        uploaded_files,
        uploaded_files_string,
    }))
}

/// Lists the PDFs in the processed directory.
pub async fn list_processed_pdfs_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
) -> Result<Json<ProcessedFilesResponse>, AppError> {
    let processed_files = list_pdf_files(&app_state.config.processed_dir).await?;
    Ok(Json(ProcessedFilesResponse { processed_files }))
}

/// Stores the uploaded `file` part, runs the metadata pipeline on it and moves
/// every artifact into the processed directory.
pub async fn upload_and_process_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
    Query(params): Query<ProcessParams>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError> {
    let config = &app_state.config;
    let mut upload: Option<(String, Vec<u8>)> = None;

    // --- 1. Read the upload ---
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let raw_name = field.file_name().unwrap_or("").to_string();
                let file_name = upload_file_name(&raw_name)?;
                let data = field.bytes().await?.to_vec();
                info!("Received upload '{}' ({} bytes).", file_name, data.len());
                upload = Some((file_name, data));
            }
            _ => warn!("Ignoring unknown multipart field: {}", name),
        }
    }
    let (file_name, data) = upload.ok_or_else(|| {
        AppError::BadRequest("PDF data not found in request. Provide a 'file' part.".to_string())
    })?;

    let upload_path = config.upload_dir.join(&file_name);
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::write(&upload_path, &data)
        .await
        .map_err(|e| PdfError::Io {
            path: upload_path.clone(),
            source: e,
        })?;
    info!("File uploaded: {}", upload_path.display());

    // --- 2. Run the pipeline ---
    let (task, ai_provider) = app_state.task(METADATA_EXTRACTION_TASK)?;
    let prompts = MetadataPrompts {
        system_prompt: &task.system_prompt,
        user_prompt_template: &task.user_prompt,
    };
    let options = ProcessOptions {
        n_pages: params.n_pages.unwrap_or(config.default_n_pages),
        save_metadata: params.save_metadata,
        save_cover_page: params.save_cover_page,
        failure_policy: config.failure_policy,
    };
    let processed = PdfManager::new(ai_provider, prompts)
        .process(&upload_path, &options)
        .await?;

    // --- 3. Publish the artifacts ---
    tokio::fs::create_dir_all(&config.processed_dir).await?;
    let artifacts = processed.artifacts;
    let renamed_pdf = move_into(&artifacts.pdf_file, &config.processed_dir).await?;
    let metadata_file = match &artifacts.metadata_file {
        Some(path) => Some(move_into(path, &config.processed_dir).await?),
        None => None,
    };
    let cover_file = match &artifacts.cover_file {
        Some(path) => Some(move_into(path, &config.processed_dir).await?),
        None => None,
    };

    Ok(Json(ProcessResponse {
        message: "PDF uploaded and processed successfully.".to_string(),
        metadata: processed.metadata,
        metadata_file: metadata_file.map(|p| p.display().to_string()),
        cover_file: cover_file.map(|p| p.display().to_string()),
        renamed_pdf: renamed_pdf.display().to_string(),
    }))
}

/// Returns the Info dictionary dump of a processed file.
pub async fn check_pdf_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
    Query(params): Query<FileNameParams>,
) -> Result<Json<CheckResponse>, AppError> {
    let path = processed_file(&app_state, &params.file_name)?;
    info!("Checking metadata for PDF: {}", path.display());
    let metadata = tokio::task::spawn_blocking(move || check(&path))
        .await
        .map_err(PdfError::from)??;
    Ok(Json(CheckResponse {
        message: "Metadata checked successfully.".to_string(),
        metadata,
    }))
}

/// Sends a processed file as an `application/pdf` attachment.
pub async fn download_pdf_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
    Query(params): Query<FileNameParams>,
) -> Result<impl IntoResponse, AppError> {
    let path = processed_file(&app_state, &params.file_name)?;
    info!("Serving PDF file for download: {}", path.display());
    let bytes = tokio::fs::read(&path).await?;
    let disposition = HeaderValue::from_str(&attachment_disposition(params.file_name.trim()))
        .map_err(anyhow::Error::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Removes a processed file.
pub async fn delete_pdf_handler(
    State(app_state): State<AppState>,
    _access: ApiAccess,
    Query(params): Query<FileNameParams>,
) -> Result<Json<MessageResponse>, AppError> {
    let path = processed_file(&app_state, &params.file_name)?;
    tokio::fs::remove_file(&path).await?;
    info!("Deleted processed file: {}", path.display());
    Ok(Json(MessageResponse {
        message: format!("File '{}' deleted successfully.", params.file_name.trim()),
    }))
}
