use crate::assembler::{compose, PageSelection};
use crate::error::PdfError;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::info;

/// Saves the first page of `source` as a standalone one-page PDF at `destination`.
pub fn extract_cover(source: &Path, destination: &Path) -> Result<PathBuf, PdfError> {
    let doc = Document::load(source).map_err(|e| PdfError::open(source, e))?;
    if doc.get_pages().is_empty() {
        return Err(PdfError::cover(source, "the PDF has no pages"));
    }

    let mut cover =
        compose(vec![(doc, PageSelection::First)]).map_err(|reason| PdfError::cover(source, reason))?;
    cover.compress();
    cover
        .save(destination)
        .map_err(|e| PdfError::cover(source, e))?;

    info!("Saved cover page to '{}'.", destination.display());
    Ok(destination.to_path_buf())
}
