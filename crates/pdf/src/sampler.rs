//! Boundary-page text sampling.
//!
//! Bibliographic details live on the title page, the copyright page and the
//! back matter, so only the first and last `n` pages are read.

use crate::error::PdfError;
use pdf::file::FileOptions;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Text drawn on the sampled pages, with the pages it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledText {
    /// Page texts joined with `\n`, in ascending page order.
    pub text: String,
    /// Zero-based indices of the pages that were read.
    pub pages: Vec<u32>,
    pub total_pages: u32,
}

/// Zero-based indices of the first `n_pages` and last `n_pages` pages, deduplicated and ascending.
pub fn boundary_pages(total_pages: u32, n_pages: u32) -> Vec<u32> {
    let head = 0..n_pages.min(total_pages);
    let tail = total_pages.saturating_sub(n_pages)..total_pages;
    head.chain(tail)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Reads the boundary pages of the PDF at `path`.
///
/// A page whose content cannot be decoded contributes an empty string. Only a
/// file that cannot be read or parsed at all is an error.
pub fn sample_text(path: &Path, n_pages: u32) -> Result<SampledText, PdfError> {
    if n_pages == 0 {
        return Err(PdfError::InvalidInput(
            "n_pages must be at least 1".to_string(),
        ));
    }
    let data = std::fs::read(path).map_err(|e| PdfError::open(path, e))?;
    sample_bytes(&data, n_pages).map_err(|reason| PdfError::open(path, reason))
}

fn sample_bytes(data: &[u8], n_pages: u32) -> Result<SampledText, String> {
    let file = match FileOptions::cached().load(data) {
        Ok(file) => file,
        Err(e) => {
            // The `pdf` parser rejects files over malformed metadata such as a bad /CreationDate.
            warn!("PDF parser failed ({}), falling back to lopdf text extraction.", e);
            return sample_with_lopdf(data, n_pages)
                .map_err(|fallback| format!("{e}; lopdf: {fallback}"));
        }
    };
    let resolver = file.resolver();
    let total_pages = file.num_pages();
    let pages = boundary_pages(total_pages, n_pages);
    debug!("Sampling pages {:?} of {}.", pages, total_pages);

    let mut chunks = Vec::with_capacity(pages.len());
    for &page_num in &pages {
        let page = match file.get_page(page_num) {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not load page {}: {}", page_num, e);
                chunks.push(String::new());
                continue;
            }
        };
        let Some(content) = &page.contents else {
            chunks.push(String::new());
            continue;
        };
        match content.operations(&resolver) {
            Ok(operations) => chunks.push(collect_text(&operations)),
            Err(e) => {
                warn!("Could not decode content of page {}: {}", page_num, e);
                chunks.push(String::new());
            }
        }
    }

    Ok(SampledText {
        text: chunks.join("\n"),
        pages,
        total_pages,
    })
}

fn sample_with_lopdf(data: &[u8], n_pages: u32) -> Result<SampledText, String> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| e.to_string())?;
    let total_pages = doc.get_pages().len() as u32;
    let pages = boundary_pages(total_pages, n_pages);
    debug!("Sampling pages {:?} of {} with lopdf.", pages, total_pages);

    let chunks: Vec<String> = pages
        .iter()
        .map(|&page_num| match doc.extract_text(&[page_num + 1]) {
            Ok(text) => text.trim_end_matches('\n').to_string(),
            Err(e) => {
                warn!("Could not extract text of page {}: {}", page_num, e);
                String::new()
            }
        })
        .collect();

    Ok(SampledText {
        text: chunks.join("\n"),
        pages,
        total_pages,
    })
}

fn collect_text(operations: &[pdf::content::Op]) -> String {
    let mut text = String::new();
    for op in operations {
        match op {
            pdf::content::Op::TextDraw { text: drawn } => {
                text.push_str(&drawn.to_string_lossy());
            }
            pdf::content::Op::TextDrawAdjusted { array } => {
                for item in array {
                    if let pdf::content::TextDrawAdjusted::Text(drawn) = item {
                        text.push_str(&drawn.to_string_lossy());
                    }
                }
            }
            pdf::content::Op::TextNewline => text.push('\n'),
            _ => {}
        }
    }
    text
}
