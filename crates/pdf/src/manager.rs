//! The end-to-end pipeline: sample, infer, normalize, then write the artifacts.

use crate::assembler::assemble;
use crate::cover::extract_cover;
use crate::error::PdfError;
use crate::renamer::rename_by_title;
use crate::sampler::sample_text;
use bookmeta::{
    infer_metadata, normalize, providers::ai::AiProvider, DocumentMetadata, MetadataPrompts,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const PROCESSED_DIR_NAME: &str = "processed_pdfs";
pub const METADATA_DIR_NAME: &str = "metadata";
pub const DEFAULT_N_PAGES: u32 = 5;

/// What to do when a recoverable step fails.
#[derive(Debug, Deserialize, Serialize, Default, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Inference failures fall back to the all-"Unknown" record and cover
    /// failures skip the cover.
    #[default]
    BestEffort,
    /// Any failure aborts the run.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub n_pages: u32,
    pub save_metadata: bool,
    pub save_cover_page: bool,
    pub failure_policy: FailurePolicy,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            n_pages: DEFAULT_N_PAGES,
            save_metadata: false,
            save_cover_page: false,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Files produced by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub metadata_file: Option<PathBuf>,
    pub cover_file: Option<PathBuf>,
    pub pdf_file: PathBuf,
}

/// The outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedPdf {
    pub metadata: DocumentMetadata,
    pub artifacts: ArtifactSet,
}

/// Runs the metadata pipeline for PDFs on disk.
pub struct PdfManager<'a> {
    ai_provider: &'a dyn AiProvider,
    prompts: MetadataPrompts<'a>,
}

impl<'a> PdfManager<'a> {
    pub fn new(ai_provider: &'a dyn AiProvider, prompts: MetadataPrompts<'a>) -> Self {
        Self {
            ai_provider,
            prompts,
        }
    }

    /// Processes `file_path` and writes every artifact next to it:
    ///
    /// - `processed_pdfs/<title>.pdf` (or `<stem>_with_metadata.pdf` when the title is unknown)
    /// - `metadata/<stem>_cover_page.pdf` when `save_cover_page` is set
    /// - `metadata/<stem>_metadata.json` when `save_metadata` is set
    #[instrument(skip(self, options), fields(path = %file_path.display()))]
    pub async fn process(
        &self,
        file_path: &Path,
        options: &ProcessOptions,
    ) -> Result<ProcessedPdf, PdfError> {
        if options.n_pages == 0 {
            return Err(PdfError::InvalidInput(
                "n_pages must be at least 1".to_string(),
            ));
        }
        let stem = file_stem(file_path)?;
        let base_dir = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let policy = options.failure_policy;

        // --- 1. Sample ---
        let sampled = {
            let source = file_path.to_path_buf();
            let n_pages = options.n_pages;
            run_blocking(move || sample_text(&source, n_pages)).await?
        };
        info!(
            "Sampled {} of {} pages ({} chars).",
            sampled.pages.len(),
            sampled.total_pages,
            sampled.text.len()
        );

        // --- 2. Infer & normalize ---
        let raw = match infer_metadata(self.ai_provider, &sampled.text, self.prompts).await {
            Ok(raw) => raw,
            Err(e) if policy == FailurePolicy::BestEffort => {
                warn!("Metadata inference failed, continuing with unknown fields: {}", e);
                DocumentMetadata::unknown().to_raw()
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = normalize(&raw, &sampled.text, &stem);

        // --- 3. Output directories ---
        let processed_dir = base_dir.join(PROCESSED_DIR_NAME);
        let metadata_dir = base_dir.join(METADATA_DIR_NAME);
        for dir in [&processed_dir, &metadata_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| PdfError::io(dir, e))?;
        }

        // --- 4. Cover ---
        let cover_file = if options.save_cover_page {
            let source = file_path.to_path_buf();
            let destination = metadata_dir.join(format!("{stem}_cover_page.pdf"));
            match run_blocking(move || extract_cover(&source, &destination)).await {
                Ok(path) => Some(path),
                Err(e @ (PdfError::CoverExtraction { .. } | PdfError::Open { .. }))
                    if policy == FailurePolicy::BestEffort =>
                {
                    warn!("Cover extraction failed, continuing without a cover: {}", e);
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        // --- 5. Assemble ---
        let assembled = processed_dir.join(format!("{stem}_with_metadata.pdf"));
        {
            let source = file_path.to_path_buf();
            let output = assembled.clone();
            let cover = cover_file.clone();
            let metadata = metadata.clone();
            run_blocking(move || assemble(&source, &metadata, cover.as_deref(), &output)).await?;
        }

        // --- 6. Rename ---
        let pdf_file = rename_by_title(&assembled, &metadata.title)?;

        // --- 7. Side-car ---
        let metadata_file = if options.save_metadata {
            let path = metadata_dir.join(format!("{stem}_metadata.json"));
            write_metadata_file(&path, &metadata).await?;
            Some(path)
        } else {
            None
        };

        info!("Finished processing; output at '{}'.", pdf_file.display());
        Ok(ProcessedPdf {
            metadata,
            artifacts: ArtifactSet {
                metadata_file,
                cover_file,
                pdf_file,
            },
        })
    }
}

/// Writes the record as pretty-printed UTF-8 JSON.
pub async fn write_metadata_file(path: &Path, metadata: &DocumentMetadata) -> Result<(), PdfError> {
    let json = serde_json::to_string_pretty(metadata)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| PdfError::io(path, e))?;
    info!("Saved metadata to '{}'.", path.display());
    Ok(())
}

fn file_stem(path: &Path) -> Result<String, PdfError> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| PdfError::InvalidInput(format!("'{}' has no file name", path.display())))
}

async fn run_blocking<T, F>(task: F) -> Result<T, PdfError>
where
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}
