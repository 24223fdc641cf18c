//! # bookmeta-pdf: PDF Metadata Pipeline
//!
//! Samples the boundary pages of a PDF, asks a completion provider for its
//! bibliographic metadata through `bookmeta`, and writes the results back out:
//! an Info-dictionary-tagged copy renamed after the title, an optional cover
//! page and an optional JSON side-car.

pub mod assembler;
pub mod cover;
pub mod error;
pub mod inspect;
pub mod manager;
pub mod renamer;
pub mod sampler;

pub use assembler::{assemble, PRODUCER};
pub use cover::extract_cover;
pub use error::PdfError;
pub use inspect::{check, read_info, NO_METADATA_MESSAGE};
pub use manager::{
    ArtifactSet, FailurePolicy, PdfManager, ProcessOptions, ProcessedPdf, DEFAULT_N_PAGES,
    METADATA_DIR_NAME, PROCESSED_DIR_NAME,
};
pub use renamer::{rename_by_title, unique_path};
pub use sampler::{boundary_pages, sample_text, SampledText};
