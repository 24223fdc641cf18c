//! # Pipeline Tests
//!
//! Drives `PdfManager::process` end to end against generated PDFs and a
//! mocked completion provider.

use bookmeta::{MetadataPrompts, UNKNOWN};
use bookmeta_pdf::{
    check, sample_text, FailurePolicy, PdfError, PdfManager, ProcessOptions, METADATA_DIR_NAME,
    PROCESSED_DIR_NAME,
};
use bookmeta_test_utils::{
    helpers::{generate_test_pdf, page_count, write_numbered_pdf},
    MockAiProvider,
};
use serde_json::Value;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();
    });
}

const SYSTEM_PROMPT_KEY: &str = "extracts metadata from text";

#[tokio::test]
async fn test_failing_provider_falls_back_to_file_name() -> anyhow::Result<()> {
    // --- 1. Arrange ---
    setup_tracing();
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "scan_001.pdf", 10)?;
    let provider = MockAiProvider::failing("provider unavailable");
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions {
        n_pages: 3,
        save_metadata: true,
        save_cover_page: true,
        failure_policy: FailurePolicy::BestEffort,
    };

    // --- 2. Act ---
    let processed = manager.process(&source, &options).await?;

    // --- 3. Assert ---
    let calls = provider.get_calls();
    assert_eq!(calls.len(), 1);
    let user_prompt = &calls[0].1;
    for sampled in ["Page 1\n", "Page 2\n", "Page 3\n", "Page 8\n", "Page 9\n", "Page 10"] {
        assert!(user_prompt.contains(sampled), "missing {sampled:?}");
    }
    for skipped in ["Page 4", "Page 5", "Page 6", "Page 7"] {
        assert!(!user_prompt.contains(skipped), "unexpected {skipped:?}");
    }

    let metadata = &processed.metadata;
    assert_eq!(metadata.title, "scan_001");
    for field in [
        &metadata.authors,
        &metadata.language,
        &metadata.publisher,
        &metadata.edition,
        &metadata.publication_date,
        &metadata.isbn,
    ] {
        assert_eq!(field, UNKNOWN);
    }

    let artifacts = &processed.artifacts;
    assert_eq!(
        artifacts.pdf_file,
        dir.path().join(PROCESSED_DIR_NAME).join("Scan_001.pdf")
    );
    assert_eq!(page_count(&artifacts.pdf_file)?, 11, "cover page is prepended");
    assert!(!dir
        .path()
        .join(PROCESSED_DIR_NAME)
        .join("scan_001_with_metadata.pdf")
        .exists());

    let cover = artifacts.cover_file.as_ref().expect("cover was requested");
    assert_eq!(
        cover,
        &dir.path().join(METADATA_DIR_NAME).join("scan_001_cover_page.pdf")
    );
    assert_eq!(page_count(cover)?, 1);
    assert_eq!(page_count(&source)?, 10, "source is untouched");
    Ok(())
}

#[tokio::test]
async fn test_successful_run_embeds_and_saves_metadata() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "upload.pdf", 4)?;
    let provider = MockAiProvider::new();
    provider.add_response(
        SYSTEM_PROMPT_KEY,
        "```json\n{\"title\": \"the pragmatic programmer\", \"authors\": [\"Andrew Hunt\", \"David Thomas\"], \"language\": \"English\", \"publisher\": \"Addison-Wesley\", \"edition\": \"\", \"publication_date\": 1999, \"ISBN\": \"0-201-61622-X\"}\n```",
    );
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions {
        save_metadata: true,
        ..ProcessOptions::default()
    };

    let processed = manager.process(&source, &options).await?;

    let artifacts = &processed.artifacts;
    assert_eq!(
        artifacts.pdf_file,
        dir.path()
            .join(PROCESSED_DIR_NAME)
            .join("The Pragmatic Programmer.pdf")
    );
    assert_eq!(artifacts.cover_file, None);
    assert_eq!(page_count(&artifacts.pdf_file)?, 4, "no cover, same page count");

    let dump = check(&artifacts.pdf_file)?;
    assert!(dump.contains("/Title: the pragmatic programmer"), "{dump}");
    assert!(dump.contains("/Author: Andrew Hunt, David Thomas"), "{dump}");
    assert!(dump.contains("/Subject: Addison-Wesley"), "{dump}");
    assert!(dump.contains("/Keywords: 0-201-61622-X"), "{dump}");
    assert!(dump.contains("/CreationDate: D:1999"), "{dump}");
    assert!(dump.contains("/Producer: PDF Metadata Manager"), "{dump}");

    let side_car = artifacts.metadata_file.as_ref().expect("metadata was requested");
    assert_eq!(
        side_car,
        &dir.path().join(METADATA_DIR_NAME).join("upload_metadata.json")
    );
    let json: Value = serde_json::from_str(&std::fs::read_to_string(side_car)?)?;
    let object = json.as_object().expect("side-car is an object");
    assert_eq!(object.len(), 7);
    assert_eq!(object["ISBN"], "0-201-61622-X");
    assert_eq!(object["edition"], UNKNOWN);
    assert_eq!(object["publication_date"], "1999");
    Ok(())
}

#[tokio::test]
async fn test_fail_fast_aborts_on_inference_failure() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "book.pdf", 2)?;
    let provider = MockAiProvider::failing("boom");
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions {
        failure_policy: FailurePolicy::FailFast,
        ..ProcessOptions::default()
    };

    let result = manager.process(&source, &options).await;

    assert!(matches!(result, Err(PdfError::Inference(_))));
    assert!(!dir.path().join(PROCESSED_DIR_NAME).exists());
    Ok(())
}

#[tokio::test]
async fn test_unreadable_pdf_is_fatal_even_best_effort() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = dir.path().join("broken.pdf");
    std::fs::write(&source, b"not a pdf at all")?;
    let provider = MockAiProvider::new();
    let manager = PdfManager::new(&provider, MetadataPrompts::default());

    let result = manager.process(&source, &ProcessOptions::default()).await;

    assert!(matches!(result, Err(PdfError::Open { .. })));
    assert!(provider.get_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_zero_pages_is_invalid_input() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "book.pdf", 2)?;
    let provider = MockAiProvider::new();
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions {
        n_pages: 0,
        ..ProcessOptions::default()
    };

    let result = manager.process(&source, &options).await;
    assert!(matches!(result, Err(PdfError::InvalidInput(_))));
    Ok(())
}

#[tokio::test]
async fn test_processed_output_can_be_processed_again() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "scan.pdf", 4)?;
    let provider = MockAiProvider::failing("provider unavailable");
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions::default();

    let first = manager.process(&source, &options).await?;
    let output = first.artifacts.pdf_file;
    assert_eq!(output, dir.path().join(PROCESSED_DIR_NAME).join("Scan.pdf"));

    let sampled = sample_text(&output, 1)?;
    assert_eq!(sampled.text, "Page 1\nPage 4");

    let second = manager.process(&output, &options).await?;
    assert_eq!(second.metadata.title, "Scan");
    assert_eq!(page_count(&second.artifacts.pdf_file)?, 4);
    assert!(check(&second.artifacts.pdf_file)?.contains("/Title: Scan"));
    Ok(())
}

#[tokio::test]
async fn test_pdf_without_pages_is_processed_without_cover() -> anyhow::Result<()> {
    setup_tracing();
    let dir = tempdir()?;
    let source = dir.path().join("empty.pdf");
    std::fs::write(&source, generate_test_pdf(&[])?)?;
    let provider = MockAiProvider::failing("provider unavailable");
    let manager = PdfManager::new(&provider, MetadataPrompts::default());
    let options = ProcessOptions {
        save_cover_page: true,
        ..ProcessOptions::default()
    };

    let processed = manager.process(&source, &options).await?;

    assert_eq!(processed.metadata.title, "empty");
    assert_eq!(processed.artifacts.cover_file, None);
    assert_eq!(
        processed.artifacts.pdf_file,
        dir.path().join(PROCESSED_DIR_NAME).join("Empty.pdf")
    );
    assert_eq!(page_count(&processed.artifacts.pdf_file)?, 0);
    Ok(())
}
