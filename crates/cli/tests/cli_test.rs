//! # `bookmeta` CLI Integration Tests

use anyhow::Result;
use assert_cmd::Command;
use bookmeta_cli::{process_file, Cli, Commands};
use bookmeta_pdf::FailurePolicy;
use bookmeta_test_utils::{
    helpers::{generate_test_pdf_with_info, write_numbered_pdf},
    MockAiProvider,
};
use clap::Parser;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

const DUNE_JSON: &str = r#"{"title": "dune", "authors": ["Frank Herbert"], "language": "English", "publisher": "Chilton Books", "edition": "Unknown", "publication_date": "1965", "ISBN": "Unknown"}"#;

#[test]
fn test_process_arguments_map_to_options() {
    let cli = Cli::try_parse_from([
        "bookmeta",
        "process",
        "book.pdf",
        "--pages",
        "3",
        "--save-cover",
        "--fail-fast",
        "--provider",
        "local",
        "--api-url",
        "http://localhost:1234/v1/chat/completions",
        "--model",
        "test-model",
    ])
    .unwrap();

    let Commands::Process(args) = cli.command else {
        panic!("expected the process command");
    };
    assert_eq!(args.file, Path::new("book.pdf"));

    let options = args.options();
    assert_eq!(options.n_pages, 3);
    assert!(!options.save_metadata);
    assert!(options.save_cover_page);
    assert_eq!(options.failure_policy, FailurePolicy::FailFast);

    let config = args.provider.to_config();
    assert_eq!(config.provider, "local");
    assert_eq!(config.model_name, "test-model");
    assert_eq!(
        config.api_url.as_deref(),
        Some("http://localhost:1234/v1/chat/completions")
    );
}

#[test]
fn test_check_arguments() {
    let cli = Cli::try_parse_from(["bookmeta", "check", "tagged.pdf"]).unwrap();
    assert!(matches!(cli.command, Commands::Check(args) if args.file == Path::new("tagged.pdf")));
    assert!(Cli::try_parse_from(["bookmeta", "check"]).is_err());
}

#[tokio::test]
async fn test_process_file_prints_metadata_and_artifacts() -> Result<()> {
    // Arrange
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "scan_001.pdf", 6)?;
    let provider = MockAiProvider::new();
    provider.add_response("extracts metadata", DUNE_JSON);
    let cli = Cli::try_parse_from([
        "bookmeta",
        "process",
        source.to_str().unwrap(),
        "--pages",
        "2",
        "--save-metadata",
        "--model",
        "unused",
    ])?;
    let Commands::Process(args) = cli.command else {
        panic!("expected the process command");
    };

    // Act
    let output = process_file(&provider, &args.file, &args.options()).await?;

    // Assert
    let json: Value = serde_json::from_str(&output)?;
    assert_eq!(json["metadata"]["title"], "dune");
    assert_eq!(json["metadata"]["authors"], "Frank Herbert");
    let pdf_file = json["artifacts"]["pdf_file"].as_str().unwrap();
    assert_eq!(
        Path::new(pdf_file),
        dir.path().join("processed_pdfs").join("Dune.pdf")
    );
    assert!(Path::new(pdf_file).exists());
    let metadata_file = json["artifacts"]["metadata_file"].as_str().unwrap();
    assert!(metadata_file.ends_with("scan_001_metadata.json"));
    assert!(json["artifacts"]["cover_file"].is_null());

    let calls = provider.get_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.contains("Page 1\nPage 2\nPage 5\nPage 6"));
    Ok(())
}

#[tokio::test]
async fn test_process_file_fail_fast_reports_provider_error() -> Result<()> {
    let dir = tempdir()?;
    let source = write_numbered_pdf(dir.path(), "scan.pdf", 2)?;
    let provider = MockAiProvider::failing("quota exceeded");
    let cli = Cli::try_parse_from([
        "bookmeta",
        "process",
        source.to_str().unwrap(),
        "--fail-fast",
        "--model",
        "unused",
    ])?;
    let Commands::Process(args) = cli.command else {
        panic!("expected the process command");
    };

    let error = process_file(&provider, &args.file, &args.options())
        .await
        .unwrap_err();

    let message = format!("{error:?}");
    assert!(message.contains("Failed to process"), "{message}");
    assert!(message.contains("quota exceeded"), "{message}");
    assert!(!dir.path().join("processed_pdfs").exists());
    Ok(())
}

#[test]
fn test_check_command_prints_info_dictionary() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("tagged.pdf");
    std::fs::write(
        &path,
        generate_test_pdf_with_info(&["Dune"], &[("Title", "Dune"), ("Author", "Frank Herbert")])?,
    )?;

    Command::cargo_bin("bookmeta")?
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("/Author: Frank Herbert\n/Title: Dune"));
    Ok(())
}

#[test]
fn test_check_command_fails_on_missing_file() -> Result<()> {
    let dir = tempdir()?;

    Command::cargo_bin("bookmeta")?
        .arg("check")
        .arg(dir.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to check"));
    Ok(())
}
