/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::common;
use docweave::DocumentFormat;
use docweave::file_utils::FileManager;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/report.docx"),
        Path::new("/tmp/output"),
        "translated",
        "docx",
    );

    assert_eq!(output_path, Path::new("/tmp/output/report.translated.docx"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParents_shouldCreateThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("a").join("b").join("note.txt");

    FileManager::write_to_file(&path, "hello")?;

    assert_eq!(FileManager::read_to_string(&path)?, "hello");
    Ok(())
}

/// Test that atomic_write replaces the content in one step
#[test]
fn test_atomic_write_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out.json", "{}")?;

    FileManager::atomic_write(&path, b"{\"segments\": []}")?;

    assert_eq!(fs::read_to_string(&path)?, "{\"segments\": []}");
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}

/// Test that the file hash changes with the content
#[test]
fn test_sha256_file_withDifferentContent_shouldDiffer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let a = common::create_test_file(temp_dir.path(), "a.txt", "one")?;
    let b = common::create_test_file(temp_dir.path(), "b.txt", "two")?;

    let hash_a = FileManager::sha256_file(&a)?;

    assert_eq!(hash_a.len(), 64);
    assert_ne!(hash_a, FileManager::sha256_file(&b)?);
    assert_eq!(hash_a, FileManager::sha256_bytes(b"one"));
    Ok(())
}

/// Test that format detection is extension based
#[test]
fn test_detect_format_withKnownAndUnknownExtensions_shouldClassify() {
    assert_eq!(
        FileManager::detect_format("letters/cover.docx").unwrap(),
        DocumentFormat::Docx
    );
    assert_eq!(FileManager::detect_format("tree.JSON").unwrap(), DocumentFormat::Json);
    assert!(FileManager::detect_format("slides.pptx").is_err());
}
