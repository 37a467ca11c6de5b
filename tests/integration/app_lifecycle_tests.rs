/*!
 * Integration tests for the controller's import and export jobs
 */

use anyhow::Result;
use std::fs;

use crate::common;
use docweave::app_config::Config;
use docweave::project::Project;
use docweave::{AppError, Controller, ExportRequest, IssueKind, walk};

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert_eq!(controller.config(), &Config::default());
    Ok(())
}

/// Test that importing a missing document fails
#[tokio::test]
async fn test_import_withMissingFile_shouldFail() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;

    let result = controller.import(temp_dir.path().join("missing.docx")).await;

    assert!(result.is_err());
    Ok(())
}

/// Test import → save → export with JSON documents
#[tokio::test]
async fn test_importThenExport_withJsonDocument_shouldRebuildDocument() -> Result<()> {
    common::init_logging();
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_json_document(temp_dir.path(), "sample.json", &common::sample_document())?;

    let outcome = controller.import(source.clone()).await?;
    assert_eq!(outcome.node_count, 4);
    assert_eq!(outcome.project.segments.len(), 5);
    assert_eq!(outcome.project.source_hash.len(), 64);

    let project_path = temp_dir.path().join("sample.docweave.json");
    controller.save_project(&outcome.project, &project_path, false)?;
    let mut project = Project::load(&project_path)?;
    project.segments[4].target_text = "Zweiter Satz.".to_string();

    let output = temp_dir.path().join("sample.de.json");
    let exported = controller
        .export_and_wait(ExportRequest::for_project(&project, output.clone()))
        .await?;

    assert_eq!(exported.output_path, output);
    assert_eq!(exported.report.segments_exported, 5);
    let rebuilt = docweave::document::open(&output)?;
    let texts: Vec<String> = walk(&rebuilt).nodes.into_iter().map(|n| n.plain_text).collect();
    assert_eq!(texts, vec!["Title", "A", "B", "Hello world. Zweiter Satz."]);
    Ok(())
}

/// Test that the project is not overwritten without force
#[tokio::test]
async fn test_saveProject_withExistingFile_shouldRequireForce() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_json_document(temp_dir.path(), "a.json", &common::sample_document())?;
    let project_path = common::create_test_file(temp_dir.path(), "a.docweave.json", "keep me")?;

    let outcome = controller.import(source).await?;

    assert!(controller.save_project(&outcome.project, &project_path, false).is_err());
    assert_eq!(fs::read_to_string(&project_path)?, "keep me");
    controller.save_project(&outcome.project, &project_path, true)?;
    assert_eq!(Project::load(&project_path)?.segments.len(), 5);
    Ok(())
}

/// Test that a cancelled export leaves the existing output untouched
#[tokio::test]
async fn test_export_whenCancelled_shouldKeepExistingOutput() -> Result<()> {
    common::init_logging();
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_docx_document(temp_dir.path(), "doc.docx", &common::formatted_document())?;
    let output = common::create_test_file(temp_dir.path(), "doc.out.docx", "previous valid output")?;

    let outcome = controller.import(source).await?;
    let request = ExportRequest::for_project(&outcome.project, output.clone()).with_force(true);

    let mut job = controller.export(request);
    job.cancel();
    let result = job.wait().await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(fs::read_to_string(&output)?, "previous valid output");
    // no stray temporary files next to the output
    let names: Vec<String> = fs::read_dir(temp_dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 2, "unexpected files: {:?}", names);
    Ok(())
}

/// Test that an existing output needs force
#[tokio::test]
async fn test_export_withExistingOutputAndNoForce_shouldFail() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_json_document(temp_dir.path(), "s.json", &common::sample_document())?;
    let output = common::create_test_file(temp_dir.path(), "s.out.json", "old")?;

    let outcome = controller.import(source).await?;
    let result = controller
        .export_and_wait(ExportRequest::for_project(&outcome.project, output.clone()))
        .await;

    assert!(matches!(result, Err(AppError::File(_))));
    assert_eq!(fs::read_to_string(&output)?, "old");
    Ok(())
}

/// Test that a changed source only warns and the export still runs
#[tokio::test]
async fn test_export_withChangedSource_shouldStillExport() -> Result<()> {
    common::init_logging();
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_json_document(temp_dir.path(), "c.json", &common::sample_document())?;

    let outcome = controller.import(source.clone()).await?;

    // Drop the table from the source after import
    let mut changed = common::sample_document();
    changed.body.remove(1);
    common::write_json_document(temp_dir.path(), "c.json", &changed)?;

    let output = temp_dir.path().join("c.out.json");
    let exported = controller
        .export_and_wait(ExportRequest::for_project(&outcome.project, output.clone()))
        .await?;

    assert!(output.exists());
    assert!(exported.report.count(IssueKind::StaleReference) > 0);
    Ok(())
}

/// Test that an export can target a different format than its source
#[tokio::test]
async fn test_export_fromJsonToDocx_shouldWriteFreshPackage() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let source = common::write_json_document(temp_dir.path(), "x.json", &common::formatted_document())?;

    let outcome = controller.import(source).await?;
    let output = temp_dir.path().join("x.docx");
    controller
        .export_and_wait(ExportRequest::for_project(&outcome.project, output.clone()))
        .await?;

    let rebuilt = docweave::document::open(&output)?;
    assert_eq!(walk(&rebuilt).nodes.len(), walk(&common::formatted_document()).nodes.len());
    Ok(())
}
