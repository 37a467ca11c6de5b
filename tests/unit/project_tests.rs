/*!
 * Tests for project persistence and the segment store
 */

use anyhow::Result;

use crate::common;
use docweave::project::{Edit, FORMAT_VERSION, Project, SegmentStore};
use docweave::{ProjectError, SegmentStatus, Segmenter, walk};

fn sample_project() -> Project {
    let segments = Segmenter::default().segment_all(&walk(&common::sample_document()).nodes);
    Project::new("sample.json", "0".repeat(64), segments)
}

/// Test that a saved project loads back unchanged
#[test]
fn test_project_saveAndLoad_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("sample.docweave.json");
    let project = sample_project();

    project.save(&path)?;
    let loaded = Project::load(&path)?;

    assert_eq!(loaded, project);
    assert_eq!(loaded.segments.len(), 5);
    Ok(())
}

/// Test that a project written before positions and styles existed still loads
#[test]
fn test_project_load_withLegacyFile_shouldDefaultPosition() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "legacy.json",
        r#"{
            "source_path": "old.docx",
            "segments": [
                {"id": 1, "source_text": "First.", "target_text": "Erstens.", "status": "translated"},
                {"id": 2, "source_text": "Second."}
            ]
        }"#,
    )?;

    let project = Project::load(&path)?;

    assert_eq!(project.format_version, FORMAT_VERSION);
    assert!(project.source_hash.is_empty());
    assert!(project.segments.iter().all(|s| s.owning_node_position == 0));
    assert!(project.segments.iter().all(|s| s.table_coord.is_none()));
    assert_eq!(project.segments[0].status, SegmentStatus::Translated);
    assert_eq!(project.segments[1].status, SegmentStatus::Untranslated);
    Ok(())
}

/// Test that a newer project format is rejected
#[test]
fn test_project_load_withFutureVersion_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "future.json",
        r#"{"format_version": 7, "segments": []}"#,
    )?;

    let result = Project::load(&path);

    assert!(matches!(result, Err(ProjectError::UnsupportedVersion { found: 7, .. })));
    Ok(())
}

/// Test that edits through the store end up in the saved project
#[test]
fn test_segmentStore_edits_shouldPersistThroughProject() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("edited.json");
    let mut project = sample_project();

    let store = SegmentStore::new(std::mem::take(&mut project.segments));
    store.apply(Edit::SetTarget {
        id: 4,
        text: "Hallo <b>Welt</b>.".to_string(),
    })?;
    store.apply(Edit::SetStatus {
        id: 4,
        status: SegmentStatus::Approved,
    })?;
    project.segments = store.into_segments();
    project.touch();
    project.save(&path)?;

    let loaded = Project::load(&path)?;
    let segment = loaded.segment(4).unwrap();
    assert_eq!(segment.target_text, "Hallo <b>Welt</b>.");
    assert_eq!(segment.status, SegmentStatus::Approved);
    assert!(loaded.updated_at >= loaded.created_at);
    assert_eq!(loaded.stats().edited(), 1);
    Ok(())
}

/// Test that subscribers see edits in the order they were applied
#[tokio::test]
async fn test_segmentStore_subscribe_shouldDeliverEditsInOrder() -> Result<()> {
    let store = SegmentStore::new(sample_project().segments);
    let mut receiver = store.subscribe();

    store.apply(Edit::SetTarget {
        id: 1,
        text: "Titel".to_string(),
    })?;
    store.apply(Edit::SetTarget {
        id: 2,
        text: "Ä".to_string(),
    })?;

    let first = receiver.recv().await?;
    let second = receiver.recv().await?;

    assert_eq!(first.segment.id, 1);
    assert_eq!(second.segment.id, 2);
    assert_eq!(second.segment.status, SegmentStatus::Draft);
    Ok(())
}
