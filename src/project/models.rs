/*!
 * Persisted project state.
 *
 * A project is the segment list of one imported document plus enough
 * metadata to find and verify that document again at export time.
 */

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::errors::ProjectError;
use crate::segmenter::{Segment, SegmentStatus};

/// Highest project format this build reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// Segment list of one document, as saved to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_format_version")]
    pub format_version: u32,

    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Document the segments were imported from
    #[serde(default)]
    pub source_path: PathBuf,

    /// SHA-256 of the source document at import, hex encoded
    #[serde(default)]
    pub source_hash: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    pub segments: Vec<Segment>,
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

/// Segment counts for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub total: usize,
    pub by_status: BTreeMap<SegmentStatus, usize>,
    pub table_cells: usize,
}

impl ProjectStats {
    pub fn count(&self, status: SegmentStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Segments that have been edited in any way
    pub fn edited(&self) -> usize {
        self.total - self.count(SegmentStatus::Untranslated)
    }
}

impl Project {
    pub fn new(source_path: impl Into<PathBuf>, source_hash: impl Into<String>, segments: Vec<Segment>) -> Self {
        let now = Utc::now();
        Self {
            format_version: FORMAT_VERSION,
            id: Uuid::new_v4(),
            source_path: source_path.into(),
            source_hash: source_hash.into(),
            created_at: now,
            updated_at: now,
            segments,
        }
    }

    /// Parse a project from JSON, rejecting formats newer than this build
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: Project = serde_json::from_str(json)?;
        if project.format_version > FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: project.format_version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(project)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = fs::read_to_string(path)?;
        let project = Self::from_json(&json)?;
        debug!(
            "Loaded project {} ({} segments) from {}",
            project.short_id(),
            project.segments.len(),
            path.display()
        );
        Ok(project)
    }

    /// Write the project next to its final path, then move it into place.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(self.to_json()?.as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| e.error)?;

        debug!("Saved project {} to {}", self.short_id(), path.display());
        Ok(())
    }

    /// Bump the modification time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }

    pub fn segment(&self, id: usize) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn stats(&self) -> ProjectStats {
        let mut stats = ProjectStats {
            total: self.segments.len(),
            ..ProjectStats::default()
        };
        for segment in &self.segments {
            *stats.by_status.entry(segment.status).or_insert(0) += 1;
            if segment.is_table_cell() {
                stats.table_cells += 1;
            }
        }
        stats
    }
}
