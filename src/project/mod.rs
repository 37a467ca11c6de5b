/*!
 * Project persistence and live editing.
 *
 * This module provides:
 * - The saved project file (segments plus source document metadata)
 * - The segment store, single mutation entry point for edits
 */

pub mod models;
pub mod store;

pub use models::{FORMAT_VERSION, Project, ProjectStats};
pub use store::{Edit, SegmentStore, StoreEvent};
