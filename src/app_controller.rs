use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::document::{Document, DocumentFormat, StyleCatalog};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::project::Project;
use crate::reconstruction::{ReconstructionOptions, reconstruct};
use crate::report::{Issue, Report};
use crate::segmenter::{Segment, Segmenter};
use crate::walker::walk;

// @module: Application controller for import and export jobs

/// Result of importing a document
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub project: Project,
    /// Content nodes found by the walker
    pub node_count: usize,
    /// Elements skipped while walking
    pub issues: Vec<Issue>,
}

/// Everything an export job needs, captured when the job starts
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Original document to rebuild from
    pub document_path: PathBuf,
    /// Segment snapshot; later edits are not seen by the job
    pub segments: Vec<Segment>,
    pub output_path: PathBuf,
    /// Hash recorded at import, compared against the document on disk
    pub expected_hash: Option<String>,
    pub force_overwrite: bool,
}

impl ExportRequest {
    /// Export a project's segments against its recorded source document
    pub fn for_project(project: &Project, output_path: PathBuf) -> Self {
        Self {
            document_path: project.source_path.clone(),
            segments: project.segments.clone(),
            output_path,
            expected_hash: Some(project.source_hash.clone()).filter(|h| !h.is_empty()),
            force_overwrite: false,
        }
    }

    pub fn with_document(mut self, document_path: PathBuf) -> Self {
        self.document_path = document_path;
        self
    }

    pub fn with_force(mut self, force_overwrite: bool) -> Self {
        self.force_overwrite = force_overwrite;
        self
    }
}

/// Result of a completed export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub output_path: PathBuf,
    pub report: Report,
    pub elapsed: Duration,
}

/// Handle to a running export
pub struct ExportJob {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<Result<ExportOutcome, AppError>>,
}

impl ExportJob {
    /// Ask the job to stop; its result is discarded and nothing is written
    pub fn cancel(&self) {
        // The job may already be gone
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job to finish
    pub async fn wait(&mut self) -> Result<ExportOutcome, AppError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AppError::Cancelled),
            Err(e) => Err(AppError::Unknown(format!("Export task failed: {}", e))),
        }
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a document and split it into segments on a blocking worker
    pub async fn import(&self, document_path: PathBuf) -> Result<ImportOutcome> {
        if !FileManager::file_exists(&document_path) {
            return Err(anyhow!("Input file does not exist: {:?}", document_path));
        }

        let start_time = Instant::now();
        let segmenter = Segmenter::new(&self.config.segmentation);
        let path = document_path.clone();

        let outcome = tokio::task::spawn_blocking(move || import_blocking(&path, &segmenter))
            .await
            .context("Import task failed")??;

        info!(
            "Imported {} segments from {} content nodes in {}",
            outcome.project.segments.len(),
            outcome.node_count,
            Self::format_duration(start_time.elapsed())
        );
        for issue in &outcome.issues {
            debug!("{}", issue);
        }

        Ok(outcome)
    }

    /// Save a project, refusing to replace an existing file unless forced
    pub fn save_project(&self, project: &Project, path: &Path, force_overwrite: bool) -> Result<()> {
        if path.exists() && !(force_overwrite || self.config.output.force_overwrite) {
            return Err(anyhow!(
                "Project file already exists: {:?} (use --force to overwrite)",
                path
            ));
        }
        project
            .save(path)
            .with_context(|| format!("Failed to save project to {:?}", path))?;
        info!("Success: {}", path.display());
        Ok(())
    }

    /// Style catalog for an output document: the source catalog plus the
    /// configured fallback table and default style
    pub fn output_catalog(&self, document: &Document) -> StyleCatalog {
        let reconstruction = &self.config.reconstruction;
        let mut catalog = document
            .styles
            .clone()
            .with_fallbacks(reconstruction.style_fallbacks.clone());
        catalog.default_style = reconstruction.default_style.clone();
        catalog
    }

    /// Start an export on a background worker and return its handle
    pub fn export(&self, request: ExportRequest) -> ExportJob {
        let (cancel, cancel_rx) = watch::channel(false);
        let controller = Self {
            config: self.config.clone(),
        };
        let handle = tokio::spawn(async move { controller.run_export(request, cancel_rx).await });
        ExportJob { cancel, handle }
    }

    /// Export and wait for the result
    pub async fn export_and_wait(&self, request: ExportRequest) -> Result<ExportOutcome, AppError> {
        let mut job = self.export(request);
        job.wait().await
    }

    async fn run_export(
        &self,
        request: ExportRequest,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> Result<ExportOutcome, AppError> {
        let start_time = Instant::now();
        let force = request.force_overwrite || self.config.output.force_overwrite;

        if request.output_path.exists() && !force {
            return Err(AppError::File(format!(
                "Output file already exists: {:?} (use --force to overwrite)",
                request.output_path
            )));
        }
        if *cancel_rx.borrow() {
            return Err(AppError::Cancelled);
        }

        let options = ReconstructionOptions::from(&self.config.reconstruction);
        let controller = Self {
            config: self.config.clone(),
        };
        let output_path = request.output_path.clone();
        let worker = tokio::task::spawn_blocking(move || {
            controller.build_output(&request, &options)
        });

        // A finished worker whose job was cancelled drops its temp file
        let (temp, report) = tokio::select! {
            biased;
            Ok(()) = cancel_rx.changed() => {
                info!("Export to {} cancelled", output_path.display());
                return Err(AppError::Cancelled);
            }
            result = worker => result
                .map_err(|e| AppError::Unknown(format!("Export worker failed: {}", e)))??,
        };

        if *cancel_rx.borrow() {
            info!("Export to {} cancelled", output_path.display());
            return Err(AppError::Cancelled);
        }

        FileManager::persist(temp, &output_path)?;

        let elapsed = start_time.elapsed();
        info!(
            "{} in {}",
            report.summary(),
            Self::format_duration(elapsed)
        );
        info!("Success: {}", output_path.display());

        Ok(ExportOutcome {
            output_path,
            report,
            elapsed,
        })
    }

    /// Rebuild the document and write it to a temporary file beside the
    /// output path
    fn build_output(
        &self,
        request: &ExportRequest,
        options: &ReconstructionOptions,
    ) -> Result<(NamedTempFile, Report), AppError> {
        let bytes = FileManager::read_bytes(&request.document_path)?;

        if let Some(expected) = &request.expected_hash {
            let actual = FileManager::sha256_bytes(&bytes);
            if &actual != expected {
                warn!(
                    "Source document {} changed since import; segments may not line up",
                    request.document_path.display()
                );
            }
        }

        let source_format = FileManager::detect_format(&request.document_path)?;
        let output_format = FileManager::detect_format(&request.output_path)?;
        let original = source_format.store().parse(&bytes)?;

        let catalog = self.output_catalog(&original);
        let mut rebuilt = reconstruct(&original, &request.segments, &catalog, options)?;
        if output_format != source_format {
            // The source container only fits its own format
            rebuilt.document.package = None;
        }

        let rendered = output_format.store().render(&rebuilt.document)?;

        let mut temp = FileManager::temp_file_for(&request.output_path)?;
        temp.write_all(&rendered)?;
        temp.flush()?;
        debug!(
            "Rendered {} bytes of {:?} into {}",
            rendered.len(),
            output_format,
            temp.path().display()
        );

        Ok((temp, rebuilt.report))
    }

    /// Default output path: `<stem>.<suffix>.<ext>` beside the document
    pub fn default_output_path(document_path: &Path, suffix: &str) -> Result<PathBuf> {
        let format = FileManager::detect_format(document_path)?;
        Ok(FileManager::generate_output_path(
            document_path,
            FileManager::parent_dir(document_path),
            suffix,
            format.extension(),
        ))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn import_blocking(path: &Path, segmenter: &Segmenter) -> Result<ImportOutcome> {
    let bytes = FileManager::read_bytes(path)?;
    let hash = FileManager::sha256_bytes(&bytes);
    let format: DocumentFormat = FileManager::detect_format(path)?;
    let document = format
        .store()
        .parse(&bytes)
        .with_context(|| format!("Failed to parse document {:?}", path))?;

    let walked = walk(&document);
    let segments = segmenter.segment_all(&walked.nodes);

    Ok(ImportOutcome {
        project: Project::new(path, hash, segments),
        node_count: walked.nodes.len(),
        issues: walked.issues,
    })
}
