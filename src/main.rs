// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docweave::app_config::{self, Config};
use docweave::file_utils::FileManager;
use docweave::project::{Edit, Project, SegmentStore};
use docweave::reconstruction::preflight;
use docweave::{AppError, Controller, ExportRequest, SegmentStatus};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SegmentStatus to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSegmentStatus {
    Untranslated,
    Draft,
    Translated,
    Approved,
}

impl From<CliSegmentStatus> for SegmentStatus {
    fn from(cli_status: CliSegmentStatus) -> Self {
        match cli_status {
            CliSegmentStatus::Untranslated => SegmentStatus::Untranslated,
            CliSegmentStatus::Draft => SegmentStatus::Draft,
            CliSegmentStatus::Translated => SegmentStatus::Translated,
            CliSegmentStatus::Approved => SegmentStatus::Approved,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a document into editable segments and save them as a project
    Import {
        /// Document to import (.docx or .json)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Project file to write (default: <stem>.docweave.json beside the document)
        #[arg(short, long, value_name = "PROJECT")]
        output: Option<PathBuf>,
    },

    /// Rebuild the document from a project's edited segments
    Export {
        /// Project file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Source document to rebuild from (default: the one recorded at import)
        #[arg(short, long, value_name = "DOCUMENT")]
        document: Option<PathBuf>,

        /// Output document (default: <stem>.translated.<ext> beside the source)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Print every recorded issue, not just the summary
        #[arg(long)]
        report: bool,
    },

    /// Check the inline tags of every segment
    Validate {
        /// Project file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },

    /// List a project's segments
    Segments {
        /// Project file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Only list segments with this status
        #[arg(short, long, value_enum)]
        status: Option<CliSegmentStatus>,
    },

    /// Set the edited text of one segment
    Edit {
        /// Project file
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Segment id
        #[arg(value_name = "ID")]
        id: usize,

        /// New text, inline tags allowed
        #[arg(value_name = "TEXT")]
        text: String,

        /// Status to set after editing
        #[arg(short, long, value_enum)]
        status: Option<CliSegmentStatus>,
    },

    /// Generate shell completions for docweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// docweave - Document decomposition and round-trip reconstruction
///
/// Splits rich-text documents into editable segments and rebuilds them with
/// their paragraph styles, tables and inline formatting intact.
#[derive(Parser, Debug)]
#[command(name = "docweave")]
#[command(version)]
#[command(about = "Segment rich-text documents for editing and rebuild them faithfully")]
#[command(long_about = "docweave splits a document into editable segments and rebuilds the document from the edited segments.

EXAMPLES:
    docweave import report.docx                      # Write report.docweave.json
    docweave segments report.docweave.json           # List segments
    docweave edit report.docweave.json 3 'Neu <b>fett</b>.'
    docweave validate report.docweave.json           # Check inline tags
    docweave export report.docweave.json --report    # Write report.translated.docx
    docweave completions bash > docweave.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in docweave.json by default. You can specify a
    different config file with --config. If the config file doesn't exist, a
    default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "docweave.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long, global = true)]
    force: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Most verbose filter on the logger itself; the max level does the gating
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "docweave", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let force = cli.force;

    let result = match cli.command {
        Commands::Import { document, output } => run_import(&controller, document, output, force).await,
        Commands::Export {
            project,
            document,
            output,
            report,
        } => run_export(&controller, &project, document, output, report, force).await,
        Commands::Validate { project } => run_validate(&project),
        Commands::Segments { project, status } => run_segments(&project, status.map(Into::into)),
        Commands::Edit {
            project,
            id,
            text,
            status,
        } => run_edit(&project, id, text, status.map(Into::into)),
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Load the config file (creating it if needed) and apply CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if cli.force {
        config.output.force_overwrite = true;
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn run_import(
    controller: &Controller,
    document: PathBuf,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let project_path = output.unwrap_or_else(|| FileManager::project_path_for(&document));

    let progress = spinner("Importing");
    let outcome = controller.import(document).await;
    progress.finish_and_clear();
    let outcome = outcome?;

    for issue in &outcome.issues {
        warn!("{}", issue);
    }
    controller.save_project(&outcome.project, &project_path, force)?;
    info!(
        "{} segments from {} content nodes",
        outcome.project.segments.len(),
        outcome.node_count
    );
    Ok(())
}

async fn run_export(
    controller: &Controller,
    project_path: &Path,
    document: Option<PathBuf>,
    output: Option<PathBuf>,
    show_report: bool,
    force: bool,
) -> Result<()> {
    let project = Project::load(project_path)
        .with_context(|| format!("Failed to load project {:?}", project_path))?;

    let document_path = document.unwrap_or_else(|| project.source_path.clone());
    let output_path = match output {
        Some(path) => path,
        None => Controller::default_output_path(&document_path, "translated")?,
    };

    let request = ExportRequest::for_project(&project, output_path)
        .with_document(document_path)
        .with_force(force);

    let progress = spinner("Exporting");
    let mut job = controller.export(request);
    let result = tokio::select! {
        result = job.wait() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling export");
            job.cancel();
            job.wait().await
        }
    };
    progress.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(AppError::Reconstruction(e)) => {
            for id in e.segment_ids() {
                error!("Segment #{} has invalid tags", id);
            }
            return Err(anyhow!("{}", e));
        }
        Err(e) => return Err(anyhow!("{}", e)),
    };

    if show_report {
        print!("{}", outcome.report);
    } else {
        println!("{}", outcome.report.summary());
    }
    Ok(())
}

fn run_validate(project_path: &Path) -> Result<()> {
    let project = Project::load(project_path)?;

    match preflight(&project.segments) {
        Ok(()) => {
            info!("All {} segments have valid tags", project.segments.len());
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", e)),
    }
}

fn run_segments(project_path: &Path, status: Option<SegmentStatus>) -> Result<()> {
    let project = Project::load(project_path)?;

    for segment in project
        .segments
        .iter()
        .filter(|s| status.is_none_or(|wanted| s.status == wanted))
    {
        let location = match segment.table_coord {
            Some(coord) => format!(" table {} r{}c{}", coord.table + 1, coord.row + 1, coord.cell + 1),
            None => String::new(),
        };
        println!(
            "#{:<4} {:<12} {:<13}{} {}",
            segment.id,
            segment.status.as_str(),
            segment.style_info().display_name,
            location,
            segment.effective_text()
        );
    }

    let stats = project.stats();
    info!(
        "{} segments, {} edited, {} in tables",
        stats.total,
        stats.edited(),
        stats.table_cells
    );
    Ok(())
}

fn run_edit(project_path: &Path, id: usize, text: String, status: Option<SegmentStatus>) -> Result<()> {
    let mut project = Project::load(project_path)?;
    let store = SegmentStore::new(std::mem::take(&mut project.segments));

    let validation = docweave::validate(&text);
    if !validation.ok {
        warn!("Segment #{}: {}", id, validation.message);
    }

    store.apply(Edit::SetTarget { id, text })?;
    if let Some(status) = status {
        store.apply(Edit::SetStatus { id, status })?;
    }

    project.segments = store.into_segments();
    project.touch();
    project.save(project_path)?;
    info!("Segment #{} updated", id);
    Ok(())
}
