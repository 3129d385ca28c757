use chrono::NaiveDate;
use core::fmt::{Arguments, Debug};
use log::Level;
use std::path::{Path, PathBuf};

const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Target of the crate's own records. A pipeline logger with this name would
/// capture them, so it cannot be registered.
pub const INTERNAL_TARGET: &str = "data_flow";

pub fn is_reserved_pipeline_name(pipeline_name: &str) -> bool {
    pipeline_name == INTERNAL_TARGET
}

/// Lower-cases the pipeline name and replaces spaces with underscores.
pub fn normalize_pipeline_name(pipeline_name: &str) -> String {
    pipeline_name.to_lowercase().replace(' ', "_")
}

pub fn log_file_path(directory: &Path, pipeline_name: &str) -> PathBuf {
    directory.join(format!(
        "{}-pipeline.log",
        normalize_pipeline_name(pipeline_name)
    ))
}

/// `logs/sales-pipeline.log` archived on 2024-01-31 becomes
/// `logs/sales-pipeline.2024-01-31.log`.
pub fn archive_file_name(active_file: &Path, date: NaiveDate) -> PathBuf {
    let (stem, extension) = split_file_name(active_file);
    let name = match extension {
        Some(ext) => format!("{}.{}.{}", stem, date.format(ARCHIVE_DATE_FORMAT), ext),
        None => format!("{}.{}", stem, date.format(ARCHIVE_DATE_FORMAT)),
    };
    active_file.with_file_name(name)
}

/// Date of an archive of `active_file`, or `None` when `file_name` is not one.
pub fn archive_date(active_file: &Path, file_name: &str) -> Option<NaiveDate> {
    let (stem, extension) = split_file_name(active_file);
    let rest = file_name.strip_prefix(stem.as_str())?.strip_prefix('.')?;
    let date = match extension {
        Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
        None => rest,
    };
    NaiveDate::parse_from_str(date, ARCHIVE_DATE_FORMAT).ok()
}

fn split_file_name(path: &Path) -> (String, Option<String>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned());
    (stem, extension)
}

pub trait Clock: Debug + Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Handle on a pipeline's named logger.
///
/// Records are emitted through the `log` facade with the pipeline name as
/// target, which is what routes them to the pipeline's appenders.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineLogger {
    name: String,
    log_file: Option<PathBuf>,
}

impl PipelineLogger {
    pub fn new(name: &str, log_file: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            log_file,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn log(&self, level: Level, args: Arguments<'_>) {
        log::log!(target: self.name.as_str(), level, "{}", args);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, format_args!("{}", message));
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, format_args!("{}", message));
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, format_args!("{}", message));
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, format_args!("{}", message));
    }
}
