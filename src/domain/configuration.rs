use log::LevelFilter;
use serde_derive::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_LOG_PATTERN: &str = "{d} {l} {t} - {m}{n}";
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Pipeline configuration file, as read by the `data-flow` binary.
///
/// Only the sections used to prepare a run are modelled. Connection and
/// import sections (`source.rdms`, `target`) are accepted and ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfiguration {
    #[serde(default)]
    pub global: GlobalConfiguration,
    pub source: SourceConfiguration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfiguration {
    pub logging: Option<PipelineLoggingConfig>,
    pub path_supplement: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfiguration {
    pub application: String,
}

/// Destinations of a pipeline logger. Each section that is present attaches
/// one appender; an empty configuration leaves the logger without output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineLoggingConfig {
    pub console: Option<LogOutputConfig>,
    pub file: Option<FileLogConfig>,
    #[serde(default = "default_level")]
    pub level: LevelFilter,
}

impl Default for PipelineLoggingConfig {
    fn default() -> Self {
        Self {
            console: None,
            file: None,
            level: default_level(),
        }
    }
}

impl PipelineLoggingConfig {
    pub fn with_console(mut self, log_pattern: &str) -> Self {
        self.console = Some(LogOutputConfig {
            log_pattern: log_pattern.into(),
        });
        self
    }

    pub fn with_file(mut self, log_pattern: &str, directory: &Path) -> Self {
        self.file = Some(FileLogConfig {
            log_pattern: log_pattern.into(),
            directory: directory.to_path_buf(),
            max_history: DEFAULT_MAX_HISTORY,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOutputConfig {
    #[serde(default = "default_log_pattern")]
    pub log_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLogConfig {
    #[serde(default = "default_log_pattern")]
    pub log_pattern: String,
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_level() -> LevelFilter {
    LevelFilter::Info
}

fn default_log_pattern() -> String {
    DEFAULT_LOG_PATTERN.into()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIRECTORY)
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn parse_configuration(content: &str) -> Result<PipelineConfiguration, serde_json::Error> {
    serde_json::from_str(content)
}

pub fn load_configuration(path: &Path) -> Result<PipelineConfiguration, ConfigurationError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_configuration(&content).map_err(|source| ConfigurationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
