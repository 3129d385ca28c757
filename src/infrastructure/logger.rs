use super::{
    clock::SystemClock,
    rolling::daily_policy,
};
use crate::domain::{
    configuration::{FileLogConfig, PipelineLoggingConfig, DEFAULT_LOG_PATTERN},
    pipeline_logging::{
        is_reserved_pipeline_name, log_file_path, normalize_pipeline_name, Clock, PipelineLogger,
        INTERNAL_TARGET,
    },
};
use log::{info, LevelFilter, SetLoggerError};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::RollingFileAppender,
    },
    config::{runtime::ConfigErrors, Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use core::fmt::{Debug, Formatter};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex, OnceLock},
};

const ROOT_APPENDER: &str = "stderr";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("pipeline name must not be blank")]
    BlankPipelineName,
    #[error("pipeline name {0} is reserved for internal records")]
    ReservedPipelineName(String),
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid logging configuration: {0}")]
    InvalidConfiguration(#[from] ConfigErrors),
    #[error("another logger is already installed: {0}")]
    AlreadyInstalled(#[from] SetLoggerError),
    #[error("logging registry lock is poisoned")]
    Poisoned,
}

pub fn console_appender_name(pipeline_name: &str) -> String {
    format!("{}-console", normalize_pipeline_name(pipeline_name))
}

pub fn file_appender_name(pipeline_name: &str) -> String {
    format!("{}-file", normalize_pipeline_name(pipeline_name))
}

/// Opens `<directory>/<normalized-name>-pipeline.log` in append mode, rolled
/// daily and keeping `max_history` dated archives.
pub fn rolling_file_appender(
    pipeline_name: &str,
    file: &FileLogConfig,
    clock: Arc<dyn Clock>,
) -> Result<RollingFileAppender, LoggingError> {
    let path = log_file_path(&file.directory, pipeline_name);

    fs::create_dir_all(&file.directory)
        .and_then(|_| {
            RollingFileAppender::builder()
                .append(true)
                .encoder(Box::new(PatternEncoder::new(&file.log_pattern)))
                .build(&path, Box::new(daily_policy(clock, file.max_history)))
        })
        .map_err(|source| LoggingError::LogFile { path, source })
}

/// Builds the log4rs configuration for every registered pipeline.
///
/// Each pipeline gets a non-additive logger named after it, plus one console
/// and one rolling file appender when the matching section is present. The
/// root logger only forwards warnings and errors to stderr.
pub fn build_pipeline_config<'a, I>(
    pipelines: I,
    clock: Arc<dyn Clock>,
) -> Result<log4rs::Config, LoggingError>
where
    I: IntoIterator<Item = (&'a str, &'a PipelineLoggingConfig)>,
{
    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .target(Target::Stderr)
        .build();

    let mut builder = log4rs::Config::builder()
        .appender(Appender::builder().build(ROOT_APPENDER, Box::new(stderr)));

    for (pipeline_name, config) in pipelines {
        let mut logger = Logger::builder().additive(false);

        if let Some(console) = &config.console {
            let name = console_appender_name(pipeline_name);
            let appender = ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(&console.log_pattern)))
                .target(Target::Stdout)
                .build();
            builder = builder.appender(Appender::builder().build(&name, Box::new(appender)));
            logger = logger.appender(name);
        }

        if let Some(file) = &config.file {
            let name = file_appender_name(pipeline_name);
            let appender = rolling_file_appender(pipeline_name, file, clock.clone())?;
            builder = builder.appender(Appender::builder().build(&name, Box::new(appender)));
            logger = logger.appender(name);
        }

        builder = builder.logger(logger.build(pipeline_name, config.level));
    }

    let config = builder.build(
        Root::builder()
            .appender(ROOT_APPENDER)
            .build(LevelFilter::Warn),
    )?;

    Ok(config)
}

/// Pipelines known to the process and the handle of the installed logger.
pub struct LoggingRegistry {
    clock: Arc<dyn Clock>,
    pipelines: BTreeMap<String, PipelineLoggingConfig>,
    handle: Option<Handle>,
}

impl LoggingRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pipelines: BTreeMap::new(),
            handle: None,
        }
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    /// Records the pipeline and builds the configuration of every registered
    /// pipeline. A rejected configuration leaves the registry as it was.
    pub fn register(
        &mut self,
        pipeline_name: &str,
        config: Option<&PipelineLoggingConfig>,
    ) -> Result<log4rs::Config, LoggingError> {
        if pipeline_name.trim().is_empty() {
            return Err(LoggingError::BlankPipelineName);
        }
        if is_reserved_pipeline_name(pipeline_name) {
            return Err(LoggingError::ReservedPipelineName(pipeline_name.into()));
        }

        let previous = self
            .pipelines
            .insert(pipeline_name.into(), config.cloned().unwrap_or_default());
        let built = build_pipeline_config(
            self.pipelines.iter().map(|(n, c)| (n.as_str(), c)),
            self.clock.clone(),
        );
        if built.is_err() {
            self.restore(pipeline_name, previous);
        }

        built
    }

    /// Registers the pipeline and applies the resulting configuration.
    ///
    /// The first registration installs log4rs as the global logger; later ones
    /// swap the configuration of the running logger.
    pub fn create_logger(
        &mut self,
        pipeline_name: &str,
        config: Option<&PipelineLoggingConfig>,
    ) -> Result<PipelineLogger, LoggingError> {
        let log_config = self.register(pipeline_name, config)?;

        match &self.handle {
            Some(handle) => handle.set_config(log_config),
            None => match log4rs::init_config(log_config) {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => {
                    // Without a handle no earlier registration took effect either.
                    self.pipelines.clear();
                    return Err(e.into());
                }
            },
        }

        info!(
            target: INTERNAL_TARGET,
            "Configured logger for pipeline {} ({} pipeline(s) registered)",
            pipeline_name,
            self.pipelines.len()
        );

        let log_file = config
            .and_then(|c| c.file.as_ref())
            .map(|f| log_file_path(&f.directory, pipeline_name));

        Ok(PipelineLogger::new(pipeline_name, log_file))
    }

    fn restore(&mut self, pipeline_name: &str, previous: Option<PipelineLoggingConfig>) {
        match previous {
            Some(p) => self.pipelines.insert(pipeline_name.into(), p),
            None => self.pipelines.remove(pipeline_name),
        };
    }
}

impl Debug for LoggingRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoggingRegistry")
            .field("pipelines", &self.pipelines)
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

fn registry() -> &'static Mutex<LoggingRegistry> {
    static REGISTRY: OnceLock<Mutex<LoggingRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(LoggingRegistry::new(Arc::new(SystemClock))))
}

/// Creates (or reconfigures) the named logger of a pipeline.
pub fn create_logger(
    pipeline_name: &str,
    config: Option<&PipelineLoggingConfig>,
) -> Result<PipelineLogger, LoggingError> {
    let mut registry = registry().lock().map_err(|_| LoggingError::Poisoned)?;
    registry.create_logger(pipeline_name, config)
}
