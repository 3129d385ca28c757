use super::logger::{create_logger, LoggingError};
use crate::domain::{
    configuration::{load_configuration, ConfigurationError, PipelineConfiguration},
    pipeline_logging::PipelineLogger,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "data-flow", about = "Prepare a data pipeline run: load its configuration and set up its logging")]
pub struct Args {
    /// Path to the pipeline configuration file
    #[arg(long, env = "DF_CONFIG_FILE", default_value = "pipeline-config.json")]
    pub config: PathBuf,
}

pub struct Application {
    pub configuration: PipelineConfiguration,
    pub logger: PipelineLogger,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("failed to configure pipeline logging: {0}")]
    Logging(#[from] LoggingError),
}

pub fn configure_application(args: &Args) -> Result<Application, ApplicationError> {
    let configuration = load_configuration(&args.config)?;
    let logger = create_logger(
        &configuration.source.application,
        configuration.global.logging.as_ref(),
    )?;

    Ok(Application {
        configuration,
        logger,
    })
}
