pub mod configuration;
pub mod pipeline_logging;
