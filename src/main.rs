use clap::Parser;
use data_flow::infrastructure::{
    app::{configure_application, Args},
    path::append_to_path,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    let app = match configure_application(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let logger = &app.logger;

    logger.info(&format!("Starting pipeline {}", logger.name()));

    if let Some(directory) = &app.configuration.global.path_supplement {
        if let Err(e) = append_to_path(directory) {
            logger.error(&e.to_string());
            return ExitCode::FAILURE;
        }
        logger.info(&format!("Added {} to the library search path", directory));
    }

    logger.info("All done");

    ExitCode::SUCCESS
}
