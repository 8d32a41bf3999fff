// File: ./src/logging.rs
//! simplelog setup: terminal output plus a debug log file in the data directory.
use crate::context::AppContext;
use anyhow::Result;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;

pub fn init(ctx: &dyn AppContext, verbose: bool) -> Result<()> {
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("skysync")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    // The log file is optional; a read-only data dir must not stop the run.
    match ctx.get_log_path().map(File::create) {
        Some(Ok(file)) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Some(Err(e)) => eprintln!("Warning: could not open log file: {}", e),
        None => {}
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
