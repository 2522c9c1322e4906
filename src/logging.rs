// Tracing setup shared by both binaries

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `filter` uses EnvFilter syntax ("info", "lra_gst_wizard=debug,warn").
/// With a log file, output is appended there without ANSI colours.
pub fn init(filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;

            let file_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
        None => {
            let console_layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
    }

    Ok(())
}
