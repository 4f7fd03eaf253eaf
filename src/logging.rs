use std::path::PathBuf;
use std::sync::Once;

use tracing::Level;
use tracing::{info, metadata::LevelFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;

static INIT: Once = Once::new();

/// Initialize tracing at the given levels.
///
/// The stdout layer is always installed. If `file_logging` is given, a
/// daily-rotated `ss.log` in that directory gets its own layer and level.
///
/// Only the first call installs anything, so tests may call this freely.
pub fn init_with(stdout_level: Level, file_logging: Option<(Level, PathBuf)>) {
    INIT.call_once(|| {
        let stdout_layer =
            tracing_subscriber::fmt::layer().with_filter(LevelFilter::from(stdout_level));

        let file_layer = file_logging.map(|(level, output_dir)| {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, output_dir, "ss.log");

            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(LevelFilter::from(level))
        });

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
    });
}

/// Initialize tracing: info on stdout, no file logging.
pub fn init() {
    init_with(Level::INFO, None)
}
