//! Tracing initialization for the binaries.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g.
/// `LESSON_PLANNER_LOG=lesson_planner=debug`.
pub const LOG_ENV: &str = "LESSON_PLANNER_LOG";

/// Installs the global subscriber. Later calls do nothing.
///
/// Events go to stderr so the CLI's stdout stays clean. Falls back to
/// `lesson_planner=info` when the variable is unset or invalid.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("lesson_planner=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
