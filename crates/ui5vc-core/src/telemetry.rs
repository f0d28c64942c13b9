//! Logging setup for `ui5vc`.
//!
//! CI jobs pipe the summary table (or the `--json` document) from stdout
//! into step summaries and scripts, so every log line is written to stderr
//! and never mixes with that output. `RUST_LOG` overrides the level chosen
//! on the command line.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber. Later calls leave the first one in place.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let lines = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let lines = if json {
        lines.json().boxed()
    } else {
        lines.boxed()
    };

    tracing_subscriber::registry()
        .with(lines)
        .with(filter)
        .try_init()
        .ok();
}
