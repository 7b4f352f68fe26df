//! Structured logging bootstrap (§4.7 ambient additions), grounded on the
//! teacher's `logging` module: an `EnvFilter` built from the configured
//! level, with a JSON/pretty format toggle mirroring `LoggingConfig`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Initialize the global `tracing` subscriber from `config`.
///
/// Safe to call once per process (typically at the top of `main`). A second
/// call is a no-op: `tracing`'s global dispatcher can only be set once, and
/// the resulting error is swallowed since it only ever fires in tests that
/// spin up more than one worker in-process.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_format {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
    }
}
