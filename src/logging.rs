//! Tracing subscriber setup
//!
//! Logs go to stderr so fares printed on stdout stay clean.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the filter from `RUST_LOG`, falling back to `default_level` when the
/// variable is unset or invalid
fn env_filter(default_level: LevelFilter) -> EnvFilter {
    let Ok(rust_log) = std::env::var(EnvFilter::DEFAULT_ENV) else {
        return EnvFilter::new(default_level.to_string());
    };
    EnvFilter::try_new(&rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    })
}

/// Installs the global subscriber
///
/// Returns an error if a global subscriber is already set.
pub fn init_logger(default_level: LevelFilter) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(default_level))
        .try_init()
}
