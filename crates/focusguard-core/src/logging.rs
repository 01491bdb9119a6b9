//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; hosts call [`init`] once to get
//! formatted output on stderr.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` overrides `config.filter`. An invalid filter falls back to
/// `info`. Calling this again, or after another subscriber was installed,
/// does nothing.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();

    if result.is_ok() {
        tracing::debug!(filter = %config.filter, "logging initialised");
    }
}
