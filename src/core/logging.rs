use crate::core::config::LOG_ENV;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `FEEDPACK_LOG` takes precedence over
/// `level`; stdout stays reserved for command envelopes.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
