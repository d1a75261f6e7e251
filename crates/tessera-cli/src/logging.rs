use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. `log` records from the library crates reach
/// the subscriber through the `tracing-log` bridge.
pub fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

