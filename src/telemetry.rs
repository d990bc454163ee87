use anyhow::Context;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PEG_LOG";

/// Installs a compact stderr subscriber. `PEG_LOG` wins over `RUST_LOG`;
/// with neither set the level is `info`.
pub fn init() -> anyhow::Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(value) => EnvFilter::try_new(&value)
            .with_context(|| format!("invalid {LOG_ENV} filter '{value}'"))?,
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
