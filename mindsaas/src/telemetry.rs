//! Telemetry initialization: structured logging via tracing-subscriber.
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the fmt subscriber with an env-filter.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
