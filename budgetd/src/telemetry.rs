//! Tracing initialization.
//!
//! Log output goes to stdout through the `tracing-subscriber` fmt layer. Verbosity is controlled
//! with the standard `RUST_LOG` environment variable and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=budgetd=debug,tower_http=debug budgetd -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Fails if a subscriber has already been installed, e.g. by a test harness.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
