//! Tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer. `RUST_LOG` takes precedence over the default filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(debug_mode: bool) -> &'static str {
    if debug_mode {
        "engage_core=debug,engage_plugins=debug,engage_infra=debug"
    } else {
        "engage_core=info,engage_plugins=info,engage_infra=info"
    }
}

/// Initialize tracing for the host process.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(debug_mode: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(debug_mode).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(debug_mode = debug_mode, "Telemetry initialized");
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
