//! Tracing subscriber initialisation for binaries embedding the rotation job.
//!
//! The job itself only emits `tracing` events; hosts that already install
//! their own subscriber should skip this and keep theirs.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise a JSON-formatted global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_level` (e.g. `"info"`)
/// applies.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_telemetry(fallback_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_init_is_an_error_not_a_panic() {
        let first = init_telemetry("info");
        if first.is_ok() {
            assert!(init_telemetry("debug").is_err());
        }
    }
}
