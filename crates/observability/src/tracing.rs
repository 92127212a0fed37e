//! Tracing/logging initialization shared by every stockforge binary.

use tracing_subscriber::EnvFilter;

const FORMAT_VAR: &str = "STOCKFORGE_LOG_FORMAT";

/// Initialize process-wide tracing.
///
/// The filter comes from `RUST_LOG` (default `info`). `STOCKFORGE_LOG_FORMAT`
/// switches to `pretty` human-readable output; anything else emits JSON lines.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match std::env::var(FORMAT_VAR).as_deref() {
        Ok("pretty") => {
            let _ = builder.pretty().try_init();
        }
        _ => {
            let _ = builder
                .json()
                .with_timer(tracing_subscriber::fmt::time::SystemTime)
                .try_init();
        }
    }
}
