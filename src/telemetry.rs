//! Telemetry initialization.
//!
//! Controlled by two environment variables:
//! - `RUST_LOG` — standard env-filter directives (default `"warn"`)
//! - `WAYPOST_LOG_FORMAT` — `"json"` for JSON events to stderr, anything
//!   else (or unset) for compact text
//!
//! Initialization is idempotent: a second call (e.g. from another test)
//! is a no-op.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("WAYPOST_LOG_FORMAT").is_ok_and(|v| v == "json");

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .try_init()
    };

    // Another subscriber already installed: keep it.
    drop(result);
}
