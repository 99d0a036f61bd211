//! Tracing initialization for the CDP MCP server.
//!
//! Logs always go to **stderr**: under the stdio transport stdout carries the
//! MCP protocol stream and any stray log line would corrupt it.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=cdp_mcp_server=debug` - Show verdicts and probe details
//!   - `RUST_LOG=warn,cdp_mcp_common=debug` - Warn by default, debug for common

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::Registry,
    EnvFilter, Layer,
};

fn stderr_layer() -> impl Layer<Registry> + Send + Sync {
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the tracing subscriber, `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
///
/// ```no_run
/// cdp_mcp_common::tracing::init_tracing();
/// tracing::info!("Server starting");
/// ```
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Initialize tracing with a custom default level used when `RUST_LOG` is unset.
pub fn init_tracing_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(stderr_layer().with_filter(env_filter(default_level)))
        .init();
}

/// Try to initialize tracing, returning an error if already initialized.
pub fn try_init_tracing() -> Result<(), ()> {
    tracing_subscriber::registry()
        .with(stderr_layer().with_filter(env_filter("info")))
        .try_init()
        .map_err(|_| ())
}
