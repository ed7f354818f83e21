//! Logging setup.
//!
//! Logs go to stderr so that answers and `--json` output on stdout stay
//! machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

const DEFAULT_FILTER: &str = "info,lance=warn,lancedb=warn";

/// Install the global tracing subscriber.
///
/// `log_level` accepts anything `EnvFilter` understands ("debug",
/// "pdfchat_knowledge=trace"). Without it `RUST_LOG` is consulted, then a
/// default that keeps LanceDB's internals quiet.
///
/// ```no_run
/// use pdfchat_core::logging::init_logging;
///
/// init_logging(Some("debug"), true).expect("logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let env_filter = build_filter(log_level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let from_env = std::env::var("RUST_LOG").ok();
    let directives = log_level
        .map(str::to_string)
        .or(from_env)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());

    EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

fn supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}
