//! JSON log stream on standard output.

use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing::{Subscriber, debug};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::ProbeError;

pub const LEVEL_ENV: &str = "LOG_LEVEL";

/// Parse a severity name, case-insensitive. `warning` is accepted for `warn`.
pub fn parse_level(text: &str) -> Result<LevelFilter, ProbeError> {
    let normalized = text.trim().to_ascii_lowercase();
    let normalized = if normalized == "warning" {
        "warn".to_string()
    } else {
        normalized
    };
    LevelFilter::from_str(&normalized)
        .map_err(|_| ProbeError::Config(format!("invalid log level '{text}'")))
}

/// Flag value first, then `LOG_LEVEL`, then info.
pub fn resolve_level(flag: Option<&str>, env: Option<&str>) -> Result<LevelFilter, ProbeError> {
    match flag.or(env) {
        Some(text) => parse_level(text),
        None => Ok(LevelFilter::INFO),
    }
}

/// One JSON object per line, event fields at the top level.
pub fn subscriber<W>(level: LevelFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .with_max_level(level)
        .with_writer(writer)
        .finish()
}

/// Install the global subscriber writing to stdout. Later calls are no-ops.
pub fn init(level: LevelFilter) {
    let installed =
        tracing::subscriber::set_global_default(subscriber(level, std::io::stdout)).is_ok();
    if installed {
        debug!(configured_level = %level, "logging configured");
    }
}
