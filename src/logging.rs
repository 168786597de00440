//! Terminal logging for the CLI and host-side tooling
//!
//! `RUST_LOG` filters (default `info`). `COLUMN_BRIDGE_LOG` picks the
//! format: `pretty` (default), `compact` or `json`. `COLUMN_BRIDGE_LOG_JSON=1`
//! is accepted as a shorthand for `json`.

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        if std::env::var("COLUMN_BRIDGE_LOG_JSON").is_ok_and(|v| v == "1") {
            return LogFormat::Json;
        }
        std::env::var("COLUMN_BRIDGE_LOG")
            .ok()
            .and_then(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }
}

pub fn init_logging() {
    init_logging_with(LogFormat::from_env());
}

/// Install a stderr subscriber; a second call is a no-op
pub fn init_logging_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_names() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" compact "), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
