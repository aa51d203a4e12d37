//! Tracing Subscriber Initialization
//!
//! Installs the global subscriber. `RUST_LOG` wins over the configured
//! level; `LIGHTHOUSE_LOG_FORMAT=pretty` switches from JSON lines to the
//! human-readable formatter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;
use crate::constants::LOG_FORMAT_ENV;
use crate::error::{ApiError, ApiResult};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Read `LIGHTHOUSE_LOG_FORMAT`; anything but `pretty` means JSON.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Filter directives for a configured level.
///
/// Our own crates log at the configured level; tower_http request traces
/// follow it too.
pub fn default_directives(level: LogLevel) -> String {
    let level = level.as_filter();
    format!("lighthouse_api={level},lighthouse_core={level},tower_http={level},{level}")
}

fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Initialize the tracing subscriber.
///
/// Call once at startup, before anything logs. A second call fails.
pub fn init_logging(level: LogLevel) -> ApiResult<()> {
    let format = LogFormat::from_env();
    let registry = tracing_subscriber::registry().with(build_filter(level));

    let result = match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(level = level.as_filter(), log_format = ?format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_log_format_from_env() {
        {
            let _guard = EnvVarGuard::set(LOG_FORMAT_ENV, Some("PRETTY"));
            assert_eq!(LogFormat::from_env(), LogFormat::Pretty);
        }
        {
            let _guard = EnvVarGuard::set(LOG_FORMAT_ENV, None);
            assert_eq!(LogFormat::from_env(), LogFormat::Json);
        }
    }

    #[test]
    fn test_warning_maps_to_warn_directive() {
        let directives = default_directives(LogLevel::Warning);
        assert!(directives.starts_with("lighthouse_api=warn,"));
        assert!(directives.ends_with(",warn"));
    }
}
