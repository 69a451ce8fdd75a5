//! Logging infrastructure for credport
//!
//! Thin configuration layer over `tracing-subscriber`. The library only emits
//! events; installing a subscriber is left to the embedding application via
//! [`init_logging`] or [`configure_logging`].

use std::sync::{Mutex, OnceLock};

use regex::Regex;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global logging configuration
static LOGGING_CONFIG: OnceLock<Mutex<LoggingConfig>> = OnceLock::new();

static SENSITIVE_PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

pub type LoggingResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Logging configuration structure
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Whether debug logging is enabled
    pub debug_enabled: bool,
    /// Log level filter
    pub level: Level,
    /// Whether to include thread information
    pub include_thread_info: bool,
    /// Target of this crate's events in the filter directive
    pub target_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug_enabled: false,
            level: Level::INFO,
            include_thread_info: false,
            target_prefix: "credport_shared".to_string(),
        }
    }
}

impl LoggingConfig {
    fn directive(&self) -> String {
        let level = if self.debug_enabled {
            Level::DEBUG
        } else {
            self.level
        };
        format!("{}={}", self.target_prefix, level.as_str().to_lowercase())
    }
}

fn global_config() -> &'static Mutex<LoggingConfig> {
    LOGGING_CONFIG.get_or_init(|| Mutex::new(LoggingConfig::default()))
}

/// Initialize the logging system with the default configuration
pub fn init_logging() -> LoggingResult {
    configure_logging(LoggingConfig::default())
}

/// Store a new configuration and try to install a matching subscriber.
/// An already installed subscriber is kept.
pub fn configure_logging(config: LoggingConfig) -> LoggingResult {
    {
        let mut stored = global_config()
            .lock()
            .map_err(|_| "Failed to acquire logging config lock")?;
        *stored = config.clone();
    }

    setup_subscriber(&config);
    tracing::debug!(
        "Logging configuration updated: debug_enabled={}",
        config.debug_enabled
    );
    Ok(())
}

/// Enable or disable debug logging
pub fn set_debug_enabled(enabled: bool) -> LoggingResult {
    let config = {
        let mut stored = global_config()
            .lock()
            .map_err(|_| "Failed to acquire logging config lock")?;
        stored.debug_enabled = enabled;
        stored.level = if enabled { Level::DEBUG } else { Level::INFO };
        stored.clone()
    };

    setup_subscriber(&config);
    Ok(())
}

/// Check if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    global_config()
        .lock()
        .map(|config| config.debug_enabled)
        .unwrap_or(false)
}

/// Get current logging configuration
pub fn get_config() -> LoggingConfig {
    global_config()
        .lock()
        .map(|config| config.clone())
        .unwrap_or_default()
}

fn setup_subscriber(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .try_init()
        .is_ok();

    if !installed {
        tracing::trace!("Tracing subscriber already installed");
    }
}

fn sensitive_patterns() -> &'static [(Regex, &'static str)] {
    SENSITIVE_PATTERNS.get_or_init(|| {
        [
            (r"(?i)password[=:\s]+[^\s,]+", "password=***"),
            (r"(?i)secret(_clear)?[=:\s]+[^\s,]+", "secret=***"),
            (r"(?i)keyfile[=:\s]+[^\s,]+", "keyfile=***"),
            (
                r"(?s)-----BEGIN PGP MESSAGE-----.*?-----END PGP MESSAGE-----",
                "[armored message]",
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

/// Mask credentials and armored envelopes before a message is logged
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in sensitive_patterns() {
        sanitized = re.replace_all(&sanitized, *replacement).into_owned();
    }
    sanitized
}

/// Debug event, emitted only while debug logging is enabled
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Info event with credentials masked
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ::tracing::info!("{}", $crate::logging::sanitize_log_message(&format!($($arg)*)));
    };
}

/// Warning event with credentials masked
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ::tracing::warn!("{}", $crate::logging::sanitize_log_message(&format!($($arg)*)));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.debug_enabled);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.directive(), "credport_shared=info");
    }

    #[test]
    fn test_debug_directive() {
        let config = LoggingConfig {
            debug_enabled: true,
            ..Default::default()
        };
        assert_eq!(config.directive(), "credport_shared=debug");
    }

    #[test]
    fn test_sanitize_credentials() {
        let sanitized = sanitize_log_message("login password=hunter2 keyfile: AAAA secret_clear=p@ss");
        assert!(!sanitized.contains("hunter2"));
        assert!(!sanitized.contains("AAAA"));
        assert!(!sanitized.contains("p@ss"));
        assert!(sanitized.starts_with("login password=***"));
    }

    #[test]
    fn test_sanitize_armored_message() {
        let message = "data: -----BEGIN PGP MESSAGE-----\nwcFMA\n-----END PGP MESSAGE----- done";
        assert_eq!(sanitize_log_message(message), "data: [armored message] done");
    }

    #[test]
    fn test_plain_messages_are_untouched() {
        assert_eq!(
            sanitize_log_message("Exported 3 resources to csv-kdbx"),
            "Exported 3 resources to csv-kdbx"
        );
    }

    #[test]
    fn test_init_is_repeatable() {
        init_logging().unwrap();
        init_logging().unwrap();
        assert!(!get_config().target_prefix.is_empty());
    }
}
