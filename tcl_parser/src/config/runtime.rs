// RUNTIME PREFERENCES (User Experience)

use crate::logging::events::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Read a boolean-ish preference from the environment, falling back to `default`
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to require a recognized script extension (.tcl, .eagle, .test)
    pub require_script_extension: bool,

    /// Whether to log an info event for files above the large-file threshold
    pub log_large_files: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_script_extension: env_flag(env_vars::REQUIRE_SCRIPT_EXTENSION, false),
            log_large_files: env_flag(env_vars::LOG_LARGE_FILES, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserPreferences {
    /// Default for the `strict` script option when the caller does not choose
    pub strict: bool,

    /// Default for the `syntax` script option when the caller does not choose
    pub syntax: bool,

    /// Whether `#` starts a comment at command position
    pub allow_comments: bool,
}

impl Default for ParserPreferences {
    fn default() -> Self {
        Self {
            strict: env_flag(env_vars::PARSER_STRICT, false),
            syntax: env_flag(env_vars::PARSER_SYNTAX, false),
            allow_comments: env_flag(env_vars::PARSER_ALLOW_COMMENTS, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level that reaches the configured logger
    pub min_log_level: LogLevel,

    /// Whether to attach the current source name to events
    pub include_source_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
            include_source_context: env_flag(env_vars::LOGGING_INCLUDE_SOURCE_CONTEXT, true),
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub parser: ParserPreferences,
    pub logging: LoggingPreferences,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("Cannot read configuration '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Invalid configuration '{path}': {message}")]
    Parse { path: String, message: String },
}

impl RuntimeConfig {
    /// Parse preferences from TOML text; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load preferences from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuntimeConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RuntimeConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&text).map_err(|e| RuntimeConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const REQUIRE_SCRIPT_EXTENSION: &str = "TCL_REQUIRE_SCRIPT_EXTENSION";
    pub const LOG_LARGE_FILES: &str = "TCL_LOG_LARGE_FILES";

    // Parser
    pub const PARSER_STRICT: &str = "TCL_STRICT";
    pub const PARSER_SYNTAX: &str = "TCL_SYNTAX";
    pub const PARSER_ALLOW_COMMENTS: &str = "TCL_ALLOW_COMMENTS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "TCL_LOG_FORMAT_JSON";
    pub const LOGGING_ENABLE_CONSOLE: &str = "TCL_LOG_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "TCL_LOG_LEVEL";
    pub const LOGGING_INCLUDE_SOURCE_CONTEXT: &str = "TCL_LOG_SOURCE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("2"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_toml_overrides_only_named_keys() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [parser]
            strict = true

            [logging]
            min_log_level = "Debug"
            "#,
        )
        .unwrap();

        assert!(config.parser.strict);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RuntimeConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(RuntimeConfigError::Read { .. })));
    }
}
