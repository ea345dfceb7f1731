//! Centralized error handling for cryptoscan
//!
//! Provides a unified error type and consistent error handling patterns
//! across the engine. Only [`ScanError::Config`] is fatal to a scan; every
//! other variant is recovered into a finding or a skip record so that a
//! single bad file or matcher never aborts the run.

use thiserror::Error;

/// Central error type for the scan engine
#[derive(Error, Debug)]
pub enum ScanError {
    /// Configuration errors (fatal: surfaced before any scanning starts)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source file could not be parsed into a normalized view
    #[error("Parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    /// A matcher failed on a file
    #[error("Matcher '{rule}' failed on {file}: {reason}")]
    Matcher {
        rule: String,
        file: String,
        reason: String,
    },

    /// Pattern compilation failed
    #[error("Pattern compilation failed: {0}")]
    Pattern(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ScanError::Config("unknown rule id 'bogus'".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown rule id 'bogus'"
        );
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = ScanError::Parse {
            file: "app.js".to_string(),
            reason: "syntax errors in source".to_string(),
        };
        assert!(err.to_string().contains("app.js"));
    }
}
