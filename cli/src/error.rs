//! CLI error types

use pgroup_core::CoreError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Core(#[from] CoreError),
}

impl CliError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CliError::InvalidArgument(_) => "CLI002",
            CliError::ConfigError(_) => "CLI003",
            CliError::Core(e) => e.code(),
        }
    }
}

/// CLI-specific result type
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CliError::InvalidArgument("test".to_string()).code(), "CLI002");
        assert_eq!(CliError::ConfigError("test".to_string()).code(), "CLI003");
        assert_eq!(CliError::Core(CoreError::NoSuchProcess).code(), "PGRP014");
    }

    #[test]
    fn test_io_errors_arrive_through_core() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: CliError = CoreError::from(io).into();
        assert_eq!(err.code(), "PGRP020");
    }

    #[test]
    fn test_core_errors_display_unchanged() {
        let err: CliError = CoreError::NotLeader(12).into();
        assert_eq!(err.to_string(), "process 12 is not process group leader");
    }
}
