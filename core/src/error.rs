//! Core error types and utilities

use schema::GroupExit;
use std::path::PathBuf;
use thiserror::Error;

/// Core-specific error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// The command descriptor already has a live process
    #[error("process: command already executing: {0:?}")]
    AlreadyExecuting(PathBuf),

    /// The command descriptor already ran to completion
    #[error("process: command already executed: {0:?}")]
    AlreadyExecuted(PathBuf),

    /// The command asks for a session/group setup that conflicts with creating a new group
    #[error("process: unsupported configuration for {program:?}: {reason}")]
    UnsupportedConfiguration {
        program: PathBuf,
        reason: &'static str,
    },

    /// The OS refused to start the command
    #[error("process: failed to start {program:?}: {source}")]
    StartFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process group handle is invalid or the group no longer exists
    #[error("process: no such process")]
    NoSuchProcess,

    /// The group leader no longer leads its own process group
    #[error("process {0} is not process group leader")]
    NotLeader(i32),

    /// The OS rejected signal delivery to the group
    #[error("process: failed to send {signal} to process group {pgid}: {reason}")]
    SignalFailure {
        pgid: i32,
        signal: String,
        reason: String,
    },

    /// The group leader had already exited unsuccessfully
    #[error("process: {0}")]
    Exited(GroupExit),

    /// Waiting on the group leader failed
    #[error("Process wait error: {0}")]
    ProcessWait(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Other(String),
}

impl CoreError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ConfigurationError(_) => "PGRP001",
            CoreError::ValidationError(_) => "PGRP002",
            CoreError::InitializationError(_) => "PGRP003",
            CoreError::AlreadyExecuting(_) => "PGRP010",
            CoreError::AlreadyExecuted(_) => "PGRP011",
            CoreError::UnsupportedConfiguration { .. } => "PGRP012",
            CoreError::StartFailure { .. } => "PGRP013",
            CoreError::NoSuchProcess => "PGRP014",
            CoreError::NotLeader(_) => "PGRP015",
            CoreError::SignalFailure { .. } => "PGRP016",
            CoreError::Exited(_) => "PGRP017",
            CoreError::ProcessWait(_) => "PGRP018",
            CoreError::IoError(_) => "PGRP020",
            CoreError::SerializationError(_) => "PGRP021",
            CoreError::Other(_) => "PGRP999",
        }
    }

    /// Exit record carried by [`CoreError::Exited`], if any
    pub fn exit(&self) -> Option<&GroupExit> {
        match self {
            CoreError::Exited(exit) => Some(exit),
            _ => None,
        }
    }
}

/// Core-specific result type
pub type Result<T> = std::result::Result<T, CoreError>;

// Convenience implementations
impl From<&str> for CoreError {
    fn from(s: &str) -> Self {
        CoreError::Other(s.to_string())
    }
}

impl From<String> for CoreError {
    fn from(s: String) -> Self {
        CoreError::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::ConfigurationError("test".to_string()).code(), "PGRP001");
        assert_eq!(CoreError::ValidationError("test".to_string()).code(), "PGRP002");
        assert_eq!(CoreError::NoSuchProcess.code(), "PGRP014");
        assert_eq!(CoreError::NotLeader(42).code(), "PGRP015");
        assert_eq!(CoreError::Other("test".to_string()).code(), "PGRP999");
    }

    #[test]
    fn test_precondition_messages_name_the_program() {
        let err = CoreError::AlreadyExecuting(PathBuf::from("/bin/true"));
        assert_eq!(err.to_string(), r#"process: command already executing: "/bin/true""#);

        let err = CoreError::AlreadyExecuted(PathBuf::from("/bin/true"));
        assert_eq!(err.to_string(), r#"process: command already executed: "/bin/true""#);
    }

    #[test]
    fn test_from_implementations() {
        let error: CoreError = "test error".into();
        assert_eq!(error.to_string(), "Generic error: test error");

        let error: CoreError = "test error".to_string().into();
        assert_eq!(error.to_string(), "Generic error: test error");
    }
}
