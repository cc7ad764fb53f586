//! Process group specification and exit records
//!
//! A [`GroupSpec`] describes a command to run as the leader of its own
//! process group, together with the patience granted to it on shutdown.
//! A [`GroupExit`] records how the group leader finished.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Specification of a command to run in its own process group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    /// Unique identifier for this group
    pub id: String,

    /// Executable to run (absolute path or looked up in PATH)
    pub command: String,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables to set for the process
    #[serde(default)]
    pub environment: HashMap<String, String>,

    /// Working directory for the process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Time granted after SIGTERM before the group is killed with SIGKILL
    #[serde(default = "default_graceful_timeout_secs")]
    pub graceful_timeout_secs: u64,
}

impl GroupSpec {
    /// Create a spec for `command` with default settings
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            args: Vec::new(),
            environment: HashMap::new(),
            working_directory: None,
            graceful_timeout_secs: default_graceful_timeout_secs(),
        }
    }

    /// Get the graceful timeout (patience) as a Duration
    pub fn patience(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }
}

const fn default_graceful_timeout_secs() -> u64 {
    10
}

/// Information about how a process group leader exited
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupExit {
    /// Process ID of the group leader (equal to the process group ID)
    pub pid: u32,

    /// Exit code (None if killed by signal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Signal that killed the process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,

    /// Timestamp when the exit was observed, RFC3339
    pub timestamp: String,
}

impl GroupExit {
    /// Check if this represents a successful exit (code 0)
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code a shell would report for this exit (`128 + signal` for signals)
    pub fn shell_code(&self) -> i32 {
        match (self.exit_code, self.signal) {
            (Some(code), _) => code,
            (None, Some(sig)) => 128 + sig,
            (None, None) => 1,
        }
    }

    /// Current time formatted as RFC3339 with second precision
    pub fn current_timestamp() -> String {
        humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
    }
}

impl fmt::Display for GroupExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_code, self.signal) {
            (Some(code), _) => write!(f, "process {} exited with code {}", self.pid, code),
            (None, Some(sig)) => write!(f, "process {} killed by signal {}", self.pid, sig),
            (None, None) => write!(f, "process {} exited with unknown status", self.pid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_from_json() {
        let spec: GroupSpec =
            serde_json::from_str(r#"{"id":"web","command":"npm"}"#).unwrap();
        assert!(spec.args.is_empty());
        assert!(spec.environment.is_empty());
        assert_eq!(spec.working_directory, None);
        assert_eq!(spec.patience(), Duration::from_secs(10));
    }

    #[test]
    fn test_exit_display() {
        let exit = GroupExit {
            pid: 42,
            exit_code: Some(1),
            signal: None,
            timestamp: GroupExit::current_timestamp(),
        };
        assert_eq!(exit.to_string(), "process 42 exited with code 1");
        assert!(!exit.success());
        assert_eq!(exit.shell_code(), 1);

        let killed = GroupExit {
            exit_code: None,
            signal: Some(9),
            ..exit
        };
        assert_eq!(killed.to_string(), "process 42 killed by signal 9");
        assert_eq!(killed.shell_code(), 137);
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = GroupExit::current_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(humantime::parse_rfc3339(&ts).is_ok());
    }
}
