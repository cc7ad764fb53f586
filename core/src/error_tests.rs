#[cfg(test)]
mod tests {
    use crate::error::*;
    use schema::GroupExit;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_core_error_display() {
        let err = CoreError::ValidationError("test validation".to_string());
        assert_eq!(err.to_string(), "Validation error: test validation");

        let err = CoreError::ConfigurationError("bad config".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad config");

        let err = CoreError::NotLeader(4242);
        assert_eq!(err.to_string(), "process 4242 is not process group leader");

        let err = CoreError::UnsupportedConfiguration {
            program: PathBuf::from("true"),
            reason: "a new session cannot be combined with a new process group",
        };
        assert_eq!(
            err.to_string(),
            r#"process: unsupported configuration for "true": a new session cannot be combined with a new process group"#
        );
    }

    #[test]
    fn test_start_failure_keeps_os_error_as_source() {
        let err = CoreError::StartFailure {
            program: PathBuf::from("/var/run/nonexistant"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let source = err.source().expect("start failure carries its io error");
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().starts_with(r#"process: failed to start "/var/run/nonexistant": "#));
        assert_eq!(err.code(), "PGRP013");
    }

    #[test]
    fn test_exited_carries_exit_record() {
        let exit = GroupExit {
            pid: 77,
            exit_code: Some(1),
            signal: None,
            timestamp: GroupExit::current_timestamp(),
        };
        let err = CoreError::Exited(exit.clone());
        assert_eq!(err.exit(), Some(&exit));
        assert_eq!(err.to_string(), "process: process 77 exited with code 1");
        assert!(CoreError::NoSuchProcess.exit().is_none());
    }

    #[test]
    fn test_core_error_from_std_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let core_err: CoreError = io_err.into();

        if let CoreError::IoError(_) = core_err {
            // Expected variant
        } else {
            panic!("Expected CoreError::IoError variant");
        }
    }

    #[test]
    fn test_core_error_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let core_err: CoreError = serde_err.into();
        assert_eq!(core_err.code(), "PGRP021");
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = CoreError::ValidationError("test".to_string());
        let _: &dyn Error = &err;
        assert!(err.source().is_none());
    }
}
