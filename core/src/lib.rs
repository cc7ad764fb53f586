//! Core functionality for pgroup
//!
//! Starts a command tree in its own process group, signals the whole group
//! at once, and terminates it with a graceful-then-forceful escalation.

pub mod config;
pub mod error;
#[cfg(unix)]
pub mod process;

#[cfg(test)]
mod error_tests;

// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
#[cfg(unix)]
pub use process::{background, Group, ProcessCommand, Signal};

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
