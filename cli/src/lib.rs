//! Supervised runs for the `pgroup` command line
//!
//! A run starts one command in its own process group, then waits for it to
//! exit on its own, for a shutdown request, or for an optional deadline.
//! The last two terminate the whole group with the configured patience.

pub mod error;

pub use error::{CliError, Result};

use pgroup_core::config::load_groups_from_toml_path;
use pgroup_core::process::{background, ProcessCommand};
use schema::{GroupExit, GroupSpec};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// How a supervised run is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Time granted after SIGTERM before SIGKILL
    pub patience: Duration,
    /// Terminate the group once this much time has passed
    pub deadline: Option<Duration>,
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// The group leader exited on its own
    Exited(GroupExit),
    /// The group was terminated after a shutdown request
    Interrupted(GroupExit),
    /// The group was terminated because the deadline passed
    DeadlineReached(GroupExit),
}

impl RunEnd {
    /// Exit record of the group leader
    pub fn exit(&self) -> &GroupExit {
        match self {
            RunEnd::Exited(e) | RunEnd::Interrupted(e) | RunEnd::DeadlineReached(e) => e,
        }
    }
}

/// Build the group spec for a run, from a config file entry or a command line
///
/// `patience_secs` overrides the configured graceful timeout.
pub fn resolve_spec(
    config: Option<&Path>,
    id: Option<&str>,
    command: &[String],
    patience_secs: Option<u64>,
) -> Result<GroupSpec> {
    let mut spec = match (config, id) {
        (Some(path), Some(id)) => {
            let file = load_groups_from_toml_path(path)?;
            file.get(id).cloned().ok_or_else(|| {
                CliError::ConfigError(format!("group '{}' not found in {:?}", id, path))
            })?
        }
        (Some(_), None) => {
            return Err(CliError::InvalidArgument(
                "--config requires --id".to_string(),
            ))
        }
        (None, _) => {
            let (program, args) = command.split_first().ok_or_else(|| {
                CliError::InvalidArgument("no command given".to_string())
            })?;
            let mut spec = GroupSpec::new(id.unwrap_or("cli"), program.clone());
            spec.args = args.to_vec();
            spec
        }
    };

    if let Some(secs) = patience_secs {
        spec.graceful_timeout_secs = secs;
    }
    Ok(spec)
}

/// Run `command` until it exits, `shutdown` resolves, or the deadline passes
pub async fn run_group<F>(
    command: &mut ProcessCommand,
    options: RunOptions,
    shutdown: F,
) -> Result<RunEnd>
where
    F: Future<Output = ()>,
{
    let mut group = background(command).await?;
    info!(
        "Started {:?} as process group {}",
        group.program(),
        group.id()
    );

    let deadline = async {
        match options.deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    let interrupted = tokio::select! {
        exit = group.wait() => return Ok(RunEnd::Exited(exit?)),
        _ = shutdown => true,
        _ = deadline => false,
    };

    if interrupted {
        info!("Shutdown requested, terminating process group {}", group.id());
    } else {
        warn!("Deadline reached, terminating process group {}", group.id());
    }

    if let Err(e) = group.terminate(options.patience).await {
        // an unsuccessful exit that raced the request is still an exit
        if e.exit().is_none() {
            return Err(e.into());
        }
    }
    let exit = group.wait().await?;

    Ok(if interrupted {
        RunEnd::Interrupted(exit)
    } else {
        RunEnd::DeadlineReached(exit)
    })
}
