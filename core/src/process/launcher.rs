//! Start-up handshake and exit waiter
//!
//! [`background`] hands the OS start to a dedicated task and waits for that
//! task to report either the new pid or the start error. Once the start has
//! been reported the same task waits for the process to exit and publishes
//! the outcome through the group's completion channel. The two reports are
//! sent in that order, so a caller never sees an exit before a start.

use super::command::{CommandState, ExecutionState, ProcessCommand};
use super::completion::{self, CompletionSender, Outcome};
use super::control::{ProcessControl, UnixProcessControl};
use super::group::{Group, GroupStdio};
use crate::{CoreError, Result};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::io;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// What the launcher task reports back after a successful start
struct Started {
    pid: u32,
    stdio: GroupStdio,
}

/// Run `command` in the background as the leader of a new process group
///
/// Returns only once the process is confirmed running. Fails with
/// [`CoreError::AlreadyExecuting`] or [`CoreError::AlreadyExecuted`] if the
/// descriptor has been launched before, with
/// [`CoreError::UnsupportedConfiguration`] if it asks for a conflicting
/// session or group, and with [`CoreError::StartFailure`] if the OS refuses
/// to start it.
pub async fn background(command: &mut ProcessCommand) -> Result<Group> {
    background_with(command, Arc::new(UnixProcessControl::new())).await
}

/// Like [`background`], with the OS primitives supplied by `control`
pub async fn background_with(
    command: &mut ProcessCommand,
    control: Arc<dyn ProcessControl>,
) -> Result<Group> {
    let program = command.program().to_path_buf();

    match command.state() {
        CommandState::Executed => return Err(CoreError::AlreadyExecuted(program)),
        CommandState::Executing => return Err(CoreError::AlreadyExecuting(program)),
        CommandState::NotStarted => {}
    }

    if let Some(reason) = command.group_conflict() {
        return Err(CoreError::UnsupportedConfiguration { program, reason });
    }

    debug!(
        "Starting {:?} {:?} in a new process group",
        program,
        command.get_args().collect::<Vec<_>>()
    );

    let os_command = command.build();
    let state = Arc::clone(&command.state);
    state.set(CommandState::Executing);

    let (start_tx, start_rx) = oneshot::channel();
    let (completion_tx, completion) = completion::channel();
    tokio::spawn(run_process(
        os_command,
        Arc::clone(&state),
        Arc::clone(&control),
        start_tx,
        completion_tx,
    ));

    let started = match start_rx.await {
        Ok(result) => result,
        Err(_) => {
            state.set(CommandState::NotStarted);
            return Err(CoreError::InitializationError(format!(
                "launcher for {:?} ended before reporting its start",
                program
            )));
        }
    };

    match started {
        Ok(Started { pid, stdio }) => {
            debug!("Successfully started {:?} as leader of process group {}", program, pid);
            Ok(Group::new(Pid::from_raw(pid as i32), program, completion, control, stdio))
        }
        Err(source) => {
            error!("Failed to start {:?}: {}", program, source);
            Err(CoreError::StartFailure { program, source })
        }
    }
}

/// Body of the per-process task: start, report, then wait and publish
async fn run_process(
    mut command: Command,
    state: Arc<ExecutionState>,
    control: Arc<dyn ProcessControl>,
    start_tx: oneshot::Sender<io::Result<Started>>,
    completion: CompletionSender,
) {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            state.set(CommandState::NotStarted);
            let _ = start_tx.send(Err(e));
            return;
        }
    };

    let Some(pid) = child.id() else {
        state.set(CommandState::NotStarted);
        let _ = start_tx.send(Err(io::Error::other("spawned child has no pid")));
        return;
    };

    let started = Started {
        pid,
        stdio: GroupStdio {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
        },
    };

    if start_tx.send(Ok(started)).is_err() {
        // Nobody will ever hold a handle to this group.
        warn!("Start of process group {} was abandoned, killing it", pid);
        if let Err(e) = control.signal_group(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            warn!("Failed to kill abandoned process group {}: {}", pid, e);
        }
    }

    let outcome = match child.wait().await {
        Ok(status) => Outcome::from_status(pid, status),
        Err(e) => {
            error!("Failed to wait for process {}: {}", pid, e);
            Outcome::WaitFailed(format!("Failed to wait for process {}: {}", pid, e))
        }
    };
    debug!("Process group leader {} finished: {:?}", pid, outcome);

    state.set(CommandState::Executed);
    completion.deliver(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_background_reports_pid_of_group_leader() {
        let mut cmd = ProcessCommand::new("sleep");
        cmd.arg("5");
        let mut group = background(&mut cmd).await.expect("Failed to start sleep");

        assert!(group.id() > 0);
        assert_eq!(group.pgid().as_raw(), group.id() as i32);
        assert_eq!(cmd.state(), CommandState::Executing);

        group.terminate(Duration::from_secs(1)).await.unwrap();
        assert_eq!(cmd.state(), CommandState::Executed);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_descriptor_reusable() {
        let mut cmd = ProcessCommand::new("/var/run/nonexistant");
        let err = background(&mut cmd).await.unwrap_err();
        assert!(matches!(err, CoreError::StartFailure { .. }));
        assert_eq!(cmd.state(), CommandState::NotStarted);
    }

    #[tokio::test]
    async fn test_abandoned_start_kills_group() {
        use crate::process::MockProcessControl;

        let mock = Arc::new(MockProcessControl::new());
        let mut cmd = ProcessCommand::new("sleep");
        cmd.arg("10");

        // dropped after its first poll, before the launcher task can report
        tokio::select! {
            biased;
            _ = background_with(&mut cmd, mock.clone()) => panic!("start reported on first poll"),
            _ = std::future::ready(()) => {}
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while cmd.state() != CommandState::Executed {
            assert!(std::time::Instant::now() < deadline, "abandoned group kept running");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(mock.signals(), vec![Signal::SIGKILL]);
    }

    #[tokio::test]
    async fn test_conflict_is_reported_before_start() {
        let mut cmd = ProcessCommand::new("true");
        cmd.new_session(true);
        let err = background(&mut cmd).await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConfiguration { .. }));
        assert_eq!(cmd.state(), CommandState::NotStarted);
    }
}
