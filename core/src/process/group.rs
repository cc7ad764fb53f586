//! Handle to a running process group
//!
//! ## Termination
//!
//! [`Group::terminate`] escalates in three steps:
//!
//! ```text
//! Running ──SIGTERM──▶ SoftSignaled ──exit within patience──▶ Exited
//!                           │
//!                           └──patience elapsed──SIGKILL──▶ HardSignaled ──▶ Exited
//! ```
//!
//! A group whose leader already exited is never signaled; its stored outcome
//! is returned instead. A failure to signal is returned as-is and never
//! retried with a harder signal.

use super::completion::{Completion, Outcome};
use super::control::ProcessControl;
use crate::{CoreError, Result};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use schema::GroupExit;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Piped stdio handles captured at start
#[derive(Debug, Default)]
pub(crate) struct GroupStdio {
    pub(crate) stdin: Option<ChildStdin>,
    pub(crate) stdout: Option<ChildStdout>,
    pub(crate) stderr: Option<ChildStderr>,
}

/// A command tree running in its own process group
///
/// Created by [`background`](super::background). Dropping a `Group` leaves
/// the processes running; the background waiter still reaps the leader.
#[derive(Debug)]
pub struct Group {
    /// Pid of the leader, which is also the process group id
    pgid: Pid,
    program: PathBuf,
    completion: Completion,
    control: Arc<dyn ProcessControl>,
    stdio: GroupStdio,
}

impl Group {
    pub(crate) fn new(
        pgid: Pid,
        program: PathBuf,
        completion: Completion,
        control: Arc<dyn ProcessControl>,
        stdio: GroupStdio,
    ) -> Self {
        Self {
            pgid,
            program,
            completion,
            control,
            stdio,
        }
    }

    /// Process ID of the group leader
    pub fn id(&self) -> u32 {
        self.pgid.as_raw() as u32
    }

    /// Process group ID (same as the leader's PID)
    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    /// Executable the group leader was started from
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the leader still leads its own process group
    ///
    /// Group ids 0 and 1 are never reported as leaders. A leader that moved
    /// to another group yields `Ok(false)`; a vanished or already reaped one
    /// yields [`CoreError::NoSuchProcess`].
    pub fn is_leader(&self) -> Result<bool> {
        if self.pgid.as_raw() <= 0 || self.completion.peek().is_some() {
            return Err(CoreError::NoSuchProcess);
        }
        let current = self.control.process_group_of(self.pgid)?;

        // 0 and 1 have special meaning to kill(2)
        if current.as_raw() < 2 {
            return Ok(false);
        }
        Ok(current == self.pgid)
    }

    /// Send `signal` to every process in the group
    ///
    /// Refuses with [`CoreError::NotLeader`] when the leader no longer leads
    /// the group, and with [`CoreError::NoSuchProcess`] once the leader has
    /// been reaped, since its id may already belong to someone else.
    pub fn signal(&mut self, signal: Signal) -> Result<()> {
        if self.pgid.as_raw() <= 0 || self.completion.try_take().is_some() {
            return Err(CoreError::NoSuchProcess);
        }
        if !self.is_leader()? {
            warn!(
                "Process {} lost leadership of its process group, not sending {}",
                self.pgid, signal
            );
            return Err(CoreError::NotLeader(self.pgid.as_raw()));
        }
        self.control.signal_group(self.pgid, signal)
    }

    /// Terminate the group: SIGTERM, wait up to `patience`, then SIGKILL
    ///
    /// If the leader had already exited, nothing is signaled and its stored
    /// outcome is returned: `Ok` for exit code 0, [`CoreError::Exited`]
    /// otherwise. If it exits in response to the signals, `Ok` is returned
    /// whatever its exit code; use [`wait`](Self::wait) afterwards to inspect
    /// it. After SIGKILL this waits without a deadline.
    pub async fn terminate(&mut self, patience: Duration) -> Result<()> {
        if let Some(outcome) = self.completion.try_take() {
            debug!("Process group {} already exited, nothing to signal", self.pgid);
            return outcome.to_result();
        }

        match self.signal(Signal::SIGTERM) {
            Ok(()) => {}
            Err(CoreError::NoSuchProcess) => {
                // Reaped between the check above and the lookup.
                debug!("Process group {} exited before SIGTERM", self.pgid);
                return self.completion.recv().await.to_result();
            }
            Err(e) => return Err(e),
        }

        if timeout(patience, self.completion.recv()).await.is_ok() {
            debug!("Process group {} exited gracefully", self.pgid);
            return Ok(());
        }

        warn!(
            "Process group {} did not exit gracefully within {:?}, using SIGKILL",
            self.pgid, patience
        );
        match self.signal(Signal::SIGKILL) {
            Ok(()) | Err(CoreError::NoSuchProcess) => {}
            Err(e) => return Err(e),
        }

        self.completion.recv().await;
        debug!("Process group {} exited after SIGKILL", self.pgid);
        Ok(())
    }

    /// Wait for the leader to exit without signaling anything
    pub async fn wait(&mut self) -> Result<GroupExit> {
        self.completion.recv().await.to_exit()
    }

    /// Exit record if the leader has exited, without blocking
    pub fn try_wait(&mut self) -> Result<Option<GroupExit>> {
        self.completion.try_take().map(Outcome::to_exit).transpose()
    }

    /// Take the leader's stdin, if it was piped
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdio.stdin.take()
    }

    /// Take the leader's stdout, if it was piped
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdio.stdout.take()
    }

    /// Take the leader's stderr, if it was piped
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stdio.stderr.take()
    }
}
