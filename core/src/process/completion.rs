//! One-shot delivery of a process group leader's final outcome
//!
//! The waiter task owns a [`CompletionSender`] and publishes exactly one
//! [`Outcome`]. The [`Group`](super::Group) owns the matching [`Completion`],
//! which reads the channel at most once and caches the value for every later
//! observation, so no call path can block on an already consumed channel.

use crate::{CoreError, Result};
use schema::GroupExit;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::debug;

/// Final result of waiting on a group leader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The leader exited (normally or through a signal)
    Exited(GroupExit),
    /// Waiting on the leader failed
    WaitFailed(String),
}

impl Outcome {
    pub(crate) fn from_status(pid: u32, status: ExitStatus) -> Self {
        Outcome::Exited(GroupExit {
            pid,
            exit_code: status.code(),
            signal: status.signal(),
            timestamp: GroupExit::current_timestamp(),
        })
    }

    fn lost() -> Self {
        Outcome::WaitFailed("exit waiter ended without reporting an outcome".to_string())
    }

    /// The exit record, or a `ProcessWait` error if waiting failed
    pub fn to_exit(&self) -> Result<GroupExit> {
        match self {
            Outcome::Exited(exit) => Ok(exit.clone()),
            Outcome::WaitFailed(reason) => Err(CoreError::ProcessWait(reason.clone())),
        }
    }

    /// Ok for a clean exit, otherwise the stored failure as an error
    pub fn to_result(&self) -> Result<()> {
        match self {
            Outcome::Exited(exit) if exit.success() => Ok(()),
            Outcome::Exited(exit) => Err(CoreError::Exited(exit.clone())),
            Outcome::WaitFailed(reason) => Err(CoreError::ProcessWait(reason.clone())),
        }
    }
}

/// Create a linked sender/receiver pair
pub(crate) fn channel() -> (CompletionSender, Completion) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSender(tx),
        Completion {
            rx: Some(rx),
            value: None,
        },
    )
}

/// Writing half, consumed by its single delivery
#[derive(Debug)]
pub(crate) struct CompletionSender(oneshot::Sender<Outcome>);

impl CompletionSender {
    pub(crate) fn deliver(self, outcome: Outcome) {
        if self.0.send(outcome).is_err() {
            debug!("Group handle dropped before the exit outcome was observed");
        }
    }
}

/// Reading half, owned by a [`Group`](super::Group)
#[derive(Debug)]
pub struct Completion {
    rx: Option<oneshot::Receiver<Outcome>>,
    value: Option<Outcome>,
}

impl Completion {
    /// Whether the outcome has been received and cached
    pub fn is_delivered(&self) -> bool {
        self.value.is_some()
    }

    /// The cached outcome, without touching the channel
    pub fn peek(&self) -> Option<&Outcome> {
        self.value.as_ref()
    }

    /// Non-blocking read; `None` while the leader is still running
    pub fn try_take(&mut self) -> Option<&Outcome> {
        let outcome = match self.value.take() {
            Some(outcome) => outcome,
            None => match self.rx.as_mut()?.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => Outcome::lost(),
            },
        };
        Some(self.store(outcome))
    }

    /// Wait for the outcome.
    ///
    /// Cancel safe: dropping the future before it resolves leaves the
    /// channel untouched for the next read.
    pub async fn recv(&mut self) -> &Outcome {
        let outcome = match self.value.take() {
            Some(outcome) => outcome,
            None => match self.rx.as_mut() {
                Some(rx) => rx.await.unwrap_or_else(|_| Outcome::lost()),
                None => Outcome::lost(),
            },
        };
        self.store(outcome)
    }

    fn store(&mut self, outcome: Outcome) -> &Outcome {
        self.rx = None;
        self.value.insert(outcome)
    }
}
