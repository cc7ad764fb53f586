//! OS primitives used by a [`Group`](super::Group)
//!
//! Group-wide signal delivery and process-group lookup sit behind the
//! [`ProcessControl`] trait so that the escalation protocol can be exercised
//! against a recording double as well as the real kernel.

use crate::{CoreError, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{getpgid, getpgrp, Pid};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

/// Process-group primitives
pub trait ProcessControl: Send + Sync + std::fmt::Debug {
    /// Current process group of `pid`
    fn process_group_of(&self, pid: Pid) -> Result<Pid>;

    /// Deliver `signal` to every member of process group `pgid`
    fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<()>;
}

/// The real thing: `getpgid(2)` and `killpg(3)`
#[derive(Copy, Clone, Debug, Default)]
pub struct UnixProcessControl;

impl UnixProcessControl {
    /// Create a new Unix process control
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for UnixProcessControl {
    fn process_group_of(&self, pid: Pid) -> Result<Pid> {
        match getpgid(Some(pid)) {
            Ok(pgid) => Ok(pgid),
            Err(Errno::ESRCH) => Err(CoreError::NoSuchProcess),
            Err(e) => Err(CoreError::IoError(e.into())),
        }
    }

    fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<()> {
        debug!("Sending {} to process group {}", signal, pgid);

        match killpg(pgid, signal) {
            Ok(()) => {
                debug!("Successfully sent {} to process group {}", signal, pgid);
                Ok(())
            }
            Err(Errno::ESRCH) => {
                debug!("Process group {} no longer exists", pgid);
                Err(CoreError::NoSuchProcess)
            }
            Err(e) => {
                error!("Failed to send {} to process group {}: {}", signal, pgid, e);
                Err(CoreError::SignalFailure {
                    pgid: pgid.as_raw(),
                    signal: signal.to_string(),
                    reason: e.desc().to_string(),
                })
            }
        }
    }
}

/// Test double that records signals and can fake lost leadership
///
/// Lookups and deliveries go to [`UnixProcessControl`] unless overridden.
#[derive(Debug, Default)]
pub struct MockProcessControl {
    inner: UnixProcessControl,
    sent: Mutex<Vec<Signal>>,
    swallowed: Mutex<HashSet<Signal>>,
    leadership_lost: AtomicBool,
}

impl MockProcessControl {
    /// Create a mock that behaves like the real control until told otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every lookup as belonging to the caller's own process group
    pub fn lose_leadership(&self) {
        self.leadership_lost.store(true, Ordering::SeqCst);
    }

    /// Record `signal` but never deliver it, as if the group ignored it
    pub fn swallow(&self, signal: Signal) {
        self.swallowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signal);
    }

    /// Signals passed to [`ProcessControl::signal_group`], in order
    pub fn signals(&self) -> Vec<Signal> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessControl for MockProcessControl {
    fn process_group_of(&self, pid: Pid) -> Result<Pid> {
        let pgid = self.inner.process_group_of(pid)?;
        if self.leadership_lost.load(Ordering::SeqCst) {
            return Ok(getpgrp());
        }
        Ok(pgid)
    }

    fn signal_group(&self, pgid: Pid, signal: Signal) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);

        let swallowed = self
            .swallowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&signal);
        if swallowed {
            debug!("Swallowing {} for process group {}", signal, pgid);
            return Ok(());
        }
        self.inner.signal_group(pgid, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::getpid;

    #[test]
    fn test_lookup_of_own_process() {
        let control = UnixProcessControl::new();
        let pgid = control.process_group_of(getpid()).unwrap();
        assert_eq!(pgid, getpgrp());
    }

    #[test]
    fn test_lookup_of_missing_process() {
        let control = UnixProcessControl::new();
        // pid_max on Linux is at most 2^22
        let result = control.process_group_of(Pid::from_raw(i32::MAX));
        assert!(matches!(result, Err(CoreError::NoSuchProcess)));
    }

    #[test]
    fn test_signal_missing_group() {
        let control = UnixProcessControl::new();
        let result = control.signal_group(Pid::from_raw(i32::MAX), Signal::SIGTERM);
        assert!(matches!(result, Err(CoreError::NoSuchProcess)));
    }

    #[test]
    fn test_mock_records_and_swallows() {
        let mock = MockProcessControl::new();
        mock.swallow(Signal::SIGTERM);
        // swallowed, so the bogus group is never contacted
        mock.signal_group(Pid::from_raw(i32::MAX), Signal::SIGTERM)
            .unwrap();
        assert!(mock.signal_group(Pid::from_raw(i32::MAX), Signal::SIGKILL).is_err());
        assert_eq!(mock.signals(), vec![Signal::SIGTERM, Signal::SIGKILL]);
    }

    #[test]
    fn test_mock_lost_leadership() {
        let mock = MockProcessControl::new();
        mock.lose_leadership();
        assert_eq!(mock.process_group_of(getpid()).unwrap(), getpgrp());
    }
}
