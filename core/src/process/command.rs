//! Command descriptors for process groups
//!
//! [`ProcessCommand`] is a reusable description of a program to run. Unlike
//! `std::process::Command` it tracks whether it has been launched, so a
//! descriptor can only ever back one process group at a time and refuses to
//! run again once its process has been reaped.

use schema::GroupSpec;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a [`ProcessCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandState {
    /// Never launched, or the last launch failed to start
    NotStarted,
    /// A process started from this descriptor is still running
    Executing,
    /// The process started from this descriptor has exited and been reaped
    Executed,
}

/// Shared between a descriptor and the task waiting on its process
#[derive(Debug, Default)]
pub(crate) struct ExecutionState(AtomicU8);

impl ExecutionState {
    const NOT_STARTED: u8 = 0;
    const EXECUTING: u8 = 1;
    const EXECUTED: u8 = 2;

    pub(crate) fn get(&self) -> CommandState {
        match self.0.load(Ordering::Acquire) {
            Self::NOT_STARTED => CommandState::NotStarted,
            Self::EXECUTING => CommandState::Executing,
            _ => CommandState::Executed,
        }
    }

    pub(crate) fn set(&self, state: CommandState) {
        let raw = match state {
            CommandState::NotStarted => Self::NOT_STARTED,
            CommandState::Executing => Self::EXECUTING,
            CommandState::Executed => Self::EXECUTED,
        };
        self.0.store(raw, Ordering::Release);
    }
}

/// How a standard stream of the child is connected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
    /// Share the parent's stream
    #[default]
    Inherit,
    /// Connect to /dev/null
    Null,
    /// Create a pipe, retrievable from the [`Group`](super::Group)
    Piped,
}

impl From<StdioMode> for Stdio {
    fn from(mode: StdioMode) -> Self {
        match mode {
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Null => Stdio::null(),
            StdioMode::Piped => Stdio::piped(),
        }
    }
}

#[derive(Debug, Clone)]
enum EnvChange {
    Set(OsString, OsString),
    Remove(OsString),
}

/// Description of a program to run as the leader of a new process group
///
/// ```rust,no_run
/// use pgroup_core::process::{background, ProcessCommand, StdioMode};
/// use std::time::Duration;
///
/// # async fn demo() -> pgroup_core::Result<()> {
/// let mut cmd = ProcessCommand::new("sh");
/// cmd.args(["-c", "sleep 30 & sleep 30"]).stdout(StdioMode::Null);
///
/// let mut group = background(&mut cmd).await?;
/// group.terminate(Duration::from_secs(2)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProcessCommand {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<EnvChange>,
    env_clear: bool,
    current_dir: Option<PathBuf>,
    stdin: StdioMode,
    stdout: StdioMode,
    stderr: StdioMode,
    new_session: bool,
    process_group: Option<i32>,
    pub(crate) state: Arc<ExecutionState>,
}

impl ProcessCommand {
    /// Create a descriptor for `program` with no arguments and inherited stdio
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: PathBuf::from(program.as_ref()),
            args: Vec::new(),
            env: Vec::new(),
            env_clear: false,
            current_dir: None,
            stdin: StdioMode::default(),
            stdout: StdioMode::default(),
            stderr: StdioMode::default(),
            new_session: false,
            process_group: None,
            state: Arc::default(),
        }
    }

    /// Add an argument
    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add several arguments
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable for the child
    pub fn env(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> &mut Self {
        self.env.push(EnvChange::Set(
            key.as_ref().to_os_string(),
            value.as_ref().to_os_string(),
        ));
        self
    }

    /// Set several environment variables for the child
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (k, v) in vars {
            self.env(k, v);
        }
        self
    }

    /// Remove an inherited environment variable
    pub fn env_remove(&mut self, key: impl AsRef<OsStr>) -> &mut Self {
        self.env.push(EnvChange::Remove(key.as_ref().to_os_string()));
        self
    }

    /// Start from an empty environment
    pub fn env_clear(&mut self) -> &mut Self {
        self.env_clear = true;
        self.env.clear();
        self
    }

    /// Set the working directory of the child
    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Configure the child's stdin
    pub fn stdin(&mut self, mode: StdioMode) -> &mut Self {
        self.stdin = mode;
        self
    }

    /// Configure the child's stdout
    pub fn stdout(&mut self, mode: StdioMode) -> &mut Self {
        self.stdout = mode;
        self
    }

    /// Configure the child's stderr
    pub fn stderr(&mut self, mode: StdioMode) -> &mut Self {
        self.stderr = mode;
        self
    }

    /// Ask for the child to call `setsid()`.
    ///
    /// A process cannot both create a new session and a new process group
    /// from one image, so launching a descriptor with this set fails with
    /// [`CoreError::UnsupportedConfiguration`](crate::CoreError::UnsupportedConfiguration).
    pub fn new_session(&mut self, enabled: bool) -> &mut Self {
        self.new_session = enabled;
        self
    }

    /// Ask for the child to join process group `pgid`.
    ///
    /// Conflicts with group creation in the same way as [`new_session`](Self::new_session).
    pub fn process_group(&mut self, pgid: i32) -> &mut Self {
        self.process_group = Some(pgid);
        self
    }

    /// The executable this descriptor runs
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the executable
    pub fn get_args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    /// Current lifecycle state
    pub fn state(&self) -> CommandState {
        self.state.get()
    }

    /// Reason this descriptor cannot lead a fresh process group, if any
    pub(crate) fn group_conflict(&self) -> Option<&'static str> {
        if self.new_session {
            Some("a new session cannot be combined with a new process group")
        } else if self.process_group.is_some() {
            Some("an explicit process group cannot be combined with a new process group")
        } else {
            None
        }
    }

    /// Build the OS command; the child becomes leader of a new process group
    pub(crate) fn build(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if self.env_clear {
            cmd.env_clear();
        }
        for change in &self.env {
            match change {
                EnvChange::Set(k, v) => cmd.env(k, v),
                EnvChange::Remove(k) => cmd.env_remove(k),
            };
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(self.stdin)
            .stdout(self.stdout)
            .stderr(self.stderr)
            .kill_on_drop(false)
            .process_group(0);
        cmd
    }
}

impl From<&GroupSpec> for ProcessCommand {
    fn from(spec: &GroupSpec) -> Self {
        let mut cmd = ProcessCommand::new(&spec.command);
        cmd.args(&spec.args).envs(&spec.environment);
        if let Some(dir) = &spec.working_directory {
            cmd.current_dir(dir);
        }
        cmd
    }
}
