//! Process group management
//!
//! Runs a command that may fork further commands (a shell script, a build
//! tool) as the leader of its own process group, so the whole tree can be
//! signaled and terminated as one unit.
//!
//! ## Platform Support
//!
//! Unix only. Platforms without process groups are not supported.
//!
//! ## Components
//!
//! - [`ProcessCommand`]: descriptor of the program to run, tracks whether it ran
//! - [`background`]: start-up handshake, returns once the process is running
//! - [`Group`]: handle with [`Group::signal`], [`Group::is_leader`] and
//!   [`Group::terminate`]
//! - [`Completion`]: one-shot channel carrying the leader's final [`Outcome`]
//! - [`ProcessControl`]: `getpgid`/`killpg` seam, with a recording mock

pub mod command;
pub mod completion;
pub mod control;
pub mod group;
pub mod launcher;

pub use command::{CommandState, ProcessCommand, StdioMode};
pub use completion::{Completion, Outcome};
pub use control::{MockProcessControl, ProcessControl, UnixProcessControl};
pub use group::Group;
pub use launcher::{background, background_with};

pub use nix::sys::signal::Signal;
