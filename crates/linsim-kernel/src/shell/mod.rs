//! The simulated shell: command table, per-session context, dispatcher and
//! the interactive session above it.

mod accounts;
mod args;
pub mod builtin;
mod context;
mod dispatch;
mod host;
pub mod line;
mod registry;
mod result;
mod session;
mod traits;

pub use accounts::{Accounts, GroupRecord, UserRecord};
pub use args::{ArgsError, ArgsErrorKind, CommandArgs, CommandSchema, FlagSchema};
pub use context::ShellContext;
pub use dispatch::{DispatchError, Dispatcher};
pub use host::HostInfo;
pub use registry::CommandTable;
pub use result::ExecResult;
pub use session::{Outcome, SessionState, ShellSession};
pub use traits::Command;
