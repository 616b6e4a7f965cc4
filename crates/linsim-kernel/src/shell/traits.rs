//! The command trait.

use super::args::{CommandArgs, CommandSchema};
use super::context::ShellContext;
use super::result::ExecResult;

/// A built-in command.
///
/// Handlers see nothing but their parsed arguments and the
/// [`ShellContext`], which only exposes the virtual filesystem and the
/// session's own state.
pub trait Command: Send + Sync {
    /// Name the command is invoked by.
    fn name(&self) -> &str;

    /// Flags and description.
    fn schema(&self) -> CommandSchema;

    /// Run the command.
    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult;
}
