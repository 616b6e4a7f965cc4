//! rm — Remove files or directories.
//!
//! A recursive removal is one tree mutation: either the whole subtree goes
//! or nothing changes.

use linsim_types::{OperationError, ResolveError};

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Rm command: remove entries.
pub struct Rm;

impl Command for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("rm", "Remove files or directories")
            .flag(FlagSchema::switch('r', "recursive", "Remove directories and their contents"))
            .flag(FlagSchema::switch('R', "recursive-alias", "Same as -r"))
            .flag(FlagSchema::switch('f', "force", "Ignore nonexistent files, never prompt"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let recursive = args.has("recursive") || args.has("recursive-alias");
        let force = args.has("force");
        if args.positional.is_empty() {
            return if force {
                ExecResult::success("")
            } else {
                ExecResult::failure(1, "rm: missing operand")
            };
        }

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            match ctx.remove(operand, recursive) {
                Ok(()) => {}
                Err(OperationError::Resolve(ResolveError::NotFound { .. })) if force => {}
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!("rm: cannot remove '{operand}': {}", reason(&e)));
                }
            }
        }
        result
    }
}
