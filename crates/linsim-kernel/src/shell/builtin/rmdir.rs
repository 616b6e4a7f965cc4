//! rmdir — Remove empty directories.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Rmdir command: remove empty directories.
pub struct Rmdir;

impl Command for Rmdir {
    fn name(&self) -> &str {
        "rmdir"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("rmdir", "Remove empty directories")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "rmdir: missing operand");
        }

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            if let Err(e) = ctx.remove_dir(operand) {
                result.code = 1;
                result.push_err(format!("rmdir: failed to remove '{operand}': {}", reason(&e)));
            }
        }
        result
    }
}
