//! pwd — Print working directory.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Pwd command: print the working directory.
pub struct Pwd;

impl Command for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("pwd", "Print the name of the current working directory")
    }

    fn execute(&self, _args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.cwd()))
    }
}
