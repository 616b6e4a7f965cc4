//! true, false — Fixed exit statuses.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// True command: do nothing, successfully.
pub struct True;

impl Command for True {
    fn name(&self) -> &str {
        "true"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("true", "Do nothing, successfully").lenient()
    }

    fn execute(&self, _args: CommandArgs, _ctx: &mut ShellContext) -> ExecResult {
        ExecResult::success("")
    }
}

/// False command: do nothing, unsuccessfully.
pub struct False;

impl Command for False {
    fn name(&self) -> &str {
        "false"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("false", "Do nothing, unsuccessfully").lenient()
    }

    fn execute(&self, _args: CommandArgs, _ctx: &mut ShellContext) -> ExecResult {
        ExecResult::failure(1, "")
    }
}
