//! mkdir — Make directories.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Mkdir command: create directories.
pub struct Mkdir;

impl Command for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("mkdir", "Create directories").flag(FlagSchema::switch(
            'p',
            "parents",
            "No error if existing, make parent directories as needed",
        ))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "mkdir: missing operand");
        }
        let parents = args.has("parents");

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            if let Err(e) = ctx.create_dir(operand, parents) {
                result.code = 1;
                result.push_err(format!(
                    "mkdir: cannot create directory '{operand}': {}",
                    reason(&e)
                ));
            }
        }
        result
    }
}
