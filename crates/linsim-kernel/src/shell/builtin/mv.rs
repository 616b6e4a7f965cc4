//! mv — Move (rename) files.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Mv command: move entries and their subtrees.
pub struct Mv;

impl Command for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("mv", "Move (rename) files")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let (sources, dest) = match args.positional.as_slice() {
            [] => return ExecResult::failure(1, "mv: missing file operand"),
            [only] => {
                return ExecResult::failure(
                    1,
                    format!("mv: missing destination file operand after '{only}'"),
                );
            }
            [sources @ .., dest] => (sources, dest),
        };

        if sources.len() > 1 {
            match ctx.entry(dest, true) {
                Ok(entry) if entry.is_dir() => {}
                _ => return ExecResult::failure(1, format!("mv: target '{dest}' is not a directory")),
            }
        }

        let mut result = ExecResult::success("");
        for source in sources {
            if let Err(e) = ctx.rename(source, dest) {
                result.code = 1;
                result.push_err(format!("mv: cannot move '{source}' to '{dest}': {}", reason(&e)));
            }
        }
        result
    }
}
