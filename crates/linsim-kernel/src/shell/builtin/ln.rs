//! ln — Make links between files.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Ln command: create hard or symbolic links.
pub struct Ln;

impl Command for Ln {
    fn name(&self) -> &str {
        "ln"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("ln", "Make links between files")
            .flag(FlagSchema::switch('s', "symbolic", "Make symbolic links instead of hard links"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let symbolic = args.has("symbolic");
        let (target, link) = match args.positional.as_slice() {
            [] => return ExecResult::failure(1, "ln: missing file operand"),
            [target] => (target.clone(), ".".to_string()),
            [target, link] => (target.clone(), link.clone()),
            [_, _, extra, ..] => return ExecResult::failure(1, format!("ln: extra operand '{extra}'")),
        };

        let made = if symbolic {
            ctx.symlink(&target, &link)
        } else {
            ctx.hard_link(&target, &link)
        };
        match made {
            Ok(()) => ExecResult::success(""),
            Err(e) if symbolic => ExecResult::failure(
                1,
                format!("ln: failed to create symbolic link '{link}': {}", reason(&e)),
            ),
            Err(e) => ExecResult::failure(
                1,
                format!("ln: failed to create hard link '{link}' => '{target}': {}", reason(&e)),
            ),
        }
    }
}
