//! readlink — Print resolved symbolic links.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Readlink command: print a link's raw target, or with `-f` the
/// canonical path.
pub struct Readlink;

impl Command for Readlink {
    fn name(&self) -> &str {
        "readlink"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("readlink", "Print resolved symbolic links or canonical file names")
            .flag(FlagSchema::switch('f', "canonicalize", "Follow every symlink in the path"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "readlink: missing operand");
        }
        let canonical = args.has("canonicalize");

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            let line = if canonical {
                ctx.resolve_follow(operand).ok()
            } else {
                ctx.entry(operand, false).ok().and_then(|e| e.link_target)
            };
            match line {
                Some(line) => {
                    result.out.push_str(&line);
                    result.out.push('\n');
                }
                None => result.code = 1,
            }
        }
        result
    }
}
