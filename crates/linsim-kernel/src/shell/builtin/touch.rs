//! touch — Change file timestamps.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Touch command: update times, creating empty files as needed.
pub struct Touch;

impl Command for Touch {
    fn name(&self) -> &str {
        "touch"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("touch", "Change file timestamps")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "touch: missing file operand");
        }

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            if let Err(e) = ctx.touch(operand) {
                result.code = 1;
                result.push_err(format!("touch: cannot touch '{operand}': {}", reason(&e)));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, make_ctx_as, run};
    use linsim_testutil::FIXTURE_TIME;

    #[test]
    fn touch_creates_empty_file() {
        let mut ctx = make_ctx();
        assert!(run(&Touch, &mut ctx, &["/tmp/new"]).ok());
        let entry = ctx.entry("/tmp/new", false).unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size, 0);
        assert_eq!(ctx.read_file("/tmp/new").unwrap(), b"");
    }

    #[test]
    fn touch_updates_times() {
        let mut ctx = make_ctx();
        assert_eq!(ctx.entry("/etc/motd", false).unwrap().mtime, FIXTURE_TIME);
        assert!(run(&Touch, &mut ctx, &["/etc/motd"]).ok());
        let entry = ctx.entry("/etc/motd", false).unwrap();
        assert!(entry.mtime > FIXTURE_TIME);
        assert_eq!(entry.atime, entry.mtime);
        assert_eq!(entry.size, 29);
    }

    #[test]
    fn touch_errors() {
        let mut ctx = make_ctx_as("alice");
        let result = run(&Touch, &mut ctx, &["/etc/new", "/nope/x"]);
        assert_eq!(
            result.err,
            "touch: cannot touch '/etc/new': Permission denied\n\
             touch: cannot touch '/nope/x': No such file or directory"
        );
    }
}
