//! cat — Concatenate files.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Cat command: print file contents.
pub struct Cat;

impl Command for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("cat", "Concatenate files and print on the standard output")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "cat: missing file operand");
        }

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            match ctx.read_file(operand) {
                Ok(bytes) => result.out.push_str(&String::from_utf8_lossy(&bytes)),
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!("cat: {operand}: {}", reason(&e)));
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, make_ctx_as, run};

    #[test]
    fn cat_file() {
        let mut ctx = make_ctx();
        let result = run(&Cat, &mut ctx, &["/etc/hostname"]);
        assert!(result.ok());
        assert_eq!(result.out, "localhost\n");
    }

    #[test]
    fn cat_relative_and_multiple() {
        let mut ctx = make_ctx();
        ctx.set_cwd("/etc").unwrap();
        let result = run(&Cat, &mut ctx, &["hostname", "motd"]);
        assert_eq!(result.out, "localhost\nWelcome to Debian GNU/Linux.\n");
    }

    #[test]
    fn cat_follows_symlinks() {
        let mut ctx = make_ctx();
        ctx.symlink("/etc/hostname", "/tmp/hn").unwrap();
        let result = run(&Cat, &mut ctx, &["/tmp/hn"]);
        assert_eq!(result.out, "localhost\n");
    }

    #[test]
    fn cat_directory_and_missing() {
        let mut ctx = make_ctx();
        let result = run(&Cat, &mut ctx, &["/etc", "/nope", "/etc/hostname"]);
        assert_eq!(result.code, 1);
        assert_eq!(result.out, "localhost\n");
        assert_eq!(
            result.err,
            "cat: /etc: Is a directory\ncat: /nope: No such file or directory"
        );
    }

    #[test]
    fn cat_respects_read_permission() {
        let mut ctx = make_ctx_as("alice");
        let result = run(&Cat, &mut ctx, &["/etc/shadow"]);
        assert_eq!(result.err, "cat: /etc/shadow: Permission denied");
    }

    #[test]
    fn cat_no_args() {
        let mut ctx = make_ctx();
        let result = run(&Cat, &mut ctx, &[]);
        assert!(!result.ok());
        assert!(result.err.contains("missing"));
    }
}
