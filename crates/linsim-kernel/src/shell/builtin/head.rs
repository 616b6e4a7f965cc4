//! head — Output the first part of files.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

const DEFAULT_LINES: usize = 10;

/// Head command: print the first lines of each file.
pub struct Head;

impl Command for Head {
    fn name(&self) -> &str {
        "head"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("head", "Output the first part of files")
            .flag(FlagSchema::value('n', "lines", "Print the first NUM lines"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let count = match args.value("lines").map(str::parse::<usize>) {
            None => DEFAULT_LINES,
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                let raw = args.value("lines").unwrap_or_default();
                return ExecResult::failure(1, format!("head: invalid number of lines: '{raw}'"));
            }
        };
        if args.positional.is_empty() {
            return ExecResult::failure(1, "head: missing file operand");
        }

        let headers = args.positional.len() > 1;
        let mut result = ExecResult::success("");
        for operand in &args.positional {
            let bytes = match ctx.read_file(operand) {
                Ok(bytes) => bytes,
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!("head: cannot open '{operand}' for reading: {}", reason(&e)));
                    continue;
                }
            };
            if headers {
                if !result.out.is_empty() {
                    result.out.push('\n');
                }
                result.out.push_str(&format!("==> {operand} <==\n"));
            }
            let text = String::from_utf8_lossy(&bytes);
            for line in text.split_inclusive('\n').take(count) {
                result.out.push_str(line);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn head_counts_lines() {
        let mut ctx = make_ctx();
        let result = run(&Head, &mut ctx, &["-n", "2", "/home/alice/notes.txt"]);
        assert_eq!(result.out, "buy milk\ncall bob\n");
        let result = run(&Head, &mut ctx, &["-n1", "/home/alice/notes.txt"]);
        assert_eq!(result.out, "buy milk\n");
        let result = run(&Head, &mut ctx, &["/home/alice/notes.txt"]);
        assert_eq!(result.out, "buy milk\ncall bob\nBuy bread\n");
    }

    #[test]
    fn head_multiple_files_get_headers() {
        let mut ctx = make_ctx();
        let result = run(&Head, &mut ctx, &["-n", "1", "/etc/hostname", "/etc/motd"]);
        assert_eq!(
            result.out,
            "==> /etc/hostname <==\nlocalhost\n\n==> /etc/motd <==\nWelcome to Debian GNU/Linux.\n"
        );
    }

    #[test]
    fn head_errors() {
        let mut ctx = make_ctx();
        assert_eq!(
            run(&Head, &mut ctx, &["-n", "x", "/etc/motd"]).err,
            "head: invalid number of lines: 'x'"
        );
        assert_eq!(
            run(&Head, &mut ctx, &["/etc"]).err,
            "head: cannot open '/etc' for reading: Is a directory"
        );
    }
}
