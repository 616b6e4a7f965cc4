//! grep — Print lines that match patterns.

use regex::RegexBuilder;

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Grep command: search file contents with a regular expression.
///
/// Exit status is 0 when a line was selected, 1 when none was, and 2 on
/// any error.
pub struct Grep;

impl Command for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("grep", "Print lines that match patterns")
            .flag(FlagSchema::switch('i', "ignore-case", "Ignore case distinctions"))
            .flag(FlagSchema::switch('v', "invert-match", "Select non-matching lines"))
            .flag(FlagSchema::switch('n', "line-number", "Prefix each line with its line number"))
            .flag(FlagSchema::switch('c', "count", "Print only a count of selected lines"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let (pattern, files) = match args.positional.split_first() {
            Some((pattern, files)) if !files.is_empty() => (pattern, files),
            _ => return ExecResult::failure(2, "Usage: grep [OPTION]... PATTERNS [FILE]..."),
        };
        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(args.has("ignore-case"))
            .build()
        {
            Ok(regex) => regex,
            Err(e) => return ExecResult::failure(2, format!("grep: {e}")),
        };
        let invert = args.has("invert-match");
        let numbered = args.has("line-number");
        let count_only = args.has("count");
        let prefixed = files.len() > 1;

        let mut result = ExecResult::success("");
        let mut selected_any = false;
        let mut failed = false;
        for file in files {
            let bytes = match ctx.read_file(file) {
                Ok(bytes) => bytes,
                Err(e) => {
                    failed = true;
                    result.push_err(format!("grep: {file}: {}", reason(&e)));
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            let mut selected = 0usize;
            for (index, line) in text.lines().enumerate() {
                if regex.is_match(line) == invert {
                    continue;
                }
                selected += 1;
                if count_only {
                    continue;
                }
                if prefixed {
                    result.out.push_str(file);
                    result.out.push(':');
                }
                if numbered {
                    result.out.push_str(&format!("{}:", index + 1));
                }
                result.out.push_str(line);
                result.out.push('\n');
            }
            if count_only {
                if prefixed {
                    result.out.push_str(&format!("{file}:{selected}\n"));
                } else {
                    result.out.push_str(&format!("{selected}\n"));
                }
            }
            selected_any |= selected > 0;
        }

        result.code = if failed {
            2
        } else if selected_any {
            0
        } else {
            1
        };
        result
    }
}
