//! echo — Display a line of text.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Echo command: print operands separated by spaces.
pub struct Echo;

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("echo", "Display a line of text")
            .flag(FlagSchema::switch('n', "no-newline", "Do not output the trailing newline"))
            .lenient()
    }

    fn execute(&self, args: CommandArgs, _ctx: &mut ShellContext) -> ExecResult {
        let mut out = args.positional.join(" ");
        if !args.has("no-newline") {
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn echo_joins_operands() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Echo, &mut ctx, &["hello", "world"]).out, "hello world\n");
        assert_eq!(run(&Echo, &mut ctx, &[]).out, "\n");
    }

    #[test]
    fn echo_no_newline_and_unknown_options() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Echo, &mut ctx, &["-n", "x"]).out, "x");
        assert_eq!(run(&Echo, &mut ctx, &["-z", "x"]).out, "-z x\n");
    }
}
