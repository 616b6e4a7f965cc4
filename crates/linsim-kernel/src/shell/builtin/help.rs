//! help — List available commands.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Help command: list commands, or describe one.
pub struct Help;

impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("help", "Display information about commands")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let summaries = ctx.command_summaries();
        if let Some(wanted) = args.positional.first() {
            return match summaries.iter().find(|(name, _)| *name == wanted.as_str()) {
                Some((name, description)) => ExecResult::success(format!("{name}: {description}\n")),
                None => ExecResult::failure(
                    1,
                    format!("help: no help topics match `{wanted}'"),
                ),
            };
        }

        let width = summaries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut out = String::from("Available commands:\n");
        for (name, description) in &summaries {
            out.push_str(&format!("  {name:<width$}  {description}\n"));
        }
        out.push_str(&format!("  {:<width$}  Leave the shell\n", "exit"));
        ExecResult::success(out)
    }
}
