//! cd — Change directory.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Cd command: change the working directory.
pub struct Cd;

impl Command for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("cd", "Change the working directory")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.len() > 1 {
            return ExecResult::failure(1, "cd: too many arguments");
        }

        let (target, announce) = match args.positional.first().map(String::as_str) {
            None => match ctx.var("HOME") {
                Some(home) => (home.to_string(), false),
                None => return ExecResult::failure(1, "cd: HOME not set"),
            },
            Some("-") => match ctx.var("OLDPWD") {
                Some(old) => (old.to_string(), true),
                None => return ExecResult::failure(1, "cd: OLDPWD not set"),
            },
            Some(dir) => (dir.to_string(), false),
        };

        match ctx.set_cwd(&target) {
            Ok(cwd) if announce => ExecResult::success(format!("{cwd}\n")),
            Ok(_) => ExecResult::success(""),
            Err(e) => ExecResult::failure(1, format!("cd: {target}: {}", reason(&e))),
        }
    }
}
