//! env, export, unset — Session environment.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Env command: print the environment.
pub struct Env;

impl Command for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("env", "Print the environment")
    }

    fn execute(&self, _args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let out = ctx
            .vars()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect::<String>();
        ExecResult::success(out)
    }
}

/// Export command: set variables for the rest of the session.
pub struct Export;

impl Command for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("export", "Set environment variables")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            let out = ctx
                .vars()
                .map(|(k, v)| format!("declare -x {k}=\"{v}\"\n"))
                .collect::<String>();
            return ExecResult::success(out);
        }

        let mut result = ExecResult::success("");
        for assignment in &args.positional {
            let (name, value) = assignment.split_once('=').unwrap_or((assignment.as_str(), ""));
            if !valid_name(name) {
                result.code = 1;
                result.push_err(format!("export: `{assignment}': not a valid identifier"));
                continue;
            }
            if assignment.contains('=') || ctx.var(name).is_none() {
                ctx.set_var(name, value);
            }
        }
        result
    }
}

/// Unset command: remove variables.
pub struct Unset;

impl Command for Unset {
    fn name(&self) -> &str {
        "unset"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("unset", "Remove environment variables")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        for name in &args.positional {
            ctx.unset_var(name);
        }
        ExecResult::success("")
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
