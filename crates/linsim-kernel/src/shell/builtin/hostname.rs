//! hostname — Show the system's host name.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Hostname command: print the configured host name.
pub struct Hostname;

impl Command for Hostname {
    fn name(&self) -> &str {
        "hostname"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("hostname", "Show the system's host name")
            .flag(FlagSchema::switch('f', "fqdn", "Long host name (FQDN)"))
            .flag(FlagSchema::switch('s', "short", "Short host name"))
            .flag(FlagSchema::switch('d', "domain", "DNS domain name"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if !args.positional.is_empty() {
            return ExecResult::failure(1, "hostname: you must be root to change the host name");
        }
        let host = ctx.host();
        let name = if args.has("fqdn") {
            &host.hostname
        } else if args.has("domain") {
            &host.domain_name
        } else {
            &host.short_name
        };
        ExecResult::success(format!("{name}\n"))
    }
}
