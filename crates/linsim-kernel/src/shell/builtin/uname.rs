//! uname — Print system information.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Uname command: print kernel and machine identity.
pub struct Uname;

impl Command for Uname {
    fn name(&self) -> &str {
        "uname"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("uname", "Print system information")
            .flag(FlagSchema::switch('a', "all", "Print all information"))
            .flag(FlagSchema::switch('s', "kernel-name", "Print the kernel name"))
            .flag(FlagSchema::switch('n', "nodename", "Print the network node hostname"))
            .flag(FlagSchema::switch('r', "kernel-release", "Print the kernel release"))
            .flag(FlagSchema::switch('v', "kernel-version", "Print the kernel version"))
            .flag(FlagSchema::switch('m', "machine", "Print the machine hardware name"))
            .flag(FlagSchema::switch('o', "operating-system", "Print the operating system"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let host = ctx.host();
        let all = args.has("all");
        let fields = [
            ("kernel-name", "Linux"),
            ("nodename", host.short_name.as_str()),
            ("kernel-release", host.kernel_release.as_str()),
            ("kernel-version", host.kernel_version.as_str()),
            ("machine", host.machine.as_str()),
            ("operating-system", "GNU/Linux"),
        ];

        let mut parts: Vec<&str> = fields
            .iter()
            .filter(|(flag, _)| all || args.has(flag))
            .map(|(_, value)| *value)
            .collect();
        if parts.is_empty() {
            parts.push("Linux");
        }
        ExecResult::success(format!("{}\n", parts.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn uname_default_is_kernel_name() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Uname, &mut ctx, &[]).out, "Linux\n");
    }

    #[test]
    fn uname_selected_fields_keep_canonical_order() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Uname, &mut ctx, &["-m", "-n"]).out, "web01 x86_64\n");
        assert_eq!(run(&Uname, &mut ctx, &["-r"]).out, "6.1.0-18-amd64\n");
    }

    #[test]
    fn uname_all() {
        let mut ctx = make_ctx();
        assert_eq!(
            run(&Uname, &mut ctx, &["-a"]).out,
            "Linux web01 6.1.0-18-amd64 #1 SMP PREEMPT_DYNAMIC Debian 6.1.76-1 (2024-02-01) x86_64 GNU/Linux\n"
        );
    }
}
