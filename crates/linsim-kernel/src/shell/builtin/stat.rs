//! stat — Display file status.

use chrono::{DateTime, Utc};
use linsim_types::FsEntry;

use super::resolve_reason;
use crate::shell::{Accounts, Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Stat command: display entry metadata.
pub struct Stat;

impl Command for Stat {
    fn name(&self) -> &str {
        "stat"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("stat", "Display file status")
            .flag(FlagSchema::switch('L', "dereference", "Follow symbolic links"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "stat: missing operand");
        }
        let follow = args.has("dereference");
        let accounts = ctx.accounts();

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            match ctx.entry(operand, follow) {
                Ok(entry) => result.out.push_str(&render(operand, &entry, &accounts)),
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!(
                        "stat: cannot statx '{operand}': {}",
                        resolve_reason(&e)
                    ));
                }
            }
        }
        result
    }
}

fn render(operand: &str, entry: &FsEntry, accounts: &Accounts) -> String {
    let file = match (&entry.link_target, entry.is_symlink()) {
        (Some(target), true) => format!("{operand} -> {target}"),
        _ => operand.to_string(),
    };
    let blocks = entry.size.div_ceil(512).next_multiple_of(8);
    format!(
        "  File: {file}\n\
         \x20 Size: {:<10}\tBlocks: {:<10} IO Block: 4096   {}\n\
         Device: 801h/2049d\tInode: {:<11} Links: {}\n\
         Access: ({:04o}/{})  Uid: ({:>5}/{:>8})   Gid: ({:>5}/{:>8})\n\
         Access: {}\n\
         Modify: {}\n\
         Change: {}\n\
         \x20Birth: -\n",
        entry.size,
        blocks,
        entry.kind.describe(),
        entry.inode,
        entry.link_count,
        entry.permissions(),
        entry.mode_string(),
        entry.uid,
        accounts.user_name(entry.uid),
        entry.gid,
        accounts.group_name(entry.gid),
        timestamp(entry.atime),
        timestamp(entry.mtime),
        timestamp(entry.ctime),
    )
}

fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S.000000000 +0000").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn stat_regular_file() {
        let mut ctx = make_ctx();
        let result = run(&Stat, &mut ctx, &["/etc/hostname"]);
        assert!(result.ok());
        let lines: Vec<_> = result.out.lines().collect();
        assert_eq!(lines[0], "  File: /etc/hostname");
        assert!(lines[1].starts_with("  Size: 10 "), "{}", lines[1]);
        assert!(lines[1].ends_with("regular file"));
        assert!(lines[3].starts_with("Access: (0644/-rw-r--r--)"));
        assert!(lines[3].contains("root"));
        assert_eq!(lines[4], "Access: 2023-11-14 22:13:20.000000000 +0000");
        assert_eq!(lines[7], " Birth: -");
    }

    #[test]
    fn stat_symlink_and_dereference() {
        let mut ctx = make_ctx();
        let link = run(&Stat, &mut ctx, &["/bin"]);
        assert!(link.out.starts_with("  File: /bin -> usr/bin\n"));
        assert!(link.out.contains("symbolic link"));

        let real = run(&Stat, &mut ctx, &["-L", "/bin"]);
        assert!(real.out.starts_with("  File: /bin\n"));
        assert!(real.out.contains("directory"));
        assert!(real.out.contains("Size: 4096"));
    }

    #[test]
    fn stat_owner_names_and_missing() {
        let mut ctx = make_ctx();
        let result = run(&Stat, &mut ctx, &["/home/alice", "/nope"]);
        assert_eq!(result.code, 1);
        assert!(result.out.contains("Uid: ( 1000/   alice)"));
        assert_eq!(result.err, "stat: cannot statx '/nope': No such file or directory");
    }

    #[test]
    fn block_rounding() {
        assert_eq!(0u64.div_ceil(512).next_multiple_of(8), 0);
        assert_eq!(45u64.div_ceil(512).next_multiple_of(8), 8);
        assert_eq!(4096u64.div_ceil(512).next_multiple_of(8), 8);
    }
}
