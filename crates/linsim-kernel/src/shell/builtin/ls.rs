//! ls — List directory contents.
//!
//! All tree reads for one invocation happen under a single snapshot, so a
//! concurrent rename can never show up half-applied in one listing.

use chrono::{DateTime, Utc};
use linsim_types::FsEntry;

use super::resolve_reason;
use crate::shell::{
    Accounts, Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext,
};
use crate::vfs::{paths, FsTree};

/// Roughly six months, the cutoff between "time" and "year" in long format.
const RECENT_SECS: i64 = 15_778_476;

/// Ls command: list directory contents.
pub struct Ls;

#[derive(Debug, Clone, Copy)]
struct Options {
    all: bool,
    long: bool,
    one_per_line: bool,
    directory: bool,
    recursive: bool,
    unsorted: bool,
}

impl Command for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("ls", "List directory contents")
            .flag(FlagSchema::switch('a', "all", "Do not ignore entries starting with ."))
            .flag(FlagSchema::switch('l', "long", "Use a long listing format"))
            .flag(FlagSchema::switch('1', "one-per-line", "List one file per line"))
            .flag(FlagSchema::switch('d', "directory", "List directories themselves"))
            .flag(FlagSchema::switch('R', "recursive", "List subdirectories recursively"))
            .flag(FlagSchema::switch('U', "unsorted", "Do not sort; list in directory order"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let opts = Options {
            all: args.has("all"),
            long: args.has("long"),
            one_per_line: args.has("one-per-line"),
            directory: args.has("directory"),
            recursive: args.has("recursive"),
            unsorted: args.has("unsorted"),
        };
        let operands = if args.positional.is_empty() {
            vec![".".to_string()]
        } else {
            args.positional.clone()
        };
        let accounts = if opts.long { ctx.accounts() } else { Accounts::default() };
        let cwd = ctx.cwd().to_string();
        let now = Utc::now().timestamp();

        ctx.snapshot(|tree| {
            let mut report = Report {
                tree,
                opts,
                accounts: &accounts,
                now,
                result: ExecResult::success(""),
                sections: 0,
            };
            report.run(&cwd, &operands);
            report.result
        })
    }
}

struct Report<'a> {
    tree: &'a FsTree,
    opts: Options,
    accounts: &'a Accounts,
    now: i64,
    result: ExecResult,
    sections: usize,
}

impl Report<'_> {
    fn run(&mut self, cwd: &str, operands: &[String]) {
        let mut files = Vec::new();
        let mut dirs = Vec::new();

        for operand in operands {
            let found = match self.tree.resolve(cwd, operand) {
                Ok(found) => found,
                Err(e) => {
                    self.result.code = 2;
                    self.result
                        .push_err(format!("ls: cannot access '{operand}': {}", resolve_reason(&e)));
                    continue;
                }
            };
            let Some(entry) = self.tree.get(&found) else {
                continue;
            };
            let shown = if entry.is_symlink() && !self.opts.long && !self.opts.directory {
                self.tree
                    .follow(&found)
                    .ok()
                    .and_then(|real| self.tree.get(&real))
                    .unwrap_or(entry)
            } else {
                entry
            };
            if shown.is_dir() && !self.opts.directory {
                dirs.push((operand.clone(), shown.path.clone()));
            } else {
                files.push((operand.clone(), entry.clone()));
            }
        }

        if !self.opts.unsorted {
            files.sort_by(|a, b| a.0.cmp(&b.0));
            dirs.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let labelled = files.len() + dirs.len() > 1 || self.opts.recursive;
        if !files.is_empty() {
            self.emit(None, &files, false);
        }
        for (label, path) in dirs {
            self.list_dir(labelled.then_some(label.as_str()), &path);
        }
    }

    fn list_dir(&mut self, label: Option<&str>, path: &str) {
        let listing = match self.tree.children(path) {
            Ok(listing) if self.opts.unsorted => listing,
            Ok(listing) => listing.sorted(),
            Err(_) => return,
        };

        let mut rows = Vec::new();
        if self.opts.all {
            if let Some(dir) = self.tree.get(path) {
                rows.push((".".to_string(), dir.clone()));
            }
            if let Some(parent) = self.tree.get(paths::parent(path)) {
                rows.push(("..".to_string(), parent.clone()));
            }
        }
        let mut subdirs = Vec::new();
        for (name, child) in listing.iter().zip(listing.paths()) {
            if !self.opts.all && name.starts_with('.') {
                continue;
            }
            if let Some(entry) = self.tree.get(&child) {
                if entry.is_dir() {
                    subdirs.push(child.clone());
                }
                rows.push((name.to_string(), entry.clone()));
            }
        }

        self.emit(label, &rows, true);

        if self.opts.recursive {
            for sub in subdirs {
                let label = sub.clone();
                self.list_dir(Some(&label), &sub);
            }
        }
    }

    fn emit(&mut self, label: Option<&str>, rows: &[(String, FsEntry)], is_dir: bool) {
        let out = &mut self.result.out;
        if self.sections > 0 {
            out.push('\n');
        }
        self.sections += 1;
        if let Some(label) = label {
            out.push_str(label);
            out.push_str(":\n");
        }

        if self.opts.long {
            if is_dir {
                let blocks: u64 = rows.iter().map(|(_, e)| e.size.div_ceil(4096) * 4).sum();
                out.push_str(&format!("total {blocks}\n"));
            }
            let lines = long_lines(rows, self.accounts, self.now);
            for line in lines {
                out.push_str(&line);
                out.push('\n');
            }
        } else if self.opts.one_per_line {
            for (name, _) in rows {
                out.push_str(name);
                out.push('\n');
            }
        } else if !rows.is_empty() {
            let names: Vec<&str> = rows.iter().map(|(name, _)| name.as_str()).collect();
            out.push_str(&names.join("  "));
            out.push('\n');
        }
    }
}

fn long_lines(rows: &[(String, FsEntry)], accounts: &Accounts, now: i64) -> Vec<String> {
    let cols: Vec<_> = rows
        .iter()
        .map(|(name, entry)| {
            (
                entry.mode_string(),
                entry.link_count.to_string(),
                accounts.user_name(entry.uid),
                accounts.group_name(entry.gid),
                entry.size.to_string(),
                format_time(entry.mtime, now),
                match &entry.link_target {
                    Some(target) if entry.is_symlink() => format!("{name} -> {target}"),
                    _ => name.clone(),
                },
            )
        })
        .collect();

    let links_w = cols.iter().map(|c| c.1.len()).max().unwrap_or(0);
    let user_w = cols.iter().map(|c| c.2.len()).max().unwrap_or(0);
    let group_w = cols.iter().map(|c| c.3.len()).max().unwrap_or(0);
    let size_w = cols.iter().map(|c| c.4.len()).max().unwrap_or(0);

    cols.into_iter()
        .map(|(mode, links, user, group, size, time, name)| {
            format!(
                "{mode} {links:>links_w$} {user:<user_w$} {group:<group_w$} {size:>size_w$} {time} {name}"
            )
        })
        .collect()
}

fn format_time(mtime: i64, now: i64) -> String {
    let Some(when) = DateTime::<Utc>::from_timestamp(mtime, 0) else {
        return "?".to_string();
    };
    let age = now - mtime;
    if (0..RECENT_SECS).contains(&age) {
        when.format("%b %e %H:%M").to_string()
    } else {
        when.format("%b %e  %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn ls_sorted_and_hidden() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["/etc"]);
        assert_eq!(result.out, "group  hostname  hosts  motd  passwd  shadow\n");

        let result = run(&Ls, &mut ctx, &[]);
        assert_eq!(result.out, "");
        let result = run(&Ls, &mut ctx, &["-a1"]);
        assert_eq!(result.out, ".\n..\n.bashrc\n");
    }

    #[test]
    fn ls_unsorted_keeps_insertion_order() {
        let mut ctx = make_ctx();
        ctx.touch("/tmp/zeta").unwrap();
        ctx.touch("/tmp/alpha").unwrap();
        assert_eq!(run(&Ls, &mut ctx, &["-U", "/tmp"]).out, "zeta  alpha\n");
        assert_eq!(run(&Ls, &mut ctx, &["/tmp"]).out, "alpha  zeta\n");
    }

    #[test]
    fn ls_long_format() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["-l", "/var/www/html"]);
        insta::assert_snapshot!(result.out, @r"
        total 8
        drwxr-xr-x 2 root root 4096 Nov 14  2023 docs
        -rw-r--r-- 1 root root   45 Nov 14  2023 index.html
        ");
    }

    #[test]
    fn ls_long_shows_link_target_and_owner() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["-ld", "/bin", "/home/alice"]);
        let lines: Vec<_> = result.out.lines().collect();
        assert!(lines[0].starts_with("lrwxrwxrwx 1 root  root "), "{}", lines[0]);
        assert!(lines[0].ends_with("/bin -> usr/bin"));
        assert!(lines[1].starts_with("drwxr-xr-x 2 alice alice"), "{}", lines[1]);
    }

    #[test]
    fn ls_follows_symlinked_directory_operand() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Ls, &mut ctx, &["/bin"]).out, "cat  ls\n");
    }

    #[test]
    fn ls_multiple_operands_and_errors() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["/var/www/html/docs", "/etc/motd", "/nope"]);
        assert_eq!(result.code, 2);
        assert_eq!(result.err, "ls: cannot access '/nope': No such file or directory");
        assert_eq!(result.out, "/etc/motd\n\n/var/www/html/docs:\nreadme.txt\n");
    }

    #[test]
    fn ls_recursive() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["-R", "/var/www"]);
        assert_eq!(
            result.out,
            "/var/www:\nhtml\n\n/var/www/html:\ndocs  index.html\n\n/var/www/html/docs:\nreadme.txt\n"
        );
    }

    #[test]
    fn ls_unknown_flag() {
        let mut ctx = make_ctx();
        let result = run(&Ls, &mut ctx, &["-z"]);
        assert_eq!(result.code, 2);
        assert_eq!(result.err, "ls: invalid option -- 'z'");
    }

    #[test]
    fn recent_times_show_clock() {
        assert_eq!(format_time(1_700_000_000, 1_700_000_100), "Nov 14 22:13");
        assert_eq!(format_time(1_700_000_000, 1_800_000_000), "Nov 14  2023");
    }
}
