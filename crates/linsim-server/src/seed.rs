//! Minimal filesystem for an empty database.
//!
//! Written once, on the first start against a database with no rows, so a
//! fresh install boots into something that looks like a Debian host.

use anyhow::{Context, Result};
use chrono::Utc;
use linsim_kernel::store::Content;
use linsim_kernel::{HostInfo, SqliteStore};
use linsim_types::{EntryKind, FsRecord};

enum Node {
    Dir(u32),
    File(u32, u32, String),
    Link(&'static str),
    Device,
}

/// Insert the skeleton. Returns the number of rows written.
pub fn seed(store: &SqliteStore, host: &HostInfo) -> Result<usize> {
    let now = Utc::now().timestamp();
    let nodes = skeleton(host);
    for (inode, (path, node)) in nodes.iter().enumerate() {
        let (kind, mode, gid, content) = match node {
            Node::Dir(mode) => (EntryKind::Directory, *mode, 0, None),
            Node::File(mode, gid, text) => (EntryKind::RegularFile, *mode, *gid, Some(Content::Text(text))),
            Node::Link(_) => (EntryKind::Symlink, 0o777, 0, None),
            Node::Device => (EntryKind::Device, 0o666, 0, None),
        };
        let mut record = FsRecord::new(*path, kind)
            .with_inode(inode as u64 + 1)
            .with_mode(mode)
            .with_owner(0, gid)
            .with_times(now);
        if let Node::Link(target) = node {
            record = record.with_target(*target);
        }
        store
            .insert(&record, content)
            .with_context(|| format!("Failed to seed {path}"))?;
    }
    Ok(nodes.len())
}

fn skeleton(host: &HostInfo) -> Vec<(&'static str, Node)> {
    let file = |text: String| Node::File(0o644, 0, text);
    vec![
        ("/", Node::Dir(0o755)),
        ("/boot", Node::Dir(0o755)),
        ("/dev", Node::Dir(0o755)),
        ("/dev/null", Node::Device),
        ("/dev/zero", Node::Device),
        ("/dev/tty", Node::Device),
        ("/etc", Node::Dir(0o755)),
        ("/etc/hostname", file(format!("{}\n", host.short_name))),
        (
            "/etc/hosts",
            file(format!(
                "127.0.0.1\tlocalhost\n127.0.1.1\t{}\t{}\n\n::1\tlocalhost ip6-localhost ip6-loopback\n",
                host.hostname, host.short_name
            )),
        ),
        (
            "/etc/passwd",
            file(
                "root:x:0:0:root:/root:/bin/bash\n\
                 daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin\n\
                 www-data:x:33:33:www-data:/var/www:/usr/sbin/nologin\n\
                 nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin\n"
                    .to_string(),
            ),
        ),
        (
            "/etc/group",
            file("root:x:0:\ndaemon:x:1:\nshadow:x:42:\nwww-data:x:33:\nnogroup:x:65534:\n".to_string()),
        ),
        (
            "/etc/shadow",
            Node::File(0o640, 42, "root:*:19700:0:99999:7:::\n".to_string()),
        ),
        ("/etc/issue", file("Debian GNU/Linux 12 \\n \\l\n\n".to_string())),
        (
            "/etc/motd",
            file(format!(
                "\nThe programs included with the Debian GNU/Linux system are free software.\n\
                 Linux {} {} {}\n\n",
                host.short_name, host.kernel_release, host.machine
            )),
        ),
        (
            "/etc/os-release",
            file(
                "PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nNAME=\"Debian GNU/Linux\"\n\
                 VERSION_ID=\"12\"\nID=debian\n"
                    .to_string(),
            ),
        ),
        ("/home", Node::Dir(0o755)),
        ("/root", Node::Dir(0o700)),
        ("/root/.bashrc", file("# ~/.bashrc: executed by bash(1) for non-login shells.\n".to_string())),
        ("/tmp", Node::Dir(0o1777)),
        ("/usr", Node::Dir(0o755)),
        ("/usr/bin", Node::Dir(0o755)),
        ("/usr/sbin", Node::Dir(0o755)),
        ("/usr/lib", Node::Dir(0o755)),
        ("/usr/local", Node::Dir(0o755)),
        ("/usr/local/bin", Node::Dir(0o755)),
        ("/bin", Node::Link("usr/bin")),
        ("/sbin", Node::Link("usr/sbin")),
        ("/lib", Node::Link("usr/lib")),
        ("/opt", Node::Dir(0o755)),
        ("/srv", Node::Dir(0o755)),
        ("/var", Node::Dir(0o755)),
        ("/var/log", Node::Dir(0o755)),
        ("/var/www", Node::Dir(0o755)),
        ("/var/www/html", Node::Dir(0o755)),
        (
            "/var/www/html/index.html",
            file("<html><body><h1>It works!</h1></body></html>\n".to_string()),
        ),
        ("/proc", Node::Dir(0o555)),
        ("/sys", Node::Dir(0o555)),
    ]
}
