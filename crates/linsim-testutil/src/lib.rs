//! Test utilities for linsim.
//!
//! [`RecordSet`] builds the flat rows a record store would hand the loader,
//! together with the payloads behind their content locators.
//! [`standard_host`] is a small but complete Linux-looking tree that most
//! kernel and server tests start from.

use linsim_types::{ContentLocator, EntryKind, FsRecord};

/// Timestamp every fixture entry carries.
pub const FIXTURE_TIME: i64 = 1_700_000_000;

/// Builder for an unordered record set plus its payloads.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<FsRecord>,
    contents: Vec<(ContentLocator, Vec<u8>)>,
    next_inode: u64,
    next_locator: i64,
}

impl RecordSet {
    /// No records at all, not even a root.
    pub fn empty() -> Self {
        Self {
            next_inode: 1,
            next_locator: 1,
            ..Self::default()
        }
    }

    /// Just the root directory.
    pub fn new() -> Self {
        Self::empty().dir("/")
    }

    fn stamp(&mut self, record: FsRecord) -> FsRecord {
        let inode = self.next_inode;
        self.next_inode += 1;
        record.with_inode(inode).with_times(FIXTURE_TIME)
    }

    /// Root-owned directory, mode 0755.
    pub fn dir(self, path: &str) -> Self {
        self.dir_with(path, 0o755, 0, 0)
    }

    pub fn dir_with(mut self, path: &str, mode: u32, uid: u32, gid: u32) -> Self {
        let record = self.stamp(
            FsRecord::new(path, EntryKind::Directory)
                .with_mode(mode)
                .with_owner(uid, gid),
        );
        self.records.push(record);
        self
    }

    /// Root-owned regular file, mode 0644.
    pub fn file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.file_with(path, content, 0o644, 0, 0)
    }

    pub fn file_with(
        mut self,
        path: &str,
        content: impl AsRef<[u8]>,
        mode: u32,
        uid: u32,
        gid: u32,
    ) -> Self {
        let bytes = content.as_ref().to_vec();
        let locator = ContentLocator(self.next_locator);
        self.next_locator += 1;
        let record = self.stamp(
            FsRecord::new(path, EntryKind::RegularFile)
                .with_mode(mode)
                .with_owner(uid, gid)
                .with_content(locator, bytes.len() as u64),
        );
        self.records.push(record);
        self.contents.push((locator, bytes));
        self
    }

    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        let record = self.stamp(FsRecord::new(path, EntryKind::Symlink).with_target(target));
        self.records.push(record);
        self
    }

    /// Any other kind (device, fifo, socket).
    pub fn special(mut self, path: &str, kind: EntryKind) -> Self {
        let record = self.stamp(FsRecord::new(path, kind).with_mode(0o666));
        self.records.push(record);
        self
    }

    /// Second name for the file at `existing`, sharing its inode.
    pub fn hard_link(mut self, existing: &str, path: &str) -> Self {
        let Some(source) = self.records.iter().find(|r| r.path == existing).cloned() else {
            return self;
        };
        let link_count = source.link_count + 1;
        for record in self.records.iter_mut().filter(|r| r.inode == source.inode) {
            record.link_count = link_count;
        }
        let mut linked = source;
        linked.name = path.rsplit('/').next().unwrap_or("").to_string();
        linked.path = path.to_string();
        linked.link_count = link_count;
        self.records.push(linked);
        self
    }

    /// Push a record verbatim, malformed or not.
    pub fn raw(mut self, record: FsRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Drop every record at `path`.
    pub fn without(mut self, path: &str) -> Self {
        self.records.retain(|r| r.path != path);
        self
    }

    pub fn records(&self) -> &[FsRecord] {
        &self.records
    }

    pub fn contents(&self) -> &[(ContentLocator, Vec<u8>)] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<FsRecord>, Vec<(ContentLocator, Vec<u8>)>) {
        (self.records, self.contents)
    }
}

pub const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
www-data:x:33:33:www-data:/var/www:/usr/sbin/nologin
alice:x:1000:1000:Alice,,,:/home/alice:/bin/bash
";

pub const GROUP: &str = "\
root:x:0:
daemon:x:1:
sudo:x:27:alice
www-data:x:33:
alice:x:1000:
";

pub const INDEX_HTML: &str = "<html><body><h1>It works!</h1></body></html>\n";

/// A small Debian-looking host.
///
/// `/bin` and `/sbin` are symlinks into `/usr`, `/tmp` is sticky and
/// world-writable, `/root` is private, `/home/alice` belongs to uid 1000.
pub fn standard_host() -> RecordSet {
    RecordSet::new()
        .dir("/usr")
        .dir("/usr/bin")
        .file_with("/usr/bin/ls", b"\x7fELF\x02\x01\x01", 0o755, 0, 0)
        .file_with("/usr/bin/cat", b"\x7fELF\x02\x01\x01", 0o755, 0, 0)
        .dir("/usr/sbin")
        .dir("/usr/local")
        .dir("/usr/local/bin")
        .symlink("/bin", "usr/bin")
        .symlink("/sbin", "usr/sbin")
        .dir("/etc")
        .file("/etc/passwd", PASSWD)
        .file_with("/etc/shadow", "root:*:19000:0:99999:7:::\n", 0o640, 0, 42)
        .file("/etc/group", GROUP)
        .file("/etc/hostname", "localhost\n")
        .file("/etc/hosts", "127.0.0.1\tlocalhost\n::1\tlocalhost ip6-localhost\n")
        .file("/etc/motd", "Welcome to Debian GNU/Linux.\n")
        .dir("/home")
        .dir_with("/home/alice", 0o755, 1000, 1000)
        .file_with("/home/alice/notes.txt", "buy milk\ncall bob\nBuy bread\n", 0o644, 1000, 1000)
        .dir_with("/root", 0o700, 0, 0)
        .file("/root/.bashrc", "# ~/.bashrc\nexport PS1='\\u@\\h:\\w\\$ '\n")
        .dir_with("/tmp", 0o1777, 0, 0)
        .dir("/var")
        .dir("/var/log")
        .file_with("/var/log/syslog", "", 0o640, 0, 4)
        .dir("/var/www")
        .dir("/var/www/html")
        .file("/var/www/html/index.html", INDEX_HTML)
        .dir("/var/www/html/docs")
        .file("/var/www/html/docs/readme.txt", "docs\n")
        .dir("/dev")
        .special("/dev/null", EntryKind::Device)
}
