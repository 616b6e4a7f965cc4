//! In-memory filesystem entries.

use serde::{Deserialize, Serialize};

use crate::record::{ContentLocator, FsRecord};

/// Reported size of every directory.
pub const DIRECTORY_SIZE: u64 = 4096;

/// Kind of filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    RegularFile,
    Directory,
    Symlink,
    Device,
    Fifo,
    Socket,
}

impl EntryKind {
    /// Decode the persisted integer code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::RegularFile),
            1 => Some(Self::Directory),
            2 => Some(Self::Symlink),
            3 => Some(Self::Device),
            4 => Some(Self::Fifo),
            5 => Some(Self::Socket),
            _ => None,
        }
    }

    /// The persisted integer code.
    pub fn code(self) -> i64 {
        match self {
            Self::RegularFile => 0,
            Self::Directory => 1,
            Self::Symlink => 2,
            Self::Device => 3,
            Self::Fifo => 4,
            Self::Socket => 5,
        }
    }

    /// Type character used by `ls -l`.
    pub fn type_char(self) -> char {
        match self {
            Self::RegularFile => '-',
            Self::Directory => 'd',
            Self::Symlink => 'l',
            Self::Device => 'c',
            Self::Fifo => 'p',
            Self::Socket => 's',
        }
    }

    /// Human description used by `stat`.
    pub fn describe(self) -> &'static str {
        match self {
            Self::RegularFile => "regular file",
            Self::Directory => "directory",
            Self::Symlink => "symbolic link",
            Self::Device => "character special file",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
        }
    }
}

/// Numeric identity a mutation is performed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
}

impl Credentials {
    pub const ROOT: Credentials = Credentials { uid: 0, gid: 0 };

    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    pub fn is_root(&self) -> bool {
        self.uid == 0
    }
}

/// One simulated filesystem object.
///
/// Holds metadata and a content locator, never content bytes. `size` is
/// computed once, when the entry is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEntry {
    pub path: String,
    pub name: String,
    pub inode: u64,
    pub kind: EntryKind,
    pub mode: u32,
    pub link_count: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
    pub link_target: Option<String>,
    pub content_locator: Option<ContentLocator>,
    pub size: u64,
}

impl FsEntry {
    /// Build an entry from a store record, deriving its size.
    pub fn from_record(record: FsRecord) -> Self {
        let size = match record.kind {
            EntryKind::RegularFile => record.content_len,
            EntryKind::Directory => DIRECTORY_SIZE,
            EntryKind::Symlink => record.link_target.as_ref().map_or(0, |t| t.len() as u64),
            EntryKind::Device | EntryKind::Fifo | EntryKind::Socket => 0,
        };
        Self {
            path: record.path,
            name: record.name,
            inode: record.inode,
            kind: record.kind,
            mode: record.mode,
            link_count: record.link_count,
            uid: record.uid,
            gid: record.gid,
            atime: record.atime,
            ctime: record.ctime,
            mtime: record.mtime,
            link_target: record.link_target,
            content_locator: record.content_locator,
            size,
        }
    }

    /// Convert back into a record, for handing mutations to the store.
    pub fn to_record(&self) -> FsRecord {
        FsRecord {
            path: self.path.clone(),
            name: self.name.clone(),
            inode: self.inode,
            kind: self.kind,
            mode: self.mode,
            link_count: self.link_count,
            uid: self.uid,
            gid: self.gid,
            atime: self.atime,
            ctime: self.ctime,
            mtime: self.mtime,
            link_target: self.link_target.clone(),
            content_locator: self.content_locator,
            content_len: if self.kind == EntryKind::RegularFile { self.size } else { 0 },
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::RegularFile
    }

    /// Permission bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// `drwxr-xr-x` style rendering, including setuid/setgid/sticky.
    pub fn mode_string(&self) -> String {
        let perms = self.permissions();
        let mut out = String::with_capacity(10);
        out.push(self.kind.type_char());
        let classes = [(6, 0o4000, 's'), (3, 0o2000, 's'), (0, 0o1000, 't')];
        for (shift, special, special_char) in classes {
            let bits = (perms >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            let exec = bits & 0o1 != 0;
            out.push(match (perms & special != 0, exec) {
                (true, true) => special_char,
                (true, false) => special_char.to_ascii_uppercase(),
                (false, true) => 'x',
                (false, false) => '-',
            });
        }
        out
    }

    /// Whether `cred` may write to this entry (create/remove children when it
    /// is a directory).
    pub fn permits_write(&self, cred: Credentials) -> bool {
        if cred.is_root() {
            return true;
        }
        let perms = self.permissions();
        let bits = if cred.uid == self.uid {
            perms >> 6
        } else if cred.gid == self.gid {
            perms >> 3
        } else {
            perms
        };
        bits & 0o2 != 0
    }

    /// Whether `cred` may read this entry.
    pub fn permits_read(&self, cred: Credentials) -> bool {
        if cred.is_root() {
            return true;
        }
        let perms = self.permissions();
        let bits = if cred.uid == self.uid {
            perms >> 6
        } else if cred.gid == self.gid {
            perms >> 3
        } else {
            perms
        };
        bits & 0o4 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind, mode: u32) -> FsEntry {
        FsEntry::from_record(FsRecord::new("/x", kind).with_mode(mode).with_owner(1000, 1000))
    }

    #[test]
    fn kind_codes_round_trip() {
        for code in 0..6 {
            let kind = EntryKind::from_code(code).expect("in domain");
            assert_eq!(kind.code(), code);
        }
        assert!(EntryKind::from_code(6).is_none());
        assert!(EntryKind::from_code(-1).is_none());
    }

    #[test]
    fn size_rules() {
        let file = FsEntry::from_record(
            FsRecord::new("/f", EntryKind::RegularFile).with_content(ContentLocator(1), 42),
        );
        assert_eq!(file.size, 42);

        let dir = FsEntry::from_record(FsRecord::new("/d", EntryKind::Directory));
        assert_eq!(dir.size, DIRECTORY_SIZE);

        let link = FsEntry::from_record(FsRecord::new("/l", EntryKind::Symlink).with_target("../usr/bin"));
        assert_eq!(link.size, 10);

        let fifo = FsEntry::from_record(FsRecord::new("/p", EntryKind::Fifo));
        assert_eq!(fifo.size, 0);
    }

    #[test]
    fn mode_string_rendering() {
        assert_eq!(entry(EntryKind::Directory, 0o755).mode_string(), "drwxr-xr-x");
        assert_eq!(entry(EntryKind::RegularFile, 0o640).mode_string(), "-rw-r-----");
        assert_eq!(entry(EntryKind::Directory, 0o1777).mode_string(), "drwxrwxrwt");
        assert_eq!(entry(EntryKind::RegularFile, 0o4755).mode_string(), "-rwsr-xr-x");
        assert_eq!(entry(EntryKind::RegularFile, 0o4644).mode_string(), "-rwSr--r--");
    }

    #[test]
    fn write_permission_classes() {
        let dir = entry(EntryKind::Directory, 0o755);
        assert!(dir.permits_write(Credentials::ROOT));
        assert!(dir.permits_write(Credentials::new(1000, 1000)));
        assert!(!dir.permits_write(Credentials::new(1001, 1000)));
        assert!(!dir.permits_write(Credentials::new(1001, 1001)));

        let shared = entry(EntryKind::Directory, 0o775);
        assert!(shared.permits_write(Credentials::new(1001, 1000)));
    }

    #[test]
    fn read_permission_classes() {
        let secret = entry(EntryKind::RegularFile, 0o600);
        assert!(secret.permits_read(Credentials::new(1000, 1000)));
        assert!(!secret.permits_read(Credentials::new(1001, 1000)));
        assert!(secret.permits_read(Credentials::ROOT));
    }

    #[test]
    fn to_record_preserves_content_length() {
        let rec = FsRecord::new("/etc/hosts", EntryKind::RegularFile).with_content(ContentLocator(9), 120);
        let entry = FsEntry::from_record(rec.clone());
        assert_eq!(entry.to_record(), rec);
    }
}
