//! Persisted filesystem rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::EntryKind;

/// Opaque reference a content store uses to fetch a file's payload.
///
/// Never the payload itself. Entries that are hard links to the same inode
/// carry the same locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentLocator(pub i64);

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One filesystem row as supplied by a record store.
///
/// Records arrive in no particular order. The store computes `content_len`
/// without handing over the content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsRecord {
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
    /// Raw symlink target; only meaningful for symlinks.
    pub link_target: Option<String>,
    pub content_locator: Option<ContentLocator>,
    /// Byte length of the content behind `content_locator`.
    pub content_len: u64,
}

impl FsRecord {
    /// A record with zeroed metadata. The name is derived from the path.
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path.into();
        let name = basename(&path).to_string();
        let mode = match kind {
            EntryKind::Directory => 0o755,
            EntryKind::Symlink => 0o777,
            _ => 0o644,
        };
        Self {
            path,
            name,
            inode: 0,
            kind,
            mode,
            link_count: if kind == EntryKind::Directory { 2 } else { 1 },
            uid: 0,
            gid: 0,
            atime: 0,
            ctime: 0,
            mtime: 0,
            link_target: None,
            content_locator: None,
            content_len: 0,
        }
    }

    /// Builder: set the inode.
    pub fn with_inode(mut self, inode: u64) -> Self {
        self.inode = inode;
        self
    }

    /// Builder: set permission bits.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set owner.
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Builder: set all three timestamps.
    pub fn with_times(mut self, time: i64) -> Self {
        self.atime = time;
        self.ctime = time;
        self.mtime = time;
        self
    }

    /// Builder: attach content by locator and length.
    pub fn with_content(mut self, locator: ContentLocator, len: u64) -> Self {
        self.content_locator = Some(locator);
        self.content_len = len;
        self
    }

    /// Builder: set the symlink target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.link_target = Some(target.into());
        self
    }

    /// Builder: override the stored name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Final segment of a slash-separated path. `"/"` has the empty basename.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}
