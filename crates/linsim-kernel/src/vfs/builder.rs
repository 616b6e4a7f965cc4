//! Bulk construction from an unordered record stream.
//!
//! Records may arrive in any order. An entry whose parent has not been seen
//! yet waits in `pending`, keyed by the missing parent path; when that
//! parent arrives everything waiting on it (and on its descendants) is
//! linked in one pass. Whatever is still pending when the stream ends is an
//! orphan.

use std::collections::{HashMap, HashSet};

use linsim_types::{ContentLocator, EntryKind, FsEntry, FsRecord, StructuralError};

use super::paths;
use super::tree::FsTree;

/// Incremental tree builder.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: FsTree,
    seen: HashSet<String>,
    pending: HashMap<String, Vec<FsEntry>>,
    inodes: HashMap<u64, (EntryKind, Option<ContentLocator>)>,
    max_inode: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records accepted so far, linked or pending.
    pub fn accepted(&self) -> usize {
        self.seen.len()
    }

    /// Accept one record.
    pub fn insert(&mut self, mut record: FsRecord) -> Result<(), StructuralError> {
        if !paths::is_normalized(&record.path) {
            return Err(StructuralError::CycleDetected(record.path));
        }
        let is_root = record.path == "/";
        if is_root {
            if !record.name.is_empty() && record.name != "/" {
                return Err(StructuralError::NameMismatch {
                    path: record.path,
                    name: record.name,
                });
            }
            if record.kind != EntryKind::Directory {
                return Err(StructuralError::RootNotDirectory);
            }
            record.name.clear();
        } else if record.name != paths::basename(&record.path) {
            return Err(StructuralError::NameMismatch {
                path: record.path,
                name: record.name,
            });
        }

        if self.seen.contains(&record.path) {
            return Err(StructuralError::DuplicatePath(record.path));
        }
        self.check_inode(&record)?;
        self.seen.insert(record.path.clone());
        self.max_inode = self.max_inode.max(record.inode);

        // Only the locator and the derived size survive past this point.
        let entry = FsEntry::from_record(record);
        if is_root {
            self.tree.attach(entry);
            return self.link_pending("/");
        }

        let parent = paths::parent(&entry.path).to_string();
        match self.tree.get(&parent).map(FsEntry::is_dir) {
            Some(false) => Err(StructuralError::ParentNotDirectory(entry.path)),
            Some(true) => {
                let path = entry.path.clone();
                self.tree.attach(entry);
                self.link_pending(&path)
            }
            None => {
                self.pending.entry(parent).or_default().push(entry);
                Ok(())
            }
        }
    }

    /// Finish the build.
    pub fn finish(mut self) -> Result<FsTree, StructuralError> {
        if self.tree.get("/").is_none() {
            return Err(StructuralError::MissingRoot);
        }
        if let Some(orphan) = self
            .pending
            .values()
            .flatten()
            .map(|entry| entry.path.as_str())
            .min()
        {
            return Err(StructuralError::OrphanEntry(orphan.to_string()));
        }
        self.tree.set_next_inode(self.max_inode + 1);
        Ok(self.tree)
    }

    /// Link everything waiting on `path`, then on each newly linked entry.
    fn link_pending(&mut self, path: &str) -> Result<(), StructuralError> {
        let mut ready = vec![path.to_string()];
        while let Some(parent) = ready.pop() {
            let Some(waiting) = self.pending.remove(&parent) else {
                continue;
            };
            let parent_is_dir = self.tree.is_dir(&parent);
            for entry in waiting {
                if !parent_is_dir {
                    return Err(StructuralError::ParentNotDirectory(entry.path));
                }
                ready.push(entry.path.clone());
                self.tree.attach(entry);
            }
        }
        Ok(())
    }

    fn check_inode(&mut self, record: &FsRecord) -> Result<(), StructuralError> {
        if record.inode == 0 {
            return Ok(());
        }
        let identity = (record.kind, record.content_locator);
        match self.inodes.get(&record.inode) {
            Some(known) if *known != identity => {
                Err(StructuralError::InodeConflict(record.path.clone()))
            }
            Some(_) => Ok(()),
            None => {
                self.inodes.insert(record.inode, identity);
                Ok(())
            }
        }
    }
}
