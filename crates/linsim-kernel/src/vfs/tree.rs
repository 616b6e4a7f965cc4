//! The filesystem tree.
//!
//! Entries live in an arena keyed by normalized path. Parent/child edges are
//! a second index from directory path to child names in insertion order, so
//! a rename or delete never leaves a dangling node reference behind: callers
//! hold paths and ask the tree again.
//!
//! Every mutating method validates completely before it touches either
//! index. On `Err` the tree is exactly as it was.

use std::collections::HashMap;

use linsim_types::{
    Credentials, EntryKind, FsEntry, FsRecord, OperationError, ResolveError, StructuralError,
};

use super::paths;
use crate::store::Mutation;

/// Maximum symlink substitutions during one resolution.
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Snapshot of a directory's child names.
///
/// Iteration borrows the snapshot, so a listing can be walked any number of
/// times. Order is directory-insertion order until [`Listing::sorted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    dir: String,
    names: Vec<String>,
}

impl Listing {
    /// Path of the listed directory.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Full paths of the children.
    pub fn paths(&self) -> impl Iterator<Item = String> + '_ {
        self.names.iter().map(|name| paths::join(&self.dir, name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Byte-wise lexicographic order.
    pub fn sorted(mut self) -> Self {
        self.names.sort();
        self
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter().map(String::as_str as fn(&'a String) -> &'a str)
    }
}

/// Path index plus parent→children index.
#[derive(Debug, Clone, Default)]
pub struct FsTree {
    entries: HashMap<String, FsEntry>,
    children: HashMap<String, Vec<String>>,
    next_inode: u64,
}

impl FsTree {
    // ------------------------------------------------------------------
    // Construction (used by the builder)
    // ------------------------------------------------------------------

    pub(crate) fn set_next_inode(&mut self, next: u64) {
        self.next_inode = next.max(1);
    }

    /// Index `entry` under its parent, which must already be indexed.
    pub(crate) fn attach(&mut self, entry: FsEntry) {
        if entry.is_dir() {
            self.children.entry(entry.path.clone()).or_default();
        }
        if entry.path != "/" {
            self.children
                .entry(paths::parent(&entry.path).to_string())
                .or_default()
                .push(entry.name.clone());
        }
        self.entries.insert(entry.path.clone(), entry);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, path: &str) -> Option<&FsEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(FsEntry::is_dir)
    }

    /// Number of entries, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FsEntry> {
        self.entries.values()
    }

    /// Inode the next created entry receives.
    pub fn next_inode(&self) -> u64 {
        self.next_inode
    }

    /// Children of the directory at `path`.
    pub fn children(&self, path: &str) -> Result<Listing, OperationError> {
        let entry = self
            .entries
            .get(path)
            .ok_or_else(|| ResolveError::not_found(path, path))?;
        if !entry.is_dir() {
            return Err(OperationError::NotADirectory(path.to_string()));
        }
        Ok(Listing {
            dir: path.to_string(),
            names: self.children.get(path).cloned().unwrap_or_default(),
        })
    }

    pub fn child_count(&self, path: &str) -> usize {
        self.children.get(path).map_or(0, Vec::len)
    }

    /// Every parent→child edge as `(parent, child)` paths, sorted.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<_> = self
            .children
            .iter()
            .flat_map(|(dir, names)| {
                names
                    .iter()
                    .map(move |name| (dir.clone(), paths::join(dir, name)))
            })
            .collect();
        edges.sort();
        edges
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve `input` relative to `cwd` to the path of an indexed entry.
    ///
    /// A final symlink is returned as-is. Symlinks in leading segments are
    /// substituted.
    pub fn resolve(&self, cwd: &str, input: &str) -> Result<String, ResolveError> {
        self.lookup(&paths::normalize(cwd, input))
    }

    /// Resolve an already-normalized absolute path.
    pub fn lookup(&self, path: &str) -> Result<String, ResolveError> {
        if self.entries.contains_key(path) {
            return Ok(path.to_string());
        }

        let mut current = path.to_string();
        let mut hops = 0;
        loop {
            let mut substituted = None;
            for prefix in paths::prefixes(&current) {
                let Some(entry) = self.entries.get(prefix) else {
                    return Err(ResolveError::not_found(path, prefix));
                };
                if prefix.len() == current.len() {
                    break;
                }
                if entry.is_symlink() {
                    let target = entry.link_target.as_deref().unwrap_or("");
                    let base = paths::normalize(paths::parent(prefix), target);
                    let rest = &current[prefix.len()..];
                    substituted = Some(paths::normalize(&base, rest.trim_start_matches('/')));
                    break;
                }
                if !entry.is_dir() {
                    return Err(ResolveError::NotADirectory(path.to_string()));
                }
            }
            match substituted {
                Some(next) => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(ResolveError::TooManyLinks(path.to_string()));
                    }
                    if self.entries.contains_key(&next) {
                        return Ok(next);
                    }
                    current = next;
                }
                None => return Ok(current),
            }
        }
    }

    /// Dereference a chain of symlinks ending at `path`.
    pub fn follow(&self, path: &str) -> Result<String, ResolveError> {
        let mut current = path.to_string();
        for _ in 0..=MAX_SYMLINK_HOPS {
            let entry = self
                .entries
                .get(&current)
                .ok_or_else(|| ResolveError::not_found(path, current.as_str()))?;
            if !entry.is_symlink() {
                return Ok(current);
            }
            let target = entry.link_target.as_deref().unwrap_or("");
            let next = paths::normalize(paths::parent(&current), target);
            current = match self.lookup(&next) {
                Ok(found) => found,
                Err(ResolveError::NotFound { missing, .. }) => {
                    return Err(ResolveError::NotFound {
                        path: path.to_string(),
                        missing,
                    });
                }
                Err(e) => return Err(e),
            };
        }
        Err(ResolveError::TooManyLinks(path.to_string()))
    }

    /// Structural check of both indexes.
    pub fn check_invariants(&self) -> Result<(), StructuralError> {
        let root = self.entries.get("/").ok_or(StructuralError::MissingRoot)?;
        if !root.is_dir() {
            return Err(StructuralError::RootNotDirectory);
        }
        for (path, entry) in &self.entries {
            if path != &entry.path {
                return Err(StructuralError::NameMismatch {
                    path: path.clone(),
                    name: entry.path.clone(),
                });
            }
            if path == "/" {
                continue;
            }
            if !paths::is_normalized(path) {
                return Err(StructuralError::CycleDetected(path.clone()));
            }
            if entry.name != paths::basename(path) {
                return Err(StructuralError::NameMismatch {
                    path: path.clone(),
                    name: entry.name.clone(),
                });
            }
            let parent = paths::parent(path);
            match self.entries.get(parent) {
                None => return Err(StructuralError::OrphanEntry(path.clone())),
                Some(p) if !p.is_dir() => {
                    return Err(StructuralError::ParentNotDirectory(path.clone()));
                }
                Some(_) => {}
            }
            let linked = self
                .children
                .get(parent)
                .is_some_and(|names| names.iter().any(|n| n == &entry.name));
            if !linked {
                return Err(StructuralError::OrphanEntry(path.clone()));
            }
        }
        for (dir, names) in &self.children {
            let mut seen = std::collections::HashSet::new();
            for name in names {
                let child = paths::join(dir, name);
                if !seen.insert(name) {
                    return Err(StructuralError::DuplicatePath(child));
                }
                if !self.entries.contains_key(&child) {
                    return Err(StructuralError::OrphanEntry(child));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create one regular file or directory. The parent must exist.
    pub fn create(
        &mut self,
        path: &str,
        kind: EntryKind,
        cred: Credentials,
        now: i64,
    ) -> Result<Vec<Mutation>, OperationError> {
        if kind == EntryKind::Symlink {
            return Err(OperationError::InvalidArgument(format!(
                "{path}: symlinks need a target"
            )));
        }
        let target = self.placement(path)?;
        if self.entries.contains_key(&target) {
            return Err(OperationError::AlreadyExists(target));
        }
        self.require_write(paths::parent(&target), cred)?;

        let record = self.new_record(&target, kind, cred, now);
        self.attach(FsEntry::from_record(record.clone()));
        Ok(vec![Mutation::Created(record)])
    }

    /// Create a directory and any missing ancestors.
    ///
    /// Existing directories along the way are accepted, including `path`.
    pub fn create_dir_all(
        &mut self,
        path: &str,
        cred: Credentials,
        now: i64,
    ) -> Result<Vec<Mutation>, OperationError> {
        let mut missing = Vec::new();
        let mut cursor = path.to_string();
        let base = loop {
            match self.lookup(&cursor) {
                Ok(found) => break self.follow(&found)?,
                Err(ResolveError::NotFound { .. }) if cursor != "/" => {
                    missing.push(paths::basename(&cursor).to_string());
                    cursor = paths::parent(&cursor).to_string();
                }
                Err(e) => return Err(e.into()),
            }
        };

        if !self.is_dir(&base) {
            return Err(if missing.is_empty() {
                OperationError::AlreadyExists(path.to_string())
            } else {
                OperationError::NotADirectory(base)
            });
        }
        if missing.is_empty() {
            return Ok(Vec::new());
        }
        self.require_write(&base, cred)?;

        let mut out = Vec::with_capacity(missing.len());
        let mut dir = base;
        for name in missing.iter().rev() {
            let child = paths::join(&dir, name);
            let record = self.new_record(&child, EntryKind::Directory, cred, now);
            self.attach(FsEntry::from_record(record.clone()));
            out.push(Mutation::Created(record));
            dir = child;
        }
        Ok(out)
    }

    /// Remove the entry at `path` (an indexed path, symlinks not followed).
    ///
    /// A non-empty directory needs `recursive`.
    pub fn remove(
        &mut self,
        path: &str,
        recursive: bool,
        cred: Credentials,
    ) -> Result<Vec<Mutation>, OperationError> {
        if path == "/" {
            return Err(OperationError::PermissionDenied(path.to_string()));
        }
        if !self.entries.contains_key(path) {
            return Err(ResolveError::not_found(path, path).into());
        }
        if !recursive && self.child_count(path) > 0 {
            return Err(OperationError::DirectoryNotEmpty(path.to_string()));
        }
        self.require_write(paths::parent(path), cred)?;
        Ok(self.detach(path))
    }

    /// Move the entry at `from` (and its subtree) to `to`.
    ///
    /// An existing directory at `to` receives the entry under its own name.
    /// An existing non-directory at the destination is replaced when the
    /// source is not a directory either.
    pub fn rename(
        &mut self,
        from: &str,
        to: &str,
        cred: Credentials,
        now: i64,
    ) -> Result<Vec<Mutation>, OperationError> {
        if from == "/" {
            return Err(OperationError::PermissionDenied(from.to_string()));
        }
        let source_is_dir = match self.entries.get(from) {
            Some(entry) => entry.is_dir(),
            None => return Err(ResolveError::not_found(from, from).into()),
        };
        let target = self.destination(to, paths::basename(from))?;
        if target == from {
            return Ok(Vec::new());
        }
        if source_is_dir && paths::is_within(&target, from) {
            return Err(OperationError::InvalidArgument(format!(
                "cannot move '{from}' to a subdirectory of itself, '{target}'"
            )));
        }
        let replaces = match self.entries.get(&target) {
            None => false,
            Some(existing) if existing.is_dir() => {
                return Err(if source_is_dir {
                    OperationError::AlreadyExists(target)
                } else {
                    OperationError::IsADirectory(target)
                });
            }
            Some(_) if source_is_dir => return Err(OperationError::NotADirectory(target)),
            Some(_) => true,
        };
        self.require_write(paths::parent(from), cred)?;
        self.require_write(paths::parent(&target), cred)?;

        let mut out = Vec::new();
        if replaces {
            out.extend(self.detach(&target));
        }
        self.move_subtree(from, &target, now);
        out.push(Mutation::Renamed {
            from: from.to_string(),
            to: target,
        });
        Ok(out)
    }

    /// Add a hard link at `link` to the non-directory at `existing`.
    pub fn hard_link(
        &mut self,
        existing: &str,
        link: &str,
        cred: Credentials,
    ) -> Result<Vec<Mutation>, OperationError> {
        let source = match self.entries.get(existing) {
            Some(entry) if entry.is_dir() => {
                return Err(OperationError::PermissionDenied(existing.to_string()));
            }
            Some(entry) => entry.clone(),
            None => return Err(ResolveError::not_found(existing, existing).into()),
        };
        let target = self.destination(link, paths::basename(existing))?;
        if self.entries.contains_key(&target) {
            return Err(OperationError::AlreadyExists(target));
        }
        self.require_write(paths::parent(&target), cred)?;

        let inode = if source.inode == 0 {
            let fresh = self.next_inode;
            self.next_inode += 1;
            fresh
        } else {
            source.inode
        };
        let link_count = source.link_count.saturating_add(1);

        let mut relinked = Vec::new();
        for entry in self.entries.values_mut() {
            let shares = if source.inode == 0 {
                entry.path == existing
            } else {
                entry.inode == source.inode
            };
            if shares {
                entry.inode = inode;
                entry.link_count = link_count;
                relinked.push(Mutation::Relinked {
                    path: entry.path.clone(),
                    inode,
                    link_count,
                });
            }
        }

        let mut linked = source;
        linked.name = paths::basename(&target).to_string();
        linked.path = target;
        linked.inode = inode;
        linked.link_count = link_count;
        let record = linked.to_record();
        self.attach(linked);

        let mut out = vec![Mutation::Created(record)];
        out.extend(relinked);
        Ok(out)
    }

    /// Create a symlink at `link` whose raw target is `target`.
    pub fn symlink(
        &mut self,
        target: &str,
        link: &str,
        cred: Credentials,
        now: i64,
    ) -> Result<Vec<Mutation>, OperationError> {
        if target.is_empty() {
            return Err(OperationError::InvalidArgument(
                "cannot create symlink with empty target".to_string(),
            ));
        }
        let dest = self.destination(link, paths::basename(target.trim_end_matches('/')))?;
        if self.entries.contains_key(&dest) {
            return Err(OperationError::AlreadyExists(dest));
        }
        self.require_write(paths::parent(&dest), cred)?;

        let record = self
            .new_record(&dest, EntryKind::Symlink, cred, now)
            .with_target(target);
        self.attach(FsEntry::from_record(record.clone()));
        Ok(vec![Mutation::Created(record)])
    }

    /// Update access and modification times, creating an empty file when
    /// nothing exists at `path`.
    pub fn touch(
        &mut self,
        path: &str,
        cred: Credentials,
        now: i64,
    ) -> Result<Vec<Mutation>, OperationError> {
        let real = match self.lookup(path).and_then(|found| self.follow(&found)) {
            Ok(real) => real,
            Err(ResolveError::NotFound { .. }) => {
                return self.create(path, EntryKind::RegularFile, cred, now);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(entry) = self.entries.get_mut(&real) else {
            return Err(ResolveError::not_found(path, real).into());
        };
        if cred.uid != entry.uid && !entry.permits_write(cred) {
            return Err(OperationError::PermissionDenied(real));
        }
        entry.atime = now;
        entry.mtime = now;
        Ok(vec![Mutation::Touched {
            path: real,
            atime: now,
            mtime: now,
        }])
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn new_record(&mut self, path: &str, kind: EntryKind, cred: Credentials, now: i64) -> FsRecord {
        let inode = self.next_inode;
        self.next_inode += 1;
        FsRecord::new(path, kind)
            .with_inode(inode)
            .with_owner(cred.uid, cred.gid)
            .with_times(now)
    }

    fn require_write(&self, dir: &str, cred: Credentials) -> Result<(), OperationError> {
        match self.entries.get(dir) {
            Some(entry) if entry.permits_write(cred) => Ok(()),
            Some(_) => Err(OperationError::PermissionDenied(dir.to_string())),
            None => Err(ResolveError::not_found(dir, dir).into()),
        }
    }

    /// Real path a new entry named by `path` would occupy: the parent is
    /// resolved and dereferenced, the final segment kept.
    fn placement(&self, path: &str) -> Result<String, OperationError> {
        if path == "/" {
            return Err(OperationError::AlreadyExists(path.to_string()));
        }
        let parent = self.follow(&self.lookup(paths::parent(path))?)?;
        if !self.is_dir(&parent) {
            return Err(OperationError::NotADirectory(parent));
        }
        Ok(paths::join(&parent, paths::basename(path)))
    }

    /// Like [`placement`](Self::placement), but an existing directory at
    /// `path` means "inside it, as `name`".
    fn destination(&self, path: &str, name: &str) -> Result<String, OperationError> {
        if let Ok(dir) = self.lookup(path).and_then(|found| self.follow(&found)) {
            if self.is_dir(&dir) {
                if name.is_empty() {
                    return Err(OperationError::InvalidArgument(format!(
                        "{path}: missing destination name"
                    )));
                }
                return Ok(paths::join(&dir, name));
            }
        }
        self.placement(path)
    }

    /// Paths of the subtree rooted at `path`, parents before children.
    fn subtree(&self, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![path.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(names) = self.children.get(&current) {
                stack.extend(names.iter().rev().map(|name| paths::join(&current, name)));
            }
            out.push(current);
        }
        out
    }

    /// Unlink a subtree and decrement the link count of surviving hard
    /// links to anything removed.
    fn detach(&mut self, path: &str) -> Vec<Mutation> {
        let parent = paths::parent(path).to_string();
        let name = paths::basename(path).to_string();
        if let Some(names) = self.children.get_mut(&parent) {
            names.retain(|n| n != &name);
        }

        let mut dropped_links = Vec::new();
        for gone in self.subtree(path) {
            self.children.remove(&gone);
            if let Some(entry) = self.entries.remove(&gone) {
                if !entry.is_dir() && entry.inode != 0 && entry.link_count > 1 {
                    dropped_links.push(entry.inode);
                }
            }
        }

        let mut out = vec![Mutation::Removed {
            path: path.to_string(),
        }];
        for inode in dropped_links {
            for entry in self.entries.values_mut().filter(|e| e.inode == inode) {
                entry.link_count = entry.link_count.saturating_sub(1).max(1);
                out.push(Mutation::Relinked {
                    path: entry.path.clone(),
                    inode,
                    link_count: entry.link_count,
                });
            }
        }
        out
    }

    fn move_subtree(&mut self, from: &str, to: &str, now: i64) {
        let old_parent = paths::parent(from).to_string();
        let old_name = paths::basename(from).to_string();
        if let Some(names) = self.children.get_mut(&old_parent) {
            names.retain(|n| n != &old_name);
        }

        let moved = self.subtree(from);
        let mut entries = Vec::with_capacity(moved.len());
        let mut kids = Vec::new();
        for path in &moved {
            if let Some(entry) = self.entries.remove(path) {
                entries.push(entry);
            }
            if let Some(names) = self.children.remove(path) {
                kids.push((paths::rebase(path, from, to), names));
            }
        }
        for mut entry in entries {
            entry.path = paths::rebase(&entry.path, from, to);
            if entry.path == to {
                entry.name = paths::basename(to).to_string();
                entry.ctime = now;
            }
            self.entries.insert(entry.path.clone(), entry);
        }
        self.children.extend(kids);
        self.children
            .entry(paths::parent(to).to_string())
            .or_default()
            .push(paths::basename(to).to_string());
    }
}
