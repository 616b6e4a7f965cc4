//! Per-session shell state.

use std::collections::BTreeMap;
use std::sync::Arc;

use linsim_types::{Credentials, EntryKind, FsEntry, OperationError, ResolveError};
use tracing::debug;

use super::accounts::Accounts;
use super::host::HostInfo;
use super::registry::CommandTable;
use crate::content::ContentProvider;
use crate::vfs::{paths, FsTree, Listing, Vfs};

/// Default `$PATH`.
const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Everything a command handler may touch.
///
/// Owned by one session thread. The tree behind it is shared; the working
/// directory and environment are not. Nothing reachable from here touches
/// the real host.
pub struct ShellContext {
    vfs: Arc<Vfs>,
    content: ContentProvider,
    host: Arc<HostInfo>,
    commands: Arc<CommandTable>,
    cwd: String,
    env: BTreeMap<String, String>,
    user: String,
    home: String,
    cred: Credentials,
    last_status: i32,
}

impl ShellContext {
    /// Log `user` in. Identity and home come from the virtual
    /// `/etc/passwd`; an unknown `root` gets uid 0 and `/root`.
    pub fn login(
        vfs: Arc<Vfs>,
        content: ContentProvider,
        host: Arc<HostInfo>,
        commands: Arc<CommandTable>,
        user: &str,
    ) -> Self {
        let accounts = Accounts::load(&vfs, &content);
        let (cred, home) = match accounts.user(user) {
            Some(record) => (Credentials::new(record.uid, record.gid), record.home.clone()),
            None if user == "root" => (Credentials::ROOT, "/root".to_string()),
            None => (Credentials::new(1000, 1000), format!("/home/{user}")),
        };
        let cwd = {
            let tree = vfs.read();
            match tree.lookup(&home).and_then(|p| tree.follow(&p)) {
                Ok(real) if tree.is_dir(&real) => real,
                _ => "/".to_string(),
            }
        };

        let mut env = BTreeMap::new();
        env.insert("HOME".to_string(), home.clone());
        env.insert("USER".to_string(), user.to_string());
        env.insert("LOGNAME".to_string(), user.to_string());
        env.insert("SHELL".to_string(), host.shell_path());
        env.insert("PATH".to_string(), DEFAULT_PATH.to_string());
        env.insert("PWD".to_string(), cwd.clone());
        env.insert("HOSTNAME".to_string(), host.short_name.clone());
        env.insert("TERM".to_string(), "xterm".to_string());

        debug!(user, uid = cred.uid, cwd = %cwd, "session context opened");
        Self {
            vfs,
            content,
            host,
            commands,
            cwd,
            env,
            user: user.to_string(),
            home,
            cred,
            last_status: 0,
        }
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Change directory. Symlinks are followed; the stored path is real.
    pub fn set_cwd(&mut self, input: &str) -> Result<String, OperationError> {
        let target = self.resolve_follow(input)?;
        if !self.vfs.read().is_dir(&target) {
            return Err(OperationError::NotADirectory(input.to_string()));
        }
        let previous = std::mem::replace(&mut self.cwd, target.clone());
        self.env.insert("OLDPWD".to_string(), previous);
        self.env.insert("PWD".to_string(), target.clone());
        Ok(target)
    }

    /// Move the working directory to its nearest existing ancestor if a
    /// mutation removed it.
    pub(crate) fn ensure_cwd(&mut self) {
        let fallback = {
            let tree = self.vfs.read();
            if tree.is_dir(&self.cwd) {
                return;
            }
            let mut candidate = paths::parent(&self.cwd).to_string();
            while !tree.is_dir(&candidate) && candidate != "/" {
                candidate = paths::parent(&candidate).to_string();
            }
            candidate
        };
        debug!(from = %self.cwd, to = %fallback, "working directory vanished");
        self.cwd = fallback.clone();
        self.env.insert("PWD".to_string(), fallback);
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn credentials(&self) -> Credentials {
        self.cred
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub(crate) fn set_last_status(&mut self, code: i32) {
        self.last_status = code;
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    pub fn unset_var(&mut self, name: &str) {
        self.env.remove(name);
    }

    /// Environment, sorted by name.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `(name, description)` of every command, sorted.
    pub fn command_summaries(&self) -> Vec<(&str, &str)> {
        self.commands
            .schemas()
            .into_iter()
            .map(|s| (s.name, s.description))
            .collect()
    }

    // ------------------------------------------------------------------
    // Filesystem reads
    // ------------------------------------------------------------------

    /// Lexically absolute form of `input`.
    pub fn absolute(&self, input: &str) -> String {
        paths::normalize(&self.cwd, input)
    }

    /// Resolve without following a final symlink.
    pub fn resolve(&self, input: &str) -> Result<String, ResolveError> {
        self.vfs.read().resolve(&self.cwd, input)
    }

    /// Resolve and follow a final symlink.
    pub fn resolve_follow(&self, input: &str) -> Result<String, ResolveError> {
        let tree = self.vfs.read();
        let found = tree.resolve(&self.cwd, input)?;
        tree.follow(&found)
    }

    /// Entry named by `input`.
    pub fn entry(&self, input: &str, follow: bool) -> Result<FsEntry, ResolveError> {
        let tree = self.vfs.read();
        let mut path = tree.resolve(&self.cwd, input)?;
        if follow {
            path = tree.follow(&path)?;
        }
        tree.get(&path)
            .cloned()
            .ok_or_else(|| ResolveError::not_found(input, path))
    }

    /// Children of a directory.
    pub fn list(&self, path: &str) -> Result<Listing, OperationError> {
        self.vfs.read().children(path)
    }

    /// Run several reads against one consistent view of the tree.
    pub fn snapshot<R>(&self, f: impl FnOnce(&FsTree) -> R) -> R {
        f(&self.vfs.read())
    }

    /// Payload of a regular file, subject to read permission.
    pub fn read(&self, entry: &FsEntry) -> Result<Vec<u8>, OperationError> {
        if entry.is_dir() {
            return Err(OperationError::IsADirectory(entry.path.clone()));
        }
        if !entry.permits_read(self.cred) {
            return Err(OperationError::PermissionDenied(entry.path.clone()));
        }
        self.content.read(entry)
    }

    /// Follow `input` and read it.
    pub fn read_file(&self, input: &str) -> Result<Vec<u8>, OperationError> {
        let entry = self.entry(input, true)?;
        self.read(&entry)
    }

    /// Account databases, freshly read.
    pub fn accounts(&self) -> Accounts {
        Accounts::load(&self.vfs, &self.content)
    }

    // ------------------------------------------------------------------
    // Filesystem mutations
    // ------------------------------------------------------------------

    /// `mkdir`, optionally creating ancestors.
    pub fn create_dir(&self, input: &str, parents: bool) -> Result<(), OperationError> {
        let path = self.absolute(input);
        let cred = self.cred;
        let now = now();
        self.vfs
            .mutate(|tree| {
                if parents {
                    tree.create_dir_all(&path, cred, now)
                } else {
                    tree.create(&path, EntryKind::Directory, cred, now)
                }
            })
            .map(drop)
    }

    /// Remove an entry; symlinks themselves are removed, never their
    /// targets. Directories need `recursive`.
    pub fn remove(&self, input: &str, recursive: bool) -> Result<(), OperationError> {
        let cred = self.cred;
        self.vfs
            .mutate(|tree| {
                let path = tree.resolve(&self.cwd, input)?;
                if !recursive && tree.is_dir(&path) {
                    return Err(OperationError::IsADirectory(path));
                }
                tree.remove(&path, recursive, cred)
            })
            .map(drop)
    }

    /// Remove an empty directory.
    pub fn remove_dir(&self, input: &str) -> Result<(), OperationError> {
        let cred = self.cred;
        self.vfs
            .mutate(|tree| {
                let path = tree.resolve(&self.cwd, input)?;
                if !tree.is_dir(&path) {
                    return Err(OperationError::NotADirectory(path));
                }
                tree.remove(&path, false, cred)
            })
            .map(drop)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), OperationError> {
        let to = self.absolute(to);
        let cred = self.cred;
        let now = now();
        self.vfs
            .mutate(|tree| {
                let source = tree.resolve(&self.cwd, from)?;
                tree.rename(&source, &to, cred, now)
            })
            .map(drop)
    }

    pub fn hard_link(&self, existing: &str, link: &str) -> Result<(), OperationError> {
        let link = self.absolute(link);
        let cred = self.cred;
        self.vfs
            .mutate(|tree| {
                let source = tree.resolve(&self.cwd, existing)?;
                tree.hard_link(&source, &link, cred)
            })
            .map(drop)
    }

    /// Create a symlink at `link` holding `target` verbatim.
    pub fn symlink(&self, target: &str, link: &str) -> Result<(), OperationError> {
        let link = self.absolute(link);
        let cred = self.cred;
        let now = now();
        self.vfs
            .mutate(|tree| tree.symlink(target, &link, cred, now))
            .map(drop)
    }

    pub fn touch(&self, input: &str) -> Result<(), OperationError> {
        let path = self.absolute(input);
        let cred = self.cred;
        let now = now();
        self.vfs.mutate(|tree| tree.touch(&path, cred, now)).map(drop)
    }
}

impl std::fmt::Debug for ShellContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellContext")
            .field("user", &self.user)
            .field("cwd", &self.cwd)
            .field("last_status", &self.last_status)
            .finish_non_exhaustive()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
