//! Virtual filesystem.
//!
//! [`FsTree`] is the data structure; [`Vfs`] is the shared handle sessions
//! and listeners hold. Readers take a shared lock for the whole of a
//! multi-step traversal; a mutation holds the exclusive lock from
//! validation through flush, so no reader ever sees half of it.

mod builder;
pub mod paths;
mod tree;

pub use builder::TreeBuilder;
pub use tree::{FsTree, Listing, MAX_SYMLINK_HOPS};

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use linsim_types::OperationError;
use tracing::warn;

use crate::store::{Mutation, MutationSink, NullSink};

/// Shared, lock-protected filesystem tree.
pub struct Vfs {
    tree: RwLock<FsTree>,
    sink: Arc<dyn MutationSink>,
}

impl Vfs {
    /// Wrap a built tree. Mutations are flushed to `sink`.
    pub fn new(tree: FsTree, sink: Arc<dyn MutationSink>) -> Self {
        Self {
            tree: RwLock::new(tree),
            sink,
        }
    }

    /// A tree whose mutations are not persisted anywhere.
    pub fn detached(tree: FsTree) -> Self {
        Self::new(tree, Arc::new(NullSink))
    }

    /// Shared access.
    ///
    /// Poisoning is ignored: mutations validate before they apply, so a
    /// panicking writer cannot have left the tree half-changed.
    pub fn read(&self) -> RwLockReadGuard<'_, FsTree> {
        self.tree.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FsTree> {
        self.tree.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one mutation under the exclusive lock and flush what it changed.
    ///
    /// A flush failure is logged; the in-memory change stands.
    pub fn mutate<F>(&self, op: F) -> Result<Vec<Mutation>, OperationError>
    where
        F: FnOnce(&mut FsTree) -> Result<Vec<Mutation>, OperationError>,
    {
        let mut tree = self.write();
        let mutations = op(&mut tree)?;
        for mutation in &mutations {
            if let Err(e) = self.sink.flush(mutation) {
                warn!(?mutation, error = %e, "flush failed; tree and store have diverged");
            }
        }
        Ok(mutations)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for Vfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vfs").field("entries", &self.len()).finish()
    }
}
