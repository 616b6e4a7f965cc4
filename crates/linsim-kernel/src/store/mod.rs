//! Record store collaborators.
//!
//! The kernel talks to persistence through three narrow traits:
//!
//! - [`RecordStore`]: count and scan the flat filesystem rows at startup
//! - [`ContentStore`]: fetch one file's payload by locator
//! - [`MutationSink`]: persist one tree mutation after it was applied
//!
//! [`SqliteStore`] implements all three over a single table.
//! [`MemoryStore`] implements them in memory for tests and demos.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{Content, SqliteStore};

use std::ops::ControlFlow;

use linsim_types::{CollaboratorError, ContentLocator, FsRecord};
use serde::Serialize;

/// Source of filesystem rows.
pub trait RecordStore: Send + Sync {
    /// Number of rows. Used for progress reporting only.
    fn count(&self) -> Result<u64, CollaboratorError>;

    /// Stream every row to `visit`, in no particular order, until it
    /// returns `Break`.
    fn scan(
        &self,
        visit: &mut dyn FnMut(FsRecord) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError>;

    /// Release whatever the scan held open.
    fn end_scan(&self);
}

/// Source of file payloads.
pub trait ContentStore: Send + Sync {
    fn fetch(&self, locator: ContentLocator) -> Result<Vec<u8>, CollaboratorError>;
}

/// Destination for tree mutations.
pub trait MutationSink: Send + Sync {
    fn flush(&self, mutation: &Mutation) -> Result<(), CollaboratorError>;
}

/// One applied change to the tree, in terms a store can replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Mutation {
    /// A new entry. Content, if any, is shared through its locator.
    Created(FsRecord),
    /// An entry and everything beneath it went away.
    Removed { path: String },
    /// An entry and everything beneath it moved.
    Renamed { from: String, to: String },
    Touched { path: String, atime: i64, mtime: i64 },
    /// Inode or link count of one entry changed.
    Relinked { path: String, inode: u64, link_count: u32 },
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MutationSink for NullSink {
    fn flush(&self, _mutation: &Mutation) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
