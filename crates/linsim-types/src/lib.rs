//! linsim-types: Pure data types for linsim.
//!
//! This crate contains the types shared between the kernel, the record store
//! adapters, and the server. No I/O lives here.
//!
//! - [`FsRecord`]: one persisted filesystem row, as a store hands it over
//! - [`FsEntry`]: the in-memory entry the tree owns, derived from a record
//! - [`EntryKind`], [`ContentLocator`], [`Credentials`]
//! - The error taxonomy: structural, resolution, operation, collaborator

mod entry;
mod error;
mod record;

pub use entry::{Credentials, EntryKind, FsEntry, DIRECTORY_SIZE};
pub use error::{CollaboratorError, LoadError, OperationError, ResolveError, StructuralError};
pub use record::{ContentLocator, FsRecord};
