//! linsim kernel: the simulated host's filesystem and shell.
//!
//! ```text
//! RecordStore ──load_tree──▶ FsTree ──▶ Vfs (RwLock) ──▶ ShellContext ──▶ Dispatcher
//!                                         │                                  │
//!                            ContentStore ◀── ContentProvider ◀──────────────┘
//! ```
//!
//! The tree holds metadata and content locators only. File payloads are
//! fetched from the [`store::ContentStore`] on every read.

pub mod content;
pub mod loader;
pub mod shell;
pub mod store;
pub mod vfs;

pub use content::ContentProvider;
pub use loader::load_tree;
pub use shell::{Dispatcher, ExecResult, HostInfo, Outcome, ShellContext, ShellSession};
pub use store::{ContentStore, MemoryStore, Mutation, MutationSink, RecordStore, SqliteStore};
pub use vfs::{FsTree, Listing, TreeBuilder, Vfs};

pub use linsim_types as types;
