//! Error taxonomy.
//!
//! | Category | Raised by | Recoverable |
//! |----------|-----------|-------------|
//! | [`StructuralError`] | bulk load | no, startup aborts |
//! | [`ResolveError`] | path resolution | yes, command output |
//! | [`OperationError`] | mutations, content reads | yes, tree unchanged |
//! | [`CollaboratorError`] | record/content store | at call sites; fatal during load |

use thiserror::Error;

/// A record set that cannot form a valid tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("no root directory entry (\"/\") in record set")]
    MissingRoot,

    #[error("root entry is not a directory")]
    RootNotDirectory,

    #[error("orphan entry {0}: parent directory never loaded")]
    OrphanEntry(String),

    #[error("duplicate path {0}")]
    DuplicatePath(String),

    #[error("cycle detected at {0}")]
    CycleDetected(String),

    #[error("parent of {0} is not a directory")]
    ParentNotDirectory(String),

    #[error("entry {path} has name {name:?}, expected basename of path")]
    NameMismatch { path: String, name: String },

    #[error("entry {0} disagrees on kind or content with another link to the same inode")]
    InodeConflict(String),
}

/// Path resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// `missing` is the shortest prefix of `path` that does not exist.
    #[error("{path}: No such file or directory")]
    NotFound { path: String, missing: String },

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Too many levels of symbolic links")]
    TooManyLinks(String),
}

impl ResolveError {
    pub fn not_found(path: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            missing: missing.into(),
        }
    }
}

/// Failure of a collaborator (record store, content store, flush sink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("malformed row: {0}")]
    BadRow(String),

    #[error("content {0} not found in store")]
    ContentMissing(String),
}

/// Failure of a command-level operation. The tree is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("{0}: Not a regular file")]
    NotReadable(String),

    #[error("{0}: Directory not empty")]
    DirectoryNotEmpty(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: File exists")]
    AlreadyExists(String),

    #[error("{0}: Permission denied")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Failure of the mandatory startup load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("filesystem invariant violated: {0}")]
    Structural(#[from] StructuralError),

    #[error("record store failed during load: {0}")]
    Collaborator(#[from] CollaboratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_messages_read_like_coreutils() {
        let err = OperationError::DirectoryNotEmpty("/tmp".into());
        assert_eq!(err.to_string(), "/tmp: Directory not empty");

        let err: OperationError = ResolveError::not_found("/nope/x", "/nope").into();
        assert_eq!(err.to_string(), "/nope/x: No such file or directory");
    }

    #[test]
    fn load_error_wraps_structural() {
        let err: LoadError = StructuralError::OrphanEntry("/a/b/c".into()).into();
        assert!(err.to_string().contains("/a/b/c"));
    }
}
