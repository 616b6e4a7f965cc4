//! On-demand file content.

use std::sync::Arc;

use linsim_types::{FsEntry, OperationError};

use crate::store::ContentStore;

/// Fetches payloads through a [`ContentStore`]. Nothing is cached: every
/// read goes back to the store.
#[derive(Clone)]
pub struct ContentProvider {
    store: Arc<dyn ContentStore>,
}

impl ContentProvider {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Read the whole payload of a regular file.
    ///
    /// A file without a locator is empty.
    pub fn read(&self, entry: &FsEntry) -> Result<Vec<u8>, OperationError> {
        if !entry.is_file() {
            return Err(OperationError::NotReadable(entry.path.clone()));
        }
        match entry.content_locator {
            Some(locator) => Ok(self.store.fetch(locator)?),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for ContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use linsim_types::{CollaboratorError, ContentLocator, EntryKind, FsRecord};

    fn provider() -> ContentProvider {
        let mut store = MemoryStore::new();
        store.put_content(ContentLocator(1), "root:x:0:0::/root:/bin/bash\n");
        ContentProvider::new(Arc::new(store))
    }

    #[test]
    fn reads_regular_files() {
        let entry = FsEntry::from_record(
            FsRecord::new("/etc/passwd", EntryKind::RegularFile).with_content(ContentLocator(1), 28),
        );
        let bytes = provider().read(&entry).unwrap();
        assert_eq!(bytes.len() as u64, entry.size);
    }

    #[test]
    fn directories_are_not_readable() {
        let entry = FsEntry::from_record(FsRecord::new("/etc", EntryKind::Directory));
        assert_eq!(
            provider().read(&entry).unwrap_err(),
            OperationError::NotReadable("/etc".into())
        );
    }

    #[test]
    fn missing_locator_is_empty() {
        let entry = FsEntry::from_record(FsRecord::new("/empty", EntryKind::RegularFile));
        assert!(provider().read(&entry).unwrap().is_empty());
    }

    #[test]
    fn store_errors_surface_as_collaborator_errors() {
        let entry = FsEntry::from_record(
            FsRecord::new("/lost", EntryKind::RegularFile).with_content(ContentLocator(99), 4),
        );
        assert_eq!(
            provider().read(&entry).unwrap_err(),
            OperationError::Collaborator(CollaboratorError::ContentMissing("#99".into()))
        );
    }
}
