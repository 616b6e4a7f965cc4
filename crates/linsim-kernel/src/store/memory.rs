//! In-memory record store.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Mutex;

use linsim_types::{CollaboratorError, ContentLocator, FsRecord};

use super::{ContentStore, Mutation, MutationSink, RecordStore};

/// Records, payloads and a log of flushed mutations, all in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<FsRecord>,
    contents: HashMap<ContentLocator, Vec<u8>>,
    flushed: Mutex<Vec<Mutation>>,
    failure: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with `Unavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Build from records and payloads.
    pub fn from_parts(
        records: impl IntoIterator<Item = FsRecord>,
        contents: impl IntoIterator<Item = (ContentLocator, Vec<u8>)>,
    ) -> Self {
        Self {
            records: records.into_iter().collect(),
            contents: contents.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, record: FsRecord) {
        self.records.push(record);
    }

    pub fn put_content(&mut self, locator: ContentLocator, bytes: impl Into<Vec<u8>>) {
        self.contents.insert(locator, bytes.into());
    }

    /// Mutations flushed so far, oldest first.
    pub fn flushed(&self) -> Vec<Mutation> {
        self.flushed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        match &self.failure {
            Some(reason) => Err(CollaboratorError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn count(&self) -> Result<u64, CollaboratorError> {
        self.check()?;
        Ok(self.records.len() as u64)
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(FsRecord) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        self.check()?;
        for record in &self.records {
            if visit(record.clone()).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn end_scan(&self) {}
}

impl ContentStore for MemoryStore {
    fn fetch(&self, locator: ContentLocator) -> Result<Vec<u8>, CollaboratorError> {
        self.check()?;
        self.contents
            .get(&locator)
            .cloned()
            .ok_or_else(|| CollaboratorError::ContentMissing(locator.to_string()))
    }
}

impl MutationSink for MemoryStore {
    fn flush(&self, mutation: &Mutation) -> Result<(), CollaboratorError> {
        self.check()?;
        self.flushed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mutation.clone());
        Ok(())
    }
}
