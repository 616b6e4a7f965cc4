//! Startup load: record store → tree.

use std::ops::ControlFlow;

use linsim_types::{LoadError, StructuralError};
use tracing::{debug, info};

use crate::store::RecordStore;
use crate::vfs::{FsTree, TreeBuilder};

/// Percent granularity of progress callbacks.
const PROGRESS_STEP: u64 = 5;

/// Build the tree from every record in `store`.
///
/// `progress` receives `(loaded, total)` each time another 5 % of the
/// expected rows has been accepted. `end_scan` is called whether or not the
/// scan succeeds.
pub fn load_tree(
    store: &dyn RecordStore,
    mut progress: impl FnMut(u64, u64),
) -> Result<FsTree, LoadError> {
    let total = store.count()?;
    info!(total, "loading filesystem records");

    let mut builder = TreeBuilder::new();
    let mut failure: Option<StructuralError> = None;
    let mut loaded = 0u64;
    let mut next_step = 1u64;

    let scanned = store.scan(&mut |record| {
        if let Err(e) = builder.insert(record) {
            failure = Some(e);
            return ControlFlow::Break(());
        }
        loaded += 1;
        while total > 0 && next_step <= 100 / PROGRESS_STEP && loaded * 100 >= total * next_step * PROGRESS_STEP {
            progress(loaded, total);
            next_step += 1;
        }
        ControlFlow::Continue(())
    });
    store.end_scan();
    scanned?;

    if let Some(e) = failure {
        return Err(e.into());
    }
    debug!(loaded, "scan complete, linking");
    let tree = builder.finish()?;
    info!(entries = tree.len(), "filesystem loaded");
    Ok(tree)
}
