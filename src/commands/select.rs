use crate::error::{Error, Result};
use crate::selection::{SELECTED_STATEMENT_SLOT, SelectionCoordinator};
use crate::store::SqliteStore;
use crate::summary::summarize;
use crate::telemetry::load_records;
use std::path::Path;

pub fn run(file: &Path, digest: &str, state: &Path) -> Result<()> {
    let records = load_records(file)?;
    let summary = summarize(&records)?;

    let store = SqliteStore::open(state)?;
    let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT)?;
    coordinator.sync_statements(summary.ranked);
    coordinator.subscribe(|change| match &change.previous {
        Some(previous) => println!("Selection moved: {previous} -> {}", display(&change.current)),
        None => println!("Selected: {}", display(&change.current)),
    });

    if !coordinator.select(digest)? {
        return Err(Error::InvalidArgument(format!(
            "'{digest}' is not an eligible statement in this batch"
        )));
    }

    // Re-selecting the already-persisted digest emits no change event;
    // confirm the final state either way.
    println!("Current selection: {digest}");

    Ok(())
}

fn display(key: &Option<String>) -> &str {
    key.as_deref().unwrap_or("(none)")
}
