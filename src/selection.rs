use crate::error::Result;
use crate::store::SelectionStore;
use crate::summary::RankedStatement;
use std::sync::Mutex;
use tracing::debug;

/// Persisted slot for the statement list's selection.
pub const SELECTED_STATEMENT_SLOT: &str = "topsql.list_table_selected_key";

/// A statement is selectable when it has a digest and is not the
/// synthetic aggregate row.
pub fn default_eligibility(stmt: &RankedStatement) -> bool {
    stmt.record.digest().is_some() && !stmt.record.is_other
}

/// Delivered to subscribers on every selection transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

type Eligibility = Box<dyn Fn(&RankedStatement) -> bool + Send + Sync>;
type Subscriber = Box<dyn Fn(&SelectionChange) + Send>;

struct Inner {
    selected: Option<String>,
    statements: Vec<RankedStatement>,
    subscribers: Vec<Subscriber>,
}

/// Owns the single "currently selected statement" value.
///
/// The selection is restored from the injected store at construction,
/// persisted on every accepted `select`, and cleared only by an
/// explicit `clear` — a key that rotates out of the ranked list stays
/// held so it resolves again when the statement reappears. All state
/// transitions are read-modify-write under one mutex.
pub struct SelectionCoordinator<S: SelectionStore> {
    store: S,
    slot: String,
    eligibility: Eligibility,
    inner: Mutex<Inner>,
}

impl<S: SelectionStore> SelectionCoordinator<S> {
    /// Restores the last persisted selection from `store` under `slot`.
    /// The restore is read-only; nothing is written back.
    pub fn new(store: S, slot: &str) -> Result<Self> {
        let selected = store.get(slot)?;
        if let Some(key) = &selected {
            debug!(slot, key = %key, "restored persisted selection");
        }
        Ok(SelectionCoordinator {
            store,
            slot: slot.to_string(),
            eligibility: Box::new(default_eligibility),
            inner: Mutex::new(Inner {
                selected,
                statements: Vec::new(),
                subscribers: Vec::new(),
            }),
        })
    }

    /// Replaces the eligibility predicate.
    pub fn with_eligibility<F>(mut self, eligibility: F) -> Self
    where
        F: Fn(&RankedStatement) -> bool + Send + Sync + 'static,
    {
        self.eligibility = Box::new(eligibility);
        self
    }

    /// Installs the latest ranked list. Never auto-selects and never
    /// clears the held key, even when it no longer resolves.
    pub fn sync_statements(&self, statements: Vec<RankedStatement>) {
        let mut inner = self.inner.lock().expect("selection lock poisoned");
        inner.statements = statements;
    }

    /// Selects `digest`, persisting it for the next session.
    ///
    /// Returns `Ok(false)` without any state change or store write when
    /// the digest does not resolve to an eligible statement in the
    /// latest ranked list. Re-selecting the current key is a no-op and
    /// does not re-persist.
    pub fn select(&self, digest: &str) -> Result<bool> {
        let mut inner = self.inner.lock().expect("selection lock poisoned");

        let eligible = inner
            .statements
            .iter()
            .filter(|s| (self.eligibility)(s))
            .any(|s| s.record.digest() == Some(digest));
        if !eligible {
            debug!(digest, "selection rejected: not an eligible statement");
            return Ok(false);
        }

        if inner.selected.as_deref() == Some(digest) {
            return Ok(true);
        }

        self.store.set(&self.slot, digest)?;
        let change = SelectionChange {
            previous: inner.selected.replace(digest.to_string()),
            current: Some(digest.to_string()),
        };
        debug!(digest, "selection changed");
        notify(&inner, &change);
        Ok(true)
    }

    /// Explicitly drops the selection. The persisted slot is left
    /// untouched; the next `select` overwrites it.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("selection lock poisoned");
        if inner.selected.is_none() {
            return;
        }
        let change = SelectionChange {
            previous: inner.selected.take(),
            current: None,
        };
        debug!("selection cleared");
        notify(&inner, &change);
    }

    /// Caller-requested "auto pick first eligible" mode: selects the
    /// first eligible statement of the latest list, but only while
    /// nothing is selected. An existing selection is never overridden.
    pub fn auto_select_first(&self) -> Result<Option<String>> {
        let first = {
            let inner = self.inner.lock().expect("selection lock poisoned");
            if inner.selected.is_some() {
                return Ok(None);
            }
            inner
                .statements
                .iter()
                .find(|s| (self.eligibility)(s))
                .and_then(|s| s.record.digest().map(str::to_string))
        };
        if let Some(digest) = first
            && self.select(&digest)?
        {
            return Ok(Some(digest));
        }
        Ok(None)
    }

    /// The held key, whether or not it currently resolves.
    pub fn selected_key(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("selection lock poisoned")
            .selected
            .clone()
    }

    /// The held key resolved against the latest ranked list. Absent
    /// when the key rotated out of the list or resolves to an
    /// ineligible row; the key itself stays held either way.
    pub fn selected_statement(&self) -> Option<RankedStatement> {
        let inner = self.inner.lock().expect("selection lock poisoned");
        let digest = inner.selected.as_deref()?;
        inner
            .statements
            .iter()
            .filter(|s| (self.eligibility)(s))
            .find(|s| s.record.digest() == Some(digest))
            .cloned()
    }

    /// Registers a change callback, invoked synchronously inside the
    /// transition — before any subsequent read can observe the new
    /// state. Callbacks must not call back into the coordinator.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&SelectionChange) + Send + 'static,
    {
        self.inner
            .lock()
            .expect("selection lock poisoned")
            .subscribers
            .push(Box::new(callback));
    }
}

fn notify(inner: &Inner, change: &SelectionChange) {
    for subscriber in &inner.subscribers {
        subscriber(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::telemetry::{PlanSample, StatementRecord};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ranked(digest: Option<&str>, is_other: bool, total: u64) -> RankedStatement {
        RankedStatement {
            record: StatementRecord {
                sql_digest: digest.map(Into::into),
                sql_text: None,
                is_other,
                plans: vec![PlanSample {
                    timestamp_sec: vec![100],
                    cpu_time_ms: vec![total],
                }],
            },
            total_cpu_ms: total,
        }
    }

    /// Store wrapper that counts writes, to assert the no-write rules.
    struct CountingStore {
        inner: MemoryStore,
        writes: Arc<AtomicUsize>,
    }

    impl SelectionStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }
    }

    #[test]
    fn restores_persisted_selection() {
        let store = MemoryStore::with_slot(SELECTED_STATEMENT_SLOT, "a");
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5)]);

        assert_eq!(coordinator.selected_key(), Some("a".into()));
        let stmt = coordinator.selected_statement().unwrap();
        assert_eq!(stmt.record.digest(), Some("a"));
    }

    #[test]
    fn restore_does_not_write_back() {
        let writes = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: MemoryStore::with_slot(SELECTED_STATEMENT_SLOT, "a"),
            writes: writes.clone(),
        };
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5)]);
        assert!(coordinator.selected_statement().is_some());
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn select_persists_and_notifies() {
        let store = MemoryStore::new();
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5), ranked(Some("b"), false, 3)]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        coordinator.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        assert!(coordinator.select("b").unwrap());
        assert_eq!(coordinator.selected_key(), Some("b".into()));
        assert_eq!(coordinator.store.get(SELECTED_STATEMENT_SLOT).unwrap(), Some("b".into()));
        assert_eq!(
            *seen.lock().unwrap(),
            [SelectionChange {
                previous: None,
                current: Some("b".into()),
            }]
        );
    }

    #[test]
    fn rejects_ineligible_rows_without_writing() {
        let writes = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: MemoryStore::new(),
            writes: writes.clone(),
        };
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![
            ranked(None, true, 9),
            // Digest present but flagged as the aggregate row.
            ranked(Some("agg"), true, 4),
            ranked(Some("a"), false, 5),
        ]);

        assert!(!coordinator.select("agg").unwrap());
        assert!(!coordinator.select("unknown").unwrap());
        assert_eq!(coordinator.selected_key(), None);
        assert_eq!(writes.load(Ordering::SeqCst), 0);

        assert!(coordinator.select("a").unwrap());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reselecting_current_key_does_not_repersist() {
        let writes = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: MemoryStore::new(),
            writes: writes.clone(),
        };
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5)]);

        assert!(coordinator.select("a").unwrap());
        assert!(coordinator.select("a").unwrap());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rotated_out_key_is_held_and_resolves_again() {
        let writes = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: MemoryStore::new(),
            writes: writes.clone(),
        };
        let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5)]);
        assert!(coordinator.select("a").unwrap());

        // "a" rotates out of the top-N: derived record absent, key held.
        coordinator.sync_statements(vec![ranked(Some("b"), false, 7)]);
        assert!(coordinator.selected_statement().is_none());
        assert_eq!(coordinator.selected_key(), Some("a".into()));

        // It rotates back in and resolves again without a new write.
        coordinator.sync_statements(vec![ranked(Some("a"), false, 2), ranked(Some("b"), false, 7)]);
        assert!(coordinator.selected_statement().is_some());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_empties_selection_and_notifies() {
        let coordinator =
            SelectionCoordinator::new(MemoryStore::new(), SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![ranked(Some("a"), false, 5)]);
        coordinator.select("a").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        coordinator.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        coordinator.clear();
        assert_eq!(coordinator.selected_key(), None);
        assert_eq!(
            *seen.lock().unwrap(),
            [SelectionChange {
                previous: Some("a".into()),
                current: None,
            }]
        );

        // Clearing while unselected is a no-op.
        coordinator.clear();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn auto_select_picks_first_eligible_only_while_empty() {
        let coordinator =
            SelectionCoordinator::new(MemoryStore::new(), SELECTED_STATEMENT_SLOT).unwrap();
        coordinator.sync_statements(vec![
            ranked(None, true, 9),
            ranked(Some("a"), false, 5),
            ranked(Some("b"), false, 3),
        ]);

        assert_eq!(coordinator.auto_select_first().unwrap(), Some("a".into()));
        // Existing selection is never overridden.
        assert_eq!(coordinator.auto_select_first().unwrap(), None);
        assert_eq!(coordinator.selected_key(), Some("a".into()));
    }

    #[test]
    fn custom_eligibility_is_honored() {
        let coordinator = SelectionCoordinator::new(MemoryStore::new(), SELECTED_STATEMENT_SLOT)
            .unwrap()
            .with_eligibility(|s: &RankedStatement| {
                default_eligibility(s) && s.total_cpu_ms >= 5
            });
        coordinator.sync_statements(vec![ranked(Some("a"), false, 3), ranked(Some("b"), false, 8)]);

        assert!(!coordinator.select("a").unwrap());
        assert!(coordinator.select("b").unwrap());
    }
}
