//! Process-wide table state store.
//!
//! One entry per table id, created when a table mounts and removed when it
//! unmounts. Entries are only mutated through the fetch lifecycle:
//! [`TableStore::dispatch`] marks a fetch in flight, [`TableStore::commit`] and
//! [`TableStore::fail`] apply its completion. Each dispatch carries a sequence
//! number and a completion is applied only if no newer completion already
//! was, so a slow response can never overwrite fresher data.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::TableError;
use crate::query::TablePage;
use crate::sort::can_sort_locally;
use crate::sort::sort_locally;

static GLOBAL: LazyLock<TableStore> = LazyLock::new(TableStore::new);

/// Snapshot of one table's state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    /// A fetch is in flight and no newer completion has been applied.
    pub is_loading: bool,
    /// The current page.
    pub data: TablePage,
    /// The last fatal fetch error, until the next successful fetch or dismissal.
    pub last_error: Option<TableError>,
    /// Set once the first fetch of this mount completed.
    pub has_tracked_first_fetch: bool,
    /// When the last completion was applied.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl TableState {
    /// The state of a freshly mounted table.
    pub fn mounted() -> Self {
        Self {
            is_loading: true,
            data: TablePage::empty(),
            last_error: None,
            has_tracked_first_fetch: false,
            fetched_at: None,
        }
    }
}

struct TableEntry {
    state: TableState,
    generation: u64,
    /// Highest sequence number handed out.
    dispatched: u64,
    /// Sequence number of the last applied completion.
    applied: u64,
    /// Dispatches newer than `applied` that are still running.
    outstanding: BTreeSet<u64>,
}

impl TableEntry {
    fn settle(&mut self) {
        self.state.is_loading = !self.outstanding.is_empty();
    }
}

/// A fetch in flight for one table, returned by [`TableStore::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    table_id: String,
    generation: u64,
    seq: u64,
    track: bool,
}

impl Dispatch {
    /// Returns the table this fetch belongs to.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Returns the dispatch sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns `true` if the first fetch had completed when this one was dispatched.
    pub fn should_track(&self) -> bool {
        self.track
    }
}

/// Result of applying a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The completion was applied.
    Committed,
    /// A newer completion was already applied; this one was dropped.
    Stale,
    /// The table was unmounted (or remounted) since dispatch.
    Unmounted,
}

impl CommitOutcome {
    /// Returns `true` for [`CommitOutcome::Committed`].
    pub fn is_committed(self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Keyed store of [`TableState`]s.
///
/// Cheap to clone; clones share the same entries. Table ids are opaque and
/// their uniqueness is the caller's responsibility.
///
/// # Example
///
/// ```
/// use tableview_lib::query::TablePage;
/// use tableview_lib::store::TableStore;
///
/// let store = TableStore::new();
/// store.mount("enrollments");
///
/// let dispatch = store.dispatch("enrollments").unwrap();
/// store.commit(&dispatch, TablePage::from_count(vec![], 0, 20));
///
/// let state = store.get("enrollments").unwrap();
/// assert!(!state.is_loading);
/// ```
#[derive(Clone, Default)]
pub struct TableStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    tables: DashMap<String, TableEntry>,
    generations: AtomicU64,
}

impl TableStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the process-wide store.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Creates (or resets) the entry for a table.
    pub fn mount(&self, table_id: &str) {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.inner.tables.insert(
            table_id.to_string(),
            TableEntry {
                state: TableState::mounted(),
                generation,
                dispatched: 0,
                applied: 0,
                outstanding: BTreeSet::new(),
            },
        );
        if previous.is_some() {
            log::debug!("table `{}` remounted, previous state dropped", table_id);
        }
    }

    /// Returns `true` if the table is mounted.
    pub fn is_mounted(&self, table_id: &str) -> bool {
        self.inner.tables.contains_key(table_id)
    }

    /// Returns a snapshot of a table's state.
    pub fn get(&self, table_id: &str) -> Option<TableState> {
        self.inner
            .tables
            .get(table_id)
            .map(|entry| entry.state.clone())
    }

    /// Marks a fetch in flight and allocates its sequence number.
    ///
    /// Returns `None` if the table is not mounted.
    pub fn dispatch(&self, table_id: &str) -> Option<Dispatch> {
        let mut entry = self.inner.tables.get_mut(table_id)?;
        entry.dispatched += 1;
        let seq = entry.dispatched;
        entry.outstanding.insert(seq);
        entry.state.is_loading = true;
        Some(Dispatch {
            table_id: table_id.to_string(),
            generation: entry.generation,
            seq,
            track: entry.state.has_tracked_first_fetch,
        })
    }

    /// Replaces the page wholesale and clears the last error.
    pub fn commit(&self, dispatch: &Dispatch, page: TablePage) -> CommitOutcome {
        self.complete(dispatch, |state| {
            state.data = page;
            state.last_error = None;
        })
    }

    /// Records a fatal error, keeping the previous page visible.
    pub fn fail(&self, dispatch: &Dispatch, error: TableError) -> CommitOutcome {
        self.complete(dispatch, |state| {
            state.last_error = Some(error);
        })
    }

    fn complete(&self, dispatch: &Dispatch, apply: impl FnOnce(&mut TableState)) -> CommitOutcome {
        let Some(mut entry) = self.inner.tables.get_mut(&dispatch.table_id) else {
            return CommitOutcome::Unmounted;
        };
        if entry.generation != dispatch.generation {
            return CommitOutcome::Unmounted;
        }
        if dispatch.seq <= entry.applied {
            entry.outstanding.remove(&dispatch.seq);
            return CommitOutcome::Stale;
        }

        entry.applied = dispatch.seq;
        // older dispatches can only land as stale from here on
        entry.outstanding.retain(|&seq| seq > dispatch.seq);
        apply(&mut entry.state);
        entry.state.has_tracked_first_fetch = true;
        entry.state.fetched_at = Some(Utc::now());
        // last: loading only clears once nothing newer is outstanding
        entry.settle();
        CommitOutcome::Committed
    }

    /// Retires a dispatch that will never complete, e.g. because its fetch
    /// was cancelled or its future dropped.
    ///
    /// Leaves data and error untouched. Returns `true` if the dispatch was
    /// still outstanding.
    pub fn abandon(&self, dispatch: &Dispatch) -> bool {
        let Some(mut entry) = self.inner.tables.get_mut(&dispatch.table_id) else {
            return false;
        };
        if entry.generation != dispatch.generation {
            return false;
        }
        let removed = entry.outstanding.remove(&dispatch.seq);
        if removed {
            entry.settle();
        }
        removed
    }

    /// Removes a table's entry entirely.
    ///
    /// Returns `true` if the table was mounted.
    pub fn clear(&self, table_id: &str) -> bool {
        self.inner.tables.remove(table_id).is_some()
    }

    /// Clears the last error of a table without touching its data.
    pub fn dismiss_error(&self, table_id: &str) -> bool {
        match self.inner.tables.get_mut(table_id) {
            Some(mut entry) => entry.state.last_error.take().is_some(),
            None => false,
        }
    }

    /// Re-sorts the cached page in place if it holds the whole result set.
    ///
    /// Returns `true` if the page was sorted locally.
    pub fn sort_cached(&self, table_id: &str, ordering: &str) -> bool {
        let Some(mut entry) = self.inner.tables.get_mut(table_id) else {
            return false;
        };
        if !can_sort_locally(&entry.state) {
            return false;
        }
        sort_locally(entry.state.data.results_mut(), ordering);
        true
    }

    /// Returns the number of mounted tables.
    pub fn len(&self) -> usize {
        self.inner.tables.len()
    }

    /// Returns `true` if no table is mounted.
    pub fn is_empty(&self) -> bool {
        self.inner.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page(ids: &[i64], count: u64) -> TablePage {
        TablePage::from_count(ids.iter().map(|id| json!({"id": id})).collect(), count, 20)
    }

    #[test]
    fn test_mount_creates_loading_entry() {
        let store = TableStore::new();
        assert!(store.get("t").is_none());
        store.mount("t");
        let state = store.get("t").unwrap();
        assert!(state.is_loading);
        assert!(state.data.is_empty());
        assert!(!state.has_tracked_first_fetch);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_commit_replaces_page_and_clears_error() {
        let store = TableStore::new();
        store.mount("t");

        let first = store.dispatch("t").unwrap();
        assert!(!first.should_track());
        store.fail(&first, TableError::new("boom"));

        let second = store.dispatch("t").unwrap();
        assert!(second.should_track());
        assert!(store.commit(&second, page(&[1, 2], 2)).is_committed());

        let state = store.get("t").unwrap();
        assert!(!state.is_loading);
        assert!(state.last_error.is_none());
        assert_eq!(state.data.len(), 2);
        assert!(state.fetched_at.is_some());
    }

    #[test]
    fn test_fail_keeps_previous_page() {
        let store = TableStore::new();
        store.mount("t");
        let d = store.dispatch("t").unwrap();
        store.commit(&d, page(&[1, 2, 3], 3));

        let d = store.dispatch("t").unwrap();
        assert!(store.get("t").unwrap().is_loading);
        store.fail(&d, TableError::new("HTTP 500: oops"));

        let state = store.get("t").unwrap();
        assert!(!state.is_loading);
        assert_eq!(state.data.len(), 3);
        assert_eq!(state.last_error.unwrap().message, "HTTP 500: oops");
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let store = TableStore::new();
        store.mount("t");
        let a = store.dispatch("t").unwrap();
        let b = store.dispatch("t").unwrap();
        assert!(a.seq() < b.seq());

        assert_eq!(store.commit(&b, page(&[2], 1)), CommitOutcome::Committed);
        assert_eq!(store.commit(&a, page(&[1], 1)), CommitOutcome::Stale);
        assert_eq!(store.fail(&a, TableError::new("late")), CommitOutcome::Stale);

        let state = store.get("t").unwrap();
        assert_eq!(state.data.results(), &[json!({"id": 2})]);
        assert!(state.last_error.is_none());
        assert!(!state.is_loading);
    }

    #[test]
    fn test_older_completion_keeps_loading_while_newer_outstanding() {
        let store = TableStore::new();
        store.mount("t");
        let a = store.dispatch("t").unwrap();
        let b = store.dispatch("t").unwrap();

        store.commit(&a, page(&[1], 1));
        assert!(store.get("t").unwrap().is_loading);

        store.commit(&b, page(&[2], 1));
        let state = store.get("t").unwrap();
        assert!(!state.is_loading);
        assert_eq!(state.data.results(), &[json!({"id": 2})]);
    }

    #[test]
    fn test_first_fetch_flag_never_resets() {
        let store = TableStore::new();
        store.mount("t");
        let d = store.dispatch("t").unwrap();
        store.commit(&d, page(&[], 0));
        assert!(store.get("t").unwrap().has_tracked_first_fetch);

        let d = store.dispatch("t").unwrap();
        store.fail(&d, TableError::new("x"));
        assert!(store.get("t").unwrap().has_tracked_first_fetch);
    }

    #[test]
    fn test_clear_and_remount() {
        let store = TableStore::new();
        store.mount("t");
        let old = store.dispatch("t").unwrap();
        assert!(store.clear("t"));
        assert!(!store.clear("t"));
        assert!(store.dispatch("t").is_none());
        assert_eq!(store.commit(&old, page(&[1], 1)), CommitOutcome::Unmounted);

        store.mount("t");
        assert_eq!(store.commit(&old, page(&[1], 1)), CommitOutcome::Unmounted);
        assert!(store.get("t").unwrap().data.is_empty());
    }

    #[test]
    fn test_tables_are_independent() {
        let store = TableStore::new();
        store.mount("a");
        store.mount("b");
        let da = store.dispatch("a").unwrap();
        store.commit(&da, page(&[1], 1));
        assert!(store.get("b").unwrap().is_loading);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_dismiss_error() {
        let store = TableStore::new();
        store.mount("t");
        let d = store.dispatch("t").unwrap();
        store.fail(&d, TableError::new("x"));
        assert!(store.dismiss_error("t"));
        assert!(!store.dismiss_error("t"));
        assert!(store.get("t").unwrap().last_error.is_none());
    }

    #[test]
    fn test_sort_cached_only_for_single_page() {
        let store = TableStore::new();
        store.mount("t");
        let d = store.dispatch("t").unwrap();
        store.commit(&d, TablePage::new(vec![json!({"v": 2}), json!({"v": 1})], 2, 1));
        assert!(store.sort_cached("t", "v"));
        assert_eq!(store.get("t").unwrap().data.results()[0], json!({"v": 1}));

        let d = store.dispatch("t").unwrap();
        store.commit(&d, TablePage::new(vec![json!({"v": 2}), json!({"v": 1})], 40, 2));
        assert!(!store.sort_cached("t", "v"));
        assert!(!store.sort_cached("missing", "v"));
    }

    #[test]
    fn test_abandoned_dispatch_stops_loading() {
        let store = TableStore::new();
        store.mount("t");
        let d = store.dispatch("t").unwrap();
        store.commit(&d, page(&[1], 1));

        let lost = store.dispatch("t").unwrap();
        assert!(store.get("t").unwrap().is_loading);
        assert!(store.abandon(&lost));
        assert!(!store.abandon(&lost));

        let state = store.get("t").unwrap();
        assert!(!state.is_loading);
        assert_eq!(state.data.results(), &[json!({"id": 1})]);
    }

    #[test]
    fn test_abandon_keeps_loading_for_newer_dispatch() {
        let store = TableStore::new();
        store.mount("t");
        let a = store.dispatch("t").unwrap();
        let b = store.dispatch("t").unwrap();

        store.abandon(&a);
        assert!(store.get("t").unwrap().is_loading);

        store.commit(&b, page(&[2], 1));
        assert!(!store.get("t").unwrap().is_loading);
    }

    #[test]
    fn test_abandon_after_newer_commit_is_noop() {
        let store = TableStore::new();
        store.mount("t");
        let a = store.dispatch("t").unwrap();
        let b = store.dispatch("t").unwrap();
        store.commit(&b, page(&[2], 1));

        assert!(!store.abandon(&a));
        assert!(!store.get("t").unwrap().is_loading);

        store.clear("t");
        assert!(!store.abandon(&b));
    }

    #[test]
    fn test_global_is_shared() {
        let a = TableStore::global();
        let b = TableStore::global();
        a.mount("store-tests-global");
        assert!(b.is_mounted("store-tests-global"));
        b.clear("store-tests-global");
        assert!(!a.is_mounted("store-tests-global"));
    }
}
