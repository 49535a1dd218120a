//! Request coordinator: one controller per mounted table.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analytics::AnalyticsSink;
use crate::analytics::NoopAnalytics;
use crate::analytics::TableFetchEvent;
use crate::config::ControllerConfig;
use crate::debounce::Debouncer;
use crate::error::FetchError;
use crate::error::TableError;
use crate::fetch::PageFetcher;
use crate::normalize::ErrorNormalizer;
use crate::normalize::Normalized;
use crate::query::TablePage;
use crate::query::TableQuery;
use crate::query::Translator;
use crate::store::CommitOutcome;
use crate::store::Dispatch;
use crate::store::TableState;
use crate::store::TableStore;
use crate::typestate::Missing;
use crate::typestate::Set;

/// Drives the fetch lifecycle of one table.
///
/// Building a controller mounts its table in the [`TableStore`]; dropping it
/// unmounts the table, cancels any pending debounced call and abandons
/// in-flight fetches. Errors never escape: they end up in
/// [`TableState::last_error`].
///
/// # Example
///
/// ```ignore
/// let controller = TableController::builder()
///     .table_id("enrollments")
///     .fetcher(fetcher)
///     .scope_id("acme")
///     .translator(Translator::new().columns(columns))
///     .build();
///
/// controller.fetch_immediate(TableQuery::first_page(20)).await;
/// controller.fetch_debounced(TableQuery::new(1, 20).sort_desc("date"));
/// ```
pub struct TableController {
    inner: Arc<ControllerInner>,
    debouncer: Debouncer,
}

struct ControllerInner {
    table_id: String,
    scope_id: String,
    store: TableStore,
    fetcher: Arc<dyn PageFetcher>,
    translator: Translator,
    normalizer: ErrorNormalizer,
    analytics: Arc<dyn AnalyticsSink>,
    config: ControllerConfig,
    /// Query whose results the store currently holds.
    current_query: Mutex<Option<TableQuery>>,
    /// Token of the most recently dispatched fetch.
    in_flight: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

/// How [`TableController::request`] served a query.
#[derive(Debug)]
pub enum Requested {
    /// The cached page was re-sorted in place; no request was made.
    SortedLocally,
    /// A debounced fetch was scheduled.
    Scheduled(JoinHandle<()>),
}

impl Requested {
    /// Returns `true` for [`Requested::SortedLocally`].
    pub fn is_local(&self) -> bool {
        matches!(self, Self::SortedLocally)
    }
}

impl TableController {
    /// Creates a new builder.
    pub fn builder() -> TableControllerBuilder<Missing, Missing> {
        TableControllerBuilder::new()
    }

    /// Returns the table id.
    pub fn table_id(&self) -> &str {
        &self.inner.table_id
    }

    /// Returns the scope id passed to the fetcher.
    pub fn scope_id(&self) -> &str {
        &self.inner.scope_id
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Returns the translator used to build API options.
    pub fn translator(&self) -> &Translator {
        &self.inner.translator
    }

    /// Fetches right away, bypassing the debouncer.
    ///
    /// Used for the first load and deep-linked pages. Returns once the
    /// response has been applied (or dropped as stale).
    pub async fn fetch_immediate(&self, query: TableQuery) {
        self.inner.run(query).await;
    }

    /// Schedules a fetch after the quiescence window.
    ///
    /// Calls arriving within the window are coalesced into one fetch using
    /// the last call's query. The handle resolves when this call's fetch is
    /// done, or immediately once a later call supersedes it.
    pub fn fetch_debounced(&self, query: TableQuery) -> JoinHandle<()> {
        let inner = self.inner.clone();
        self.debouncer.call(move || async move { inner.run(query).await })
    }

    /// Handles a query change from the presentation layer.
    ///
    /// If only the sort changed and the cached page already holds the whole,
    /// settled result set, the page is re-sorted locally and any pending
    /// debounced fetch is dropped. Otherwise a debounced fetch is scheduled.
    pub fn request(&self, query: TableQuery) -> Requested {
        if self.try_sort_locally(&query) {
            return Requested::SortedLocally;
        }
        Requested::Scheduled(self.fetch_debounced(query))
    }

    fn try_sort_locally(&self, query: &TableQuery) -> bool {
        let inner = &self.inner;
        let Some(state) = inner.store.get(&inner.table_id) else {
            return false;
        };
        if state.is_loading || state.last_error.is_some() {
            return false;
        }

        let mut current = lock(&inner.current_query);
        let sort_only = current
            .as_ref()
            .is_some_and(|current| current.differs_only_in_sort(query));
        if !sort_only {
            return false;
        }

        let options = inner.translator.to_api_options(query);
        let Some(ordering) = options.ordering else {
            return false;
        };
        if !inner.store.sort_cached(&inner.table_id, &ordering) {
            return false;
        }

        self.debouncer.cancel();
        *current = Some(query.clone());
        log::debug!("table `{}`: sorted locally by `{}`", inner.table_id, ordering);
        true
    }

    /// Returns a snapshot of the table state.
    pub fn state(&self) -> Option<TableState> {
        self.inner.store.get(&self.inner.table_id)
    }

    /// Clears the displayed error, keeping the data.
    pub fn dismiss_error(&self) -> bool {
        self.inner.store.dismiss_error(&self.inner.table_id)
    }

    /// Tears the table down. Equivalent to dropping the controller.
    pub fn unmount(self) {}
}

impl Drop for TableController {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.inner.shutdown.cancel();
        self.inner.store.clear(&self.inner.table_id);
        log::debug!("table `{}` unmounted", self.inner.table_id);
    }
}

impl ControllerInner {
    async fn run(&self, query: TableQuery) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let options = self.translator.to_api_options(&query);
        let Some(dispatch) = self.store.dispatch(&self.table_id) else {
            log::debug!("table `{}` is not mounted, skipping fetch", self.table_id);
            return;
        };
        let pending = PendingDispatch {
            store: &self.store,
            dispatch,
        };
        log::debug!(
            "table `{}`: dispatch #{} page={} page_size={} ordering={:?}",
            self.table_id,
            pending.dispatch.seq(),
            options.page,
            options.page_size,
            options.ordering
        );

        let token = self.begin_fetch();
        let result = tokio::select! {
            _ = token.cancelled() => {
                log::debug!("table `{}`: fetch #{} cancelled", self.table_id, pending.dispatch.seq());
                return;
            }
            result = self.fetcher.fetch_page(&self.scope_id, &options) => result,
        };

        let (outcome, loaded) = match result {
            Ok(envelope) => (
                self.store
                    .commit(&pending.dispatch, envelope.into_page(query.page_size())),
                true,
            ),
            Err(err) => match self.normalizer.normalize(err) {
                Normalized::Empty => {
                    log::debug!("table `{}`: no rows matched", self.table_id);
                    (self.store.commit(&pending.dispatch, TablePage::empty()), true)
                }
                Normalized::Fatal(err) => {
                    if matches!(err, FetchError::Schema { .. }) {
                        log::error!("table `{}`: fetcher returned a malformed page: {}", self.table_id, err);
                    } else {
                        log::warn!("table `{}`: fetch failed: {}", self.table_id, err);
                    }
                    (self.store.fail(&pending.dispatch, TableError::from(&err)), false)
                }
            },
        };

        match outcome {
            CommitOutcome::Committed if loaded => {
                *lock(&self.current_query) = Some(query);
                if pending.dispatch.should_track() {
                    self.analytics
                        .track(&TableFetchEvent::new(self.table_id.clone(), options));
                }
            }
            CommitOutcome::Committed | CommitOutcome::Unmounted => {}
            CommitOutcome::Stale => {
                log::debug!(
                    "table `{}`: dropped stale response #{}",
                    self.table_id,
                    pending.dispatch.seq()
                );
            }
        }
    }

    fn begin_fetch(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        let previous = lock(&self.in_flight).replace(token.clone());
        if self.config.abort_superseded {
            if let Some(previous) = previous {
                previous.cancel();
            }
        }
        token
    }
}

/// Retires a dispatch whose fetch never reached the store, whether it was
/// cancelled or its future was dropped.
struct PendingDispatch<'a> {
    store: &'a TableStore,
    dispatch: Dispatch,
}

impl Drop for PendingDispatch<'_> {
    fn drop(&mut self) {
        // no-op once the dispatch was committed, failed or went stale
        if self.store.abandon(&self.dispatch) {
            log::debug!(
                "table `{}`: fetch #{} abandoned",
                self.dispatch.table_id(),
                self.dispatch.seq()
            );
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Builder for a [`TableController`].
///
/// Uses the typestate pattern to ensure the table id and the fetcher are set
/// at compile time.
///
/// # Defaults
///
/// - store: [`TableStore::global`]
/// - scope id: empty
/// - analytics: [`NoopAnalytics`]
/// - normalizer: [`ErrorNormalizer::default`] (404 means empty)
pub struct TableControllerBuilder<Id, Fetcher> {
    table_id: Id,
    fetcher: Fetcher,
    scope_id: String,
    store: Option<TableStore>,
    translator: Translator,
    normalizer: ErrorNormalizer,
    analytics: Arc<dyn AnalyticsSink>,
    config: ControllerConfig,
}

impl TableControllerBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            table_id: Missing,
            fetcher: Missing,
            scope_id: String::new(),
            store: None,
            translator: Translator::default(),
            normalizer: ErrorNormalizer::default(),
            analytics: Arc::new(NoopAnalytics),
            config: ControllerConfig::default(),
        }
    }
}

impl Default for TableControllerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> TableControllerBuilder<Missing, F> {
    /// Sets the table id the state is stored under.
    pub fn table_id(self, table_id: impl Into<String>) -> TableControllerBuilder<Set<String>, F> {
        TableControllerBuilder {
            table_id: Set(table_id.into()),
            fetcher: self.fetcher,
            scope_id: self.scope_id,
            store: self.store,
            translator: self.translator,
            normalizer: self.normalizer,
            analytics: self.analytics,
            config: self.config,
        }
    }
}

impl<I> TableControllerBuilder<I, Missing> {
    /// Sets the page source.
    pub fn fetcher<T: PageFetcher + 'static>(
        self,
        fetcher: T,
    ) -> TableControllerBuilder<I, Set<Arc<dyn PageFetcher>>> {
        TableControllerBuilder {
            table_id: self.table_id,
            fetcher: Set(Arc::new(fetcher) as Arc<dyn PageFetcher>),
            scope_id: self.scope_id,
            store: self.store,
            translator: self.translator,
            normalizer: self.normalizer,
            analytics: self.analytics,
            config: self.config,
        }
    }
}

impl<I, F> TableControllerBuilder<I, F> {
    /// Sets the scope id passed to every fetch (e.g. the owning organization).
    pub fn scope_id(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = scope_id.into();
        self
    }

    /// Uses a specific store instead of the process-wide one.
    pub fn store(mut self, store: TableStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the query translator.
    pub fn translator(mut self, translator: Translator) -> Self {
        self.translator = translator;
        self
    }

    /// Sets the error normalization policy.
    pub fn normalizer(mut self, normalizer: ErrorNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Sets the analytics sink.
    pub fn analytics<A: AnalyticsSink + 'static>(mut self, analytics: A) -> Self {
        self.analytics = Arc::new(analytics);
        self
    }

    /// Sets the controller configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }
}

impl TableControllerBuilder<Set<String>, Set<Arc<dyn PageFetcher>>> {
    /// Builds the controller and mounts its table.
    pub fn build(self) -> TableController {
        let store = self.store.unwrap_or_else(TableStore::global);
        let table_id = self.table_id.0;
        store.mount(&table_id);

        TableController {
            debouncer: Debouncer::new(self.config.quiescence_window),
            inner: Arc::new(ControllerInner {
                table_id,
                scope_id: self.scope_id,
                store,
                fetcher: self.fetcher.0,
                translator: self.translator,
                normalizer: self.normalizer,
                analytics: self.analytics,
                config: self.config,
                current_query: Mutex::new(None),
                in_flight: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }
}
