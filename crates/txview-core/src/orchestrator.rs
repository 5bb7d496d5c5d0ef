//! Transaction view orchestrator
//!
//! Decides which provider is authoritative, drives fetch and invalidate calls
//! in order, and keeps the merged list the presentation layer renders.
//!
//! Only one of the two transaction sources is live at a time: loading all
//! transactions invalidates the per-employee source, selecting an employee
//! invalidates the paginated feed.

use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use txview_config::ViewConfig;
use txview_providers::{Employee, ProviderSet, Transaction};

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::view::{merge, ToggleOverlay, ViewMode};

/// Resolves to whether the load published its result
type SharedLoad = Shared<BoxFuture<'static, CoreResult<bool>>>;

/// Identity of a load for single-flight joining
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LoadKey {
    All,
    Employee(String),
}

struct InFlight {
    id: u64,
    load: SharedLoad,
}

#[derive(Debug, Default)]
struct ViewState {
    mode: ViewMode,
    /// Last per-employee result, authoritative in filtered mode
    scoped: Option<Vec<Transaction>>,
    /// Per-employee results prefetched after a page load
    warm_cache: HashMap<String, Vec<Transaction>>,
    overlay: ToggleOverlay,
    merged: Vec<Arc<Transaction>>,
}

struct Inner {
    providers: ProviderSet,
    config: ViewConfig,
    state: Mutex<ViewState>,
    loading: AtomicUsize,
    started: AtomicBool,
    in_flight: Mutex<HashMap<LoadKey, InFlight>>,
    next_load: AtomicU64,
    logger: Box<dyn ErrorLogger>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the loading counter up for the life of a load
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The view orchestrator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TransactionView {
    inner: Arc<Inner>,
}

impl TransactionView {
    /// Create an orchestrator with empty state
    pub fn new(providers: ProviderSet, config: ViewConfig) -> Self {
        Self::with_logger(providers, config, Box::new(DefaultErrorLogger))
    }

    pub fn with_logger(
        providers: ProviderSet,
        config: ViewConfig,
        logger: Box<dyn ErrorLogger>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                config,
                state: Mutex::new(ViewState::default()),
                loading: AtomicUsize::new(0),
                started: AtomicBool::new(false),
                in_flight: Mutex::new(HashMap::new()),
                next_load: AtomicU64::new(0),
                logger,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        lock(&self.inner.state)
    }

    // ==================== Read Surface ====================

    /// The merged, ordered transaction list
    pub fn merged_transactions(&self) -> Vec<Arc<Transaction>> {
        self.state().merged.clone()
    }

    pub fn mode(&self) -> ViewMode {
        self.state().mode.clone()
    }

    pub fn selected_employee_id(&self) -> Option<String> {
        self.state().mode.selected_employee_id().map(str::to_string)
    }

    /// Whether a load of all transactions is running
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst) > 0
    }

    /// Loaded employees, `None` until the directory has been fetched
    pub fn employees(&self) -> Option<Vec<Employee>> {
        self.inner.providers.directory.data()
    }

    pub fn employees_loading(&self) -> bool {
        self.inner.providers.directory.loading()
    }

    /// Selector entries: the "all employees" sentinel followed by every
    /// employee, empty until the directory is loaded
    pub fn employee_options(&self) -> Vec<Employee> {
        match self.employees() {
            Some(employees) => std::iter::once(Employee::empty()).chain(employees).collect(),
            None => Vec::new(),
        }
    }

    /// "View More" is shown only for the paginated feed with pages left
    pub fn view_more_visible(&self) -> bool {
        if !self.state().mode.is_paginated() {
            return false;
        }
        self.inner
            .providers
            .paginated
            .data()
            .map_or(false, |page| page.has_more())
    }

    /// "View More" is disabled while a page is being fetched or the
    /// employee cache is warming
    pub fn view_more_enabled(&self) -> bool {
        self.view_more_visible() && !self.is_loading() && !self.inner.providers.paginated.loading()
    }

    // ==================== Intents ====================

    /// Load everything on first use.
    ///
    /// Triggers `load_all_transactions` once if the directory has never been
    /// loaded and is not loading. Returns whether a load ran.
    pub async fn start(&self) -> CoreResult<bool> {
        let directory = &self.inner.providers.directory;
        if directory.data().is_some() || directory.loading() {
            return Ok(false);
        }
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        log::info!("Starting transaction view");
        self.load_all_transactions().await?;
        Ok(true)
    }

    /// Show the paginated feed, fetching its next page.
    ///
    /// Used both for the first page and for "View More". The caller that
    /// started the page fetch also warms the employee cache; callers that
    /// joined it return as soon as the page is shown.
    pub async fn load_all_transactions(&self) -> CoreResult<()> {
        let view = self.clone();
        let (result, started) = self
            .single_flight(LoadKey::All, move || {
                async move { view.run_load_all().await }.boxed()
            })
            .await;

        if result? && started && self.inner.config.warm_employee_cache {
            let _loading = LoadingGuard::enter(&self.inner.loading);
            self.warm_employee_cache().await;
        }
        Ok(())
    }

    /// Show one employee's transactions.
    ///
    /// The empty sentinel id and ids missing from the directory fall back to
    /// `load_all_transactions`.
    pub async fn load_transactions_by_employee(&self, employee_id: &str) -> CoreResult<()> {
        if employee_id.is_empty() {
            return self.load_all_transactions().await;
        }

        match self.resolve_selection(employee_id).await {
            Ok(()) => {}
            Err(error @ CoreError::InvalidSelection { .. }) => {
                self.inner.logger.log_warning(
                    &error.to_string(),
                    &ErrorContext::new("load_transactions_by_employee").with_employee(employee_id),
                );
                return self.load_all_transactions().await;
            }
            Err(error) => return Err(error),
        }

        let view = self.clone();
        let id = employee_id.to_string();
        let (result, _) = self
            .single_flight(LoadKey::Employee(id.clone()), move || {
                async move { view.run_load_by_employee(id).await }.boxed()
            })
            .await;
        result.map(|_| ())
    }

    /// Flip the approval flag of one merged row.
    ///
    /// Other rows keep their identity. Returns false when the id is not in the
    /// merged list, which leaves it untouched.
    pub fn toggle_transaction(&self, transaction_id: &str) -> bool {
        let mut state = self.state();
        let Some(index) = state.merged.iter().position(|t| t.id == transaction_id) else {
            log::debug!("Toggle ignored, {} is not shown", transaction_id);
            return false;
        };

        let approved = !state.merged[index].approved;
        state.merged[index] = Arc::new(state.merged[index].with_approved(approved));
        state.overlay.set(transaction_id, approved);
        log::debug!("Transaction {} approved={}", transaction_id, approved);
        true
    }

    // ==================== Load Steps ====================

    /// Fetch the next page. Returns whether it was published.
    async fn run_load_all(&self) -> CoreResult<bool> {
        let _loading = LoadingGuard::enter(&self.inner.loading);
        let providers = &self.inner.providers;
        let context = ErrorContext::new("load_all_transactions");

        {
            let mut state = self.state();
            state.mode = ViewMode::AllTransactions;
            state.scoped = None;
        }
        self.retire_other_loads(&LoadKey::All);
        providers.by_employee.invalidate_data();

        self.ensure_employees(&context).await?;

        if let Err(error) = providers.paginated.fetch_all().await {
            let error = CoreError::fetch("paginated transactions", error);
            self.inner.logger.log_error(&error, &context);
            return Err(error);
        }

        Ok(self.publish_if_current(&ViewMode::AllTransactions))
    }

    async fn run_load_by_employee(&self, employee_id: String) -> CoreResult<bool> {
        let providers = &self.inner.providers;
        let mode = ViewMode::FilteredByEmployee(employee_id.clone());

        let cached = {
            let mut state = self.state();
            state.mode = mode.clone();
            state.scoped = None;
            state.warm_cache.get(&employee_id).cloned()
        };
        self.retire_other_loads(&LoadKey::Employee(employee_id.clone()));
        providers.paginated.invalidate_data();
        self.recompute();

        let transactions = match cached {
            Some(transactions) => {
                log::debug!("Serving employee {} from warm cache", employee_id);
                transactions
            }
            None => match providers.by_employee.fetch_by_id(&employee_id).await {
                Ok(transactions) => transactions,
                Err(error) => {
                    let error = CoreError::fetch("employee transactions", error);
                    self.inner.logger.log_error(
                        &error,
                        &ErrorContext::new("load_transactions_by_employee").with_employee(&employee_id),
                    );
                    return Err(error);
                }
            },
        };

        let stale_mode = {
            let mut state = self.state();
            if state.mode == mode {
                if self.inner.config.warm_employee_cache {
                    state.warm_cache.insert(employee_id.clone(), transactions.clone());
                }
                state.scoped = Some(transactions);
                self.recompute_locked(&mut state);
                None
            } else {
                Some(state.mode.clone())
            }
        };

        match stale_mode {
            None => Ok(true),
            Some(current) => {
                log::debug!("Discarding employee {} result, view moved to {}", employee_id, current);
                if current.is_paginated() {
                    providers.by_employee.invalidate_data();
                }
                Ok(false)
            }
        }
    }

    async fn resolve_selection(&self, employee_id: &str) -> CoreResult<()> {
        let context = ErrorContext::new("load_transactions_by_employee").with_employee(employee_id);
        let employees = self.ensure_employees(&context).await?;
        if employees.iter().any(|e| e.id == employee_id) {
            Ok(())
        } else {
            Err(CoreError::InvalidSelection {
                employee_id: employee_id.to_string(),
            })
        }
    }

    /// Cached directory, fetching it first if needed
    async fn ensure_employees(&self, context: &ErrorContext) -> CoreResult<Vec<Employee>> {
        let directory = &self.inner.providers.directory;
        if let Some(employees) = directory.data() {
            return Ok(employees);
        }

        directory.fetch_all().await.map_err(|error| {
            let error = CoreError::fetch("employees", error);
            self.inner.logger.log_error(&error, context);
            error
        })
    }

    /// Prefetch each employee's transactions concurrently.
    ///
    /// Failures only cost a cache entry. The per-employee source is
    /// invalidated afterwards while the paginated feed is still shown.
    async fn warm_employee_cache(&self) {
        let employees = self.employees().unwrap_or_default();
        let by_employee = &self.inner.providers.by_employee;
        let fetches = employees.iter().map(|employee| async move {
            (employee.id.clone(), by_employee.fetch_by_id(&employee.id).await)
        });

        let mut cache = HashMap::new();
        for (employee_id, result) in join_all(fetches).await {
            match result {
                Ok(transactions) => {
                    cache.insert(employee_id, transactions);
                }
                Err(error) => log::warn!("Warm-up fetch for employee {} failed: {}", employee_id, error),
            }
        }
        log::debug!("Warmed transactions for {} employees", cache.len());

        let still_paginated = {
            let mut state = self.state();
            state.warm_cache = cache;
            state.mode.is_paginated()
        };
        if still_paginated {
            by_employee.invalidate_data();
        }
    }

    // ==================== Derivation ====================

    /// Recompute the merged list if `expected` is still the mode, otherwise
    /// invalidate the paginated feed a stale load just filled
    fn publish_if_current(&self, expected: &ViewMode) -> bool {
        let current = {
            let mut state = self.state();
            if state.mode == *expected {
                self.recompute_locked(&mut state);
                return true;
            }
            state.mode.clone()
        };

        log::debug!("Discarding page load, view moved to {}", current);
        if !current.is_paginated() {
            self.inner.providers.paginated.invalidate_data();
        }
        false
    }

    fn recompute(&self) {
        let mut state = self.state();
        self.recompute_locked(&mut state);
    }

    fn recompute_locked(&self, state: &mut ViewState) {
        if !self.inner.config.preserve_toggles {
            state.overlay.clear();
        }
        let paginated = self.inner.providers.paginated.data();
        state.merged = merge(
            &state.mode,
            paginated.as_ref(),
            state.scoped.as_deref(),
            &state.overlay,
        );
    }

    // ==================== Single Flight ====================

    /// Run `start`'s future, or join an identical load already in flight.
    ///
    /// Also returns whether this call started the load.
    async fn single_flight<F>(&self, key: LoadKey, start: F) -> (CoreResult<bool>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, CoreResult<bool>>,
    {
        if !self.inner.config.single_flight {
            return (start().await, true);
        }

        let (shared, started) = {
            let mut in_flight = lock(&self.inner.in_flight);
            match in_flight.get(&key) {
                Some(existing) => {
                    log::debug!("Joining in-flight load {:?}", key);
                    (existing.load.clone(), false)
                }
                None => {
                    let id = self.inner.next_load.fetch_add(1, Ordering::SeqCst);
                    let inner = self.inner.clone();
                    let done_key = key.clone();
                    let load = start();
                    let shared = async move {
                        let result = load.await;
                        let mut in_flight = lock(&inner.in_flight);
                        if in_flight.get(&done_key).map_or(false, |f| f.id == id) {
                            in_flight.remove(&done_key);
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, InFlight { id, load: shared.clone() });
                    (shared, true)
                }
            }
        };

        (shared.await, started)
    }

    /// Stop later calls from joining loads started for another intent
    fn retire_other_loads(&self, keep: &LoadKey) {
        lock(&self.inner.in_flight).retain(|key, _| key == keep);
    }
}

// ==================== Tests ====================
