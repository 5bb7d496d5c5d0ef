//! In-memory providers serving fixture data

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};
use crate::fixtures::FixtureData;
use crate::models::{Employee, PaginatedResult, Transaction};
use crate::{EmployeeDirectory, EmployeeTransactions, PaginatedTransactions};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counts in-progress fetches
#[derive(Debug, Default)]
struct LoadingFlag(AtomicUsize);

impl LoadingFlag {
    fn enter(&self) -> LoadingGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(&self.0)
    }

    fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

// ==================== Employee Directory ====================

/// Employee directory over fixture data
pub struct MemoryDirectory {
    source: Arc<FixtureData>,
    latency: Duration,
    cache: Mutex<Option<Vec<Employee>>>,
    loading: LoadingFlag,
    serial: tokio::sync::Mutex<()>,
}

impl MemoryDirectory {
    pub fn new(source: Arc<FixtureData>, latency: Duration) -> Self {
        Self {
            source,
            latency,
            cache: Mutex::new(None),
            loading: LoadingFlag::default(),
            serial: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn fetch_all(&self) -> ProviderResult<Vec<Employee>> {
        let _loading = self.loading.enter();
        let _serial = self.serial.lock().await;

        if let Some(cached) = lock(&self.cache).clone() {
            return Ok(cached);
        }

        simulate_latency(self.latency).await;
        let employees = self.source.employees.clone();
        log::debug!("Fetched {} employees", employees.len());
        *lock(&self.cache) = Some(employees.clone());
        Ok(employees)
    }

    fn data(&self) -> Option<Vec<Employee>> {
        lock(&self.cache).clone()
    }

    fn loading(&self) -> bool {
        self.loading.get()
    }
}

// ==================== Paginated Transactions ====================

/// Paginated transaction feed over fixture data.
///
/// The cursor is the index of the next page rendered as a string.
pub struct MemoryPaginated {
    source: Arc<FixtureData>,
    page_size: usize,
    latency: Duration,
    cache: Mutex<Option<PaginatedResult>>,
    loading: LoadingFlag,
    serial: tokio::sync::Mutex<()>,
}

impl MemoryPaginated {
    pub fn new(source: Arc<FixtureData>, page_size: usize, latency: Duration) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            latency,
            cache: Mutex::new(None),
            loading: LoadingFlag::default(),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    fn page(&self, index: usize) -> (Vec<Transaction>, Option<String>) {
        let all = &self.source.transactions;
        let start = (index * self.page_size).min(all.len());
        let end = (start + self.page_size).min(all.len());
        let next_page = if end < all.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        (all[start..end].to_vec(), next_page)
    }
}

#[async_trait]
impl PaginatedTransactions for MemoryPaginated {
    async fn fetch_all(&self) -> ProviderResult<PaginatedResult> {
        let _loading = self.loading.enter();
        let _serial = self.serial.lock().await;

        if let Some(cached) = lock(&self.cache).as_ref() {
            if !cached.has_more() {
                return Ok(cached.clone());
            }
        }

        simulate_latency(self.latency).await;

        // Read the cursor after the wait so an invalidation during it restarts at page 0
        let mut cache = lock(&self.cache);
        let index = match cache.as_ref().and_then(|c| c.next_page.as_deref()) {
            Some(cursor) => cursor.parse::<usize>().map_err(|_| ProviderError::InvalidRequest {
                message: format!("invalid page cursor {}", cursor),
            })?,
            None if cache.is_some() => return Ok(cache.clone().unwrap_or_default()),
            None => 0,
        };

        let (page, next_page) = self.page(index);
        log::debug!(
            "Fetched transactions page {} ({} rows, next: {:?})",
            index,
            page.len(),
            next_page
        );

        let result = cache.get_or_insert_with(PaginatedResult::default);
        result.data.extend(page);
        result.next_page = next_page;
        Ok(result.clone())
    }

    fn invalidate_data(&self) {
        *lock(&self.cache) = None;
    }

    fn data(&self) -> Option<PaginatedResult> {
        lock(&self.cache).clone()
    }

    fn loading(&self) -> bool {
        self.loading.get()
    }
}

// ==================== Transactions By Employee ====================

/// Per-employee transaction lookup over fixture data
pub struct MemoryByEmployee {
    source: Arc<FixtureData>,
    latency: Duration,
    cache: Mutex<Option<Vec<Transaction>>>,
    loading: LoadingFlag,
    serial: tokio::sync::Mutex<()>,
}

impl MemoryByEmployee {
    pub fn new(source: Arc<FixtureData>, latency: Duration) -> Self {
        Self {
            source,
            latency,
            cache: Mutex::new(None),
            loading: LoadingFlag::default(),
            serial: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl EmployeeTransactions for MemoryByEmployee {
    async fn fetch_by_id(&self, employee_id: &str) -> ProviderResult<Vec<Transaction>> {
        if employee_id.is_empty() {
            return Err(ProviderError::InvalidRequest {
                message: "employee id cannot be empty".to_string(),
            });
        }

        let _loading = self.loading.enter();
        let _serial = self.serial.lock().await;
        simulate_latency(self.latency).await;

        let transactions: Vec<Transaction> = self
            .source
            .transactions
            .iter()
            .filter(|t| t.employee_id == employee_id)
            .cloned()
            .collect();
        log::debug!(
            "Fetched {} transactions for employee {}",
            transactions.len(),
            employee_id
        );

        *lock(&self.cache) = Some(transactions.clone());
        Ok(transactions)
    }

    fn invalidate_data(&self) {
        *lock(&self.cache) = None;
    }

    fn data(&self) -> Option<Vec<Transaction>> {
        lock(&self.cache).clone()
    }

    fn loading(&self) -> bool {
        self.loading.get()
    }
}

// ==================== Tests ====================
