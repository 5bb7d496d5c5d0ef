//! Employee and transaction data providers
//!
//! A provider fetches data on demand, keeps the last result cached and can be
//! invalidated. The view orchestrator only talks to the traits below; the
//! in-memory implementations serve fixture data.

use async_trait::async_trait;
use std::sync::Arc;

pub mod error;
pub mod fixtures;
pub mod memory;
pub mod models;

pub use error::{ProviderError, ProviderResult};
pub use fixtures::FixtureData;
pub use memory::{MemoryByEmployee, MemoryDirectory, MemoryPaginated};
pub use models::{Employee, PaginatedResult, Transaction};

// ==================== Provider Traits ====================

/// Source of the employee list
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Fetch every employee, caching the result
    async fn fetch_all(&self) -> ProviderResult<Vec<Employee>>;

    /// Cached employees, `None` until loaded
    fn data(&self) -> Option<Vec<Employee>>;

    /// Whether a fetch is in progress
    fn loading(&self) -> bool;
}

/// Paginated feed of all transactions
#[async_trait]
pub trait PaginatedTransactions: Send + Sync {
    /// Fetch the next page and append it to the cached result.
    ///
    /// Returns the cumulative result. Once `next_page` is `None` this returns
    /// the cached result without fetching.
    async fn fetch_all(&self) -> ProviderResult<PaginatedResult>;

    /// Drop the accumulated pages and cursor
    fn invalidate_data(&self);

    fn data(&self) -> Option<PaginatedResult>;

    fn loading(&self) -> bool;
}

/// Transactions for one employee, fetched on demand
#[async_trait]
pub trait EmployeeTransactions: Send + Sync {
    /// Fetch one employee's transactions, replacing the cached list
    async fn fetch_by_id(&self, employee_id: &str) -> ProviderResult<Vec<Transaction>>;

    fn invalidate_data(&self);

    fn data(&self) -> Option<Vec<Transaction>>;

    fn loading(&self) -> bool;
}

/// Shared provider handles
pub type DirectoryRef = Arc<dyn EmployeeDirectory>;
pub type PaginatedRef = Arc<dyn PaginatedTransactions>;
pub type ByEmployeeRef = Arc<dyn EmployeeTransactions>;

/// The three providers the view works against
#[derive(Clone)]
pub struct ProviderSet {
    pub directory: DirectoryRef,
    pub paginated: PaginatedRef,
    pub by_employee: ByEmployeeRef,
}

impl ProviderSet {
    /// Build in-memory providers over fixture data
    pub fn in_memory(data: FixtureData, page_size: usize, latency: std::time::Duration) -> Self {
        let data = Arc::new(data);
        Self {
            directory: Arc::new(MemoryDirectory::new(data.clone(), latency)),
            paginated: Arc::new(MemoryPaginated::new(data.clone(), page_size, latency)),
            by_employee: Arc::new(MemoryByEmployee::new(data, latency)),
        }
    }
}
