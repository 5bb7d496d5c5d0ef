//! View mode, merge derivation and the approval overlay

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use txview_providers::{PaginatedResult, Transaction};

/// Which source is authoritative for the merged list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "employee_id", rename_all = "snake_case")]
pub enum ViewMode {
    /// The paginated feed
    AllTransactions,
    /// One employee's transactions
    FilteredByEmployee(String),
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::AllTransactions
    }
}

impl ViewMode {
    pub fn selected_employee_id(&self) -> Option<&str> {
        match self {
            ViewMode::AllTransactions => None,
            ViewMode::FilteredByEmployee(id) => Some(id),
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, ViewMode::AllTransactions)
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::AllTransactions => write!(f, "all transactions"),
            ViewMode::FilteredByEmployee(id) => write!(f, "employee {}", id),
        }
    }
}

/// Approval values set locally, keyed by transaction id
#[derive(Debug, Clone, Default)]
pub struct ToggleOverlay {
    approvals: HashMap<String, bool>,
}

impl ToggleOverlay {
    pub fn set(&mut self, transaction_id: &str, approved: bool) {
        self.approvals.insert(transaction_id.to_string(), approved);
    }

    pub fn get(&self, transaction_id: &str) -> Option<bool> {
        self.approvals.get(transaction_id).copied()
    }

    pub fn clear(&mut self) {
        self.approvals.clear();
    }

    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }

    /// The transaction with any local approval applied
    pub fn apply(&self, transaction: &Transaction) -> Transaction {
        match self.get(&transaction.id) {
            Some(approved) if approved != transaction.approved => transaction.with_approved(approved),
            _ => transaction.clone(),
        }
    }
}

/// Derive the merged list from the authoritative source.
///
/// Pure: the result depends only on the arguments. Order follows the source.
pub fn merge(
    mode: &ViewMode,
    paginated: Option<&PaginatedResult>,
    scoped: Option<&[Transaction]>,
    overlay: &ToggleOverlay,
) -> Vec<Arc<Transaction>> {
    let source: &[Transaction] = match mode {
        ViewMode::AllTransactions => paginated.map(|p| p.data.as_slice()).unwrap_or(&[]),
        ViewMode::FilteredByEmployee(_) => scoped.unwrap_or(&[]),
    };

    source.iter().map(|t| Arc::new(overlay.apply(t))).collect()
}
