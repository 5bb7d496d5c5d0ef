//! Data model shared by providers and the view orchestrator

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An employee who owns transactions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Employee {
    /// Sentinel meaning "no employee filter". Its id is empty, which real
    /// employees are not allowed to have.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            first_name: "All".to_string(),
            last_name: "Employees".to_string(),
        }
    }

    /// Whether this is the "no filter" sentinel
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A single card transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique within a session
    pub id: String,
    pub amount: Decimal,
    pub employee_id: String,
    pub merchant: String,
    /// Transaction date (YYYY-MM-DD)
    pub date: String,
    /// Approval flag, the only field the view ever changes
    #[serde(default)]
    pub approved: bool,
}

impl Transaction {
    /// Parse the date into NaiveDate
    pub fn date_naive(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Copy of this transaction with the approval flag set
    pub fn with_approved(&self, approved: bool) -> Self {
        Self {
            approved,
            ..self.clone()
        }
    }
}

/// Cumulative result of repeated page fetches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult {
    pub data: Vec<Transaction>,
    /// Cursor for the next page, `None` once the feed is exhausted
    pub next_page: Option<String>,
}

impl PaginatedResult {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}
