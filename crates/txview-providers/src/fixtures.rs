//! JSON fixture data backing the in-memory providers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ProviderError, ProviderResult};
use crate::models::{Employee, Transaction};

/// Employees and transactions loaded from a fixture file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    pub employees: Vec<Employee>,
    pub transactions: Vec<Transaction>,
}

impl FixtureData {
    /// Parse and validate fixture JSON
    pub fn from_json(content: &str) -> ProviderResult<Self> {
        let data: FixtureData = serde_json::from_str(content)
            .map_err(|e| ProviderError::InvalidFixture { message: e.to_string() })?;
        data.validate()?;
        Ok(data)
    }

    /// Read a fixture file from disk
    pub async fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let data = Self::from_json(&content).map_err(|e| match e {
            ProviderError::InvalidFixture { message } => ProviderError::InvalidFixture {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })?;
        log::info!(
            "Loaded {} employees and {} transactions from {}",
            data.employees.len(),
            data.transactions.len(),
            path.display()
        );
        Ok(data)
    }

    /// Check id invariants the view relies on
    pub fn validate(&self) -> ProviderResult<()> {
        let mut employee_ids = HashSet::new();
        for employee in &self.employees {
            if employee.id.is_empty() {
                return Err(ProviderError::InvalidFixture {
                    message: format!("employee {} has an empty id", employee.full_name()),
                });
            }
            if !employee_ids.insert(employee.id.as_str()) {
                return Err(ProviderError::InvalidFixture {
                    message: format!("duplicate employee id {}", employee.id),
                });
            }
        }

        let mut transaction_ids = HashSet::new();
        for transaction in &self.transactions {
            if !transaction_ids.insert(transaction.id.as_str()) {
                return Err(ProviderError::InvalidFixture {
                    message: format!("duplicate transaction id {}", transaction.id),
                });
            }
            if !employee_ids.contains(transaction.employee_id.as_str()) {
                return Err(ProviderError::InvalidFixture {
                    message: format!(
                        "transaction {} references unknown employee {}",
                        transaction.id, transaction.employee_id
                    ),
                });
            }
        }

        Ok(())
    }
}
