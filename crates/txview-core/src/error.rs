//! Error types for txview-core
//!
//! Errors carry a code, a severity and suggestions so the presentation
//! layer can decide how to show them. The orchestrator never swallows a
//! fetch failure; it logs it and hands it back to the caller.

use thiserror::Error;
use serde::{Deserialize, Serialize};
use txview_providers::ProviderError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A provider fetch failed
    FetchFailure,
    /// The selected employee is not in the directory
    InvalidSelection,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::FetchFailure => write!(f, "FETCH_FAILURE"),
            ErrorCode::InvalidSelection => write!(f, "INVALID_SELECTION"),
        }
    }
}

/// Detailed error information for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Recovered locally
    Warning,
    /// Operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for txview-core.
///
/// `Clone` so one in-flight load can hand its result to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Failed to fetch {source_name}: {message}")]
    FetchFailure { source_name: String, message: String },

    #[error("Employee not found: {employee_id}")]
    InvalidSelection { employee_id: String },
}

impl CoreError {
    /// Wrap a provider error for the named data source
    pub fn fetch(source_name: &str, error: ProviderError) -> Self {
        CoreError::FetchFailure {
            source_name: source_name.to_string(),
            message: error.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::FetchFailure { .. } => ErrorCode::FetchFailure,
            CoreError::InvalidSelection { .. } => ErrorCode::InvalidSelection,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::FetchFailure { .. } => ErrorSeverity::Error,
            CoreError::InvalidSelection { .. } => ErrorSeverity::Warning,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::FetchFailure { source_name, message } => {
                details = details.with_detail(serde_json::json!({
                    "source": source_name,
                    "provider_message": message,
                }));
                details = details.with_suggestion(
                    "Retry the action; the previous view has been cleared.".to_string()
                );
            }
            CoreError::InvalidSelection { employee_id } => {
                details = details.with_suggestion(format!(
                    "Employee '{}' is not in the directory, showing all transactions instead.",
                    employee_id
                ));
            }
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Employee the operation targeted, if any
    pub employee_id: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            employee_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: &str) -> Self {
        self.employee_id = Some(employee_id.to_string());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "txview::error",
            "ERROR [{}] {} - Operation: {} - Employee: {:?}",
            error.code(),
            error,
            context.operation,
            context.employee_id
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "txview::error",
            "WARNING: {} - Operation: {} - Employee: {:?}",
            message,
            context.operation,
            context.employee_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FetchFailure.to_string(), "FETCH_FAILURE");
        assert_eq!(ErrorCode::InvalidSelection.to_string(), "INVALID_SELECTION");
    }

    #[test]
    fn test_fetch_failure_from_provider() {
        let error = CoreError::fetch(
            "paginated transactions",
            ProviderError::RequestFailed { message: "timeout".to_string() },
        );
        assert_eq!(error.code(), ErrorCode::FetchFailure);
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert!(error.to_string().contains("paginated transactions"));
        assert!(error.to_string().contains("timeout"));

        let details = error.to_details();
        assert!(details.details.is_some());
        assert_eq!(details.suggestions.len(), 1);
    }

    #[test]
    fn test_invalid_selection_details() {
        let error = CoreError::InvalidSelection { employee_id: "42".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        let details = error.to_details();
        assert!(details.to_string().contains("INVALID_SELECTION"));
        assert!(details.suggestions[0].contains("42"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("load_transactions_by_employee").with_employee("7");
        assert_eq!(context.operation, "load_transactions_by_employee");
        assert_eq!(context.employee_id.as_deref(), Some("7"));
    }
}
