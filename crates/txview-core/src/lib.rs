//! Core transaction view logic
//!
//! - orchestrator: `TransactionView`, the state machine behind the screen
//! - view: view mode, merge derivation, approval overlay
//! - error: error taxonomy and logging

pub mod error;
pub mod orchestrator;
pub mod view;

pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use orchestrator::TransactionView;
pub use view::{merge, ToggleOverlay, ViewMode};

pub use txview_providers::{Employee, PaginatedResult, ProviderSet, Transaction};
