//! Error types for txview-providers

use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid fixture data: {message}")]
    InvalidFixture { message: String },

    #[error("IO error")]
    IoError(#[from] io::Error),
}

/// Result type with ProviderError
pub type ProviderResult<T> = Result<T, ProviderError>;
