use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification of an [`EconomyError`], used by callers to decide
/// how to report a failure (reject the request, ask the user to retry, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Never retried.
    Validation,
    /// A business rule rejected the operation before any state was mutated.
    DomainRule,
    /// A catalog or account row is missing and no default applies.
    NotFound,
    /// The caller could not be authenticated.
    Unauthorized,
    /// The caller's deadline elapsed while waiting for background work.
    Timeout,
    /// Persistence or runtime failure.
    Infrastructure,
}

#[derive(Error, Diagnostic, Debug)]
pub enum EconomyError {
    #[error("Validation error: {0}")]
    #[diagnostic(code(idlecoin::validation))]
    ValidationError(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    #[diagnostic(code(idlecoin::insufficient_funds))]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("Item {item} is not owned")]
    #[diagnostic(code(idlecoin::not_owned))]
    NotOwned { item: i64 },

    #[error("Worker {worker} is already at its maximum level")]
    #[diagnostic(code(idlecoin::max_level_reached))]
    MaxLevelReached { worker: i64 },

    #[error("Invalid state: {0}")]
    #[diagnostic(code(idlecoin::invalid_state))]
    InvalidState(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(idlecoin::not_found))]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    #[diagnostic(code(idlecoin::unauthorized), help("check the init data and the bot token"))]
    Unauthorized(String),

    #[error("Request timed out after {0:?}")]
    #[diagnostic(code(idlecoin::timeout))]
    Timeout(Duration),

    #[error("CSV error: {0}")]
    #[diagnostic(code(idlecoin::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(idlecoin::io))]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(idlecoin::json))]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    #[diagnostic(code(idlecoin::rocksdb))]
    RocksDbError(#[from] rocksdb::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(idlecoin::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl EconomyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EconomyError::ValidationError(_) => ErrorKind::Validation,
            EconomyError::InsufficientFunds { .. }
            | EconomyError::NotOwned { .. }
            | EconomyError::MaxLevelReached { .. }
            | EconomyError::InvalidState(_) => ErrorKind::DomainRule,
            EconomyError::NotFound(_) => ErrorKind::NotFound,
            EconomyError::Unauthorized(_) => ErrorKind::Unauthorized,
            EconomyError::Timeout(_) => ErrorKind::Timeout,
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Wraps any foreign error as an infrastructure failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EconomyError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, EconomyError>;
