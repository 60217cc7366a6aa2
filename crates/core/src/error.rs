//! Error types for sheetshift transfers.

use crate::progress::TransferStatus;
use sheetshift_sheet::SheetError;
use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Coarse error class, used to pick HTTP status codes and exit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Write,
    Delete,
    Internal,
}

/// Errors that can occur while validating, filtering or transferring rows.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A spreadsheet, sheet or transfer record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request parameters or sheet layout.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider read failed for a reason other than a missing sheet.
    #[error("Failed to {operation}: {source}")]
    Read {
        operation: String,
        #[source]
        source: SheetError,
    },

    /// Appending a chunk to the destination failed. Always fatal.
    #[error("Failed to transfer chunk {chunk} of {total_chunks}: {source}")]
    WriteFailure {
        chunk: usize,
        total_chunks: usize,
        #[source]
        source: SheetError,
    },

    /// Deleting moved rows from the source failed.
    #[error("Failed to delete {rows} source rows: {source}")]
    DeleteFailure {
        rows: usize,
        #[source]
        source: SheetError,
    },

    /// A terminal transfer record was asked to change.
    #[error("Transfer {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TransferStatus,
        to: TransferStatus,
    },

    /// A transfer record with this id already exists.
    #[error("Transfer already exists: {0}")]
    AlreadyExists(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TransferError {
    /// Wrap a provider error raised while reading, keeping "not found" distinct.
    pub fn read(operation: impl Into<String>, source: SheetError) -> Self {
        if source.is_not_found() {
            Self::NotFound(source.to_string())
        } else {
            Self::Read {
                operation: operation.into(),
                source,
            }
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) | Self::Config(_) | Self::Yaml(_) => ErrorKind::Validation,
            Self::WriteFailure { .. } => ErrorKind::Write,
            Self::DeleteFailure { .. } => ErrorKind::Delete,
            Self::Read { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyExists(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}
