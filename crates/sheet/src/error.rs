use thiserror::Error;

/// Errors that can occur during sheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Spreadsheet not found: {id}")]
    SpreadsheetNotFound { id: String },

    #[error("Sheet not found: {name} (spreadsheet {spreadsheet})")]
    SheetNotFound { spreadsheet: String, name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Row {row} out of range (sheet has rows 2..={last_row})")]
    RowOutOfRange { row: usize, last_row: usize },

    #[error("Row 1 is the header row, not a data row")]
    HeaderRow,

    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Sheet '{name}' has an empty header row")]
    EmptyHeader { name: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Whether the error means the spreadsheet or sheet does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SheetError::SpreadsheetNotFound { .. } | SheetError::SheetNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
