use crate::error::{TransferError, TransferResult};
use crate::filter::FilterCriteria;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sheetshift_sheet::SheetRef;
use std::fmt;

/// Whether transferred rows stay in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    #[default]
    Copy,
    /// Copy, then delete the transferred rows from the source.
    Move,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Move => "move",
        })
    }
}

/// What to do with rows already present in the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHandling {
    #[default]
    Skip,
    Update,
    AddAll,
}

impl fmt::Display for DuplicateHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Update => "update",
            Self::AddAll => "add_all",
        })
    }
}

/// One transfer, as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_spreadsheet_id: String,
    pub source_sheet_name: String,
    pub destination_spreadsheet_id: String,
    pub destination_sheet_name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mode: TransferMode,
    #[serde(default)]
    pub duplicate_handling: DuplicateHandling,
}

impl TransferRequest {
    pub fn new(source: &SheetRef, destination: &SheetRef, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            source_spreadsheet_id: source.spreadsheet_id.clone(),
            source_sheet_name: source.sheet_name.clone(),
            destination_spreadsheet_id: destination.spreadsheet_id.clone(),
            destination_sheet_name: destination.sheet_name.clone(),
            from_date: from,
            to_date: to,
            status: None,
            mode: TransferMode::Copy,
            duplicate_handling: DuplicateHandling::Skip,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_duplicate_handling(mut self, handling: DuplicateHandling) -> Self {
        self.duplicate_handling = handling;
        self
    }

    pub fn source(&self) -> SheetRef {
        SheetRef::new(&self.source_spreadsheet_id, &self.source_sheet_name)
    }

    pub fn destination(&self) -> SheetRef {
        SheetRef::new(&self.destination_spreadsheet_id, &self.destination_sheet_name)
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            from_date: self.from_date,
            to_date: self.to_date,
            status: self.status.clone(),
        }
    }

    /// Reject requests the executor cannot carry out.
    pub fn validate(&self) -> TransferResult<()> {
        let blank = [
            ("sourceSpreadsheetId", &self.source_spreadsheet_id),
            ("sourceSheetName", &self.source_sheet_name),
            ("destinationSpreadsheetId", &self.destination_spreadsheet_id),
            ("destinationSheetName", &self.destination_sheet_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
        if !blank.is_empty() {
            return Err(TransferError::validation(format!(
                "Missing required parameters: {}",
                blank.join(", ")
            )));
        }
        if self.source() == self.destination() {
            return Err(TransferError::validation(
                "Source and destination must be different sheets",
            ));
        }
        // Only skip has defined semantics so far.
        if self.duplicate_handling != DuplicateHandling::Skip {
            return Err(TransferError::validation(format!(
                "Duplicate handling '{}' is not supported; use 'skip'",
                self.duplicate_handling
            )));
        }
        Ok(())
    }
}
