use crate::error::{Result, SheetError};
use serde::Serialize;

/// Absolute row number of the header row.
pub const HEADER_ROW: usize = 1;

/// Absolute row number of the first data row.
pub const FIRST_DATA_ROW: usize = 2;

/// Rows written by a single append, as absolute 1-based sheet row numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendedRange {
    pub first_row: usize,
    pub last_row: usize,
}

impl AppendedRange {
    /// Number of rows covered by the range.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.last_row + 1).saturating_sub(self.first_row)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row
    }
}

/// A sheet: one header row followed by data rows of string cells.
///
/// Every data row is kept exactly as wide as the header row. Rows that are
/// too short are padded with empty cells and rows that are too long are
/// truncated when the sheet is built, so positional access by header index
/// is always in bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create a new sheet with no header row
    #[must_use]
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create an empty sheet with the given header row
    #[must_use]
    pub fn with_headers<S: Into<String>>(name: &str, headers: Vec<S>) -> Self {
        Sheet {
            name: name.to_string(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a sheet from headers and data rows, fitting each row to the header width
    #[must_use]
    pub fn with_rows<S: Into<String>, R: Into<String>>(
        name: &str,
        headers: Vec<S>,
        rows: Vec<Vec<R>>,
    ) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| fit_row(row.into_iter().map(Into::into).collect(), width))
            .collect();

        Sheet {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Create a sheet from a 2D grid where the first row is the header row
    #[must_use]
    pub fn from_data<T: Into<String>>(data: Vec<Vec<T>>) -> Self {
        let mut grid = data.into_iter();
        let headers: Vec<String> = grid
            .next()
            .map(|row| row.into_iter().map(Into::into).collect())
            .unwrap_or_default();
        Self::with_rows("Sheet1", headers, grid.collect())
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Header row (row 1)
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows (row 2 onwards)
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows, excluding the header row
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, as defined by the header row
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    /// Check if the sheet has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Absolute number of the last occupied row (1 when only the header exists)
    #[must_use]
    pub fn last_row(&self) -> usize {
        self.rows.len() + HEADER_ROW
    }

    /// Absolute number of the first empty row
    #[must_use]
    pub fn next_empty_row(&self) -> usize {
        self.last_row() + 1
    }

    /// Get a data row by its absolute sheet row number
    pub fn row_at(&self, row_number: usize) -> Result<&Vec<String>> {
        let index = self.data_index(row_number)?;
        Ok(&self.rows[index])
    }

    // ===== Row Operations =====

    /// Append several rows. Either every row is written or none is.
    pub fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<Option<AppendedRange>> {
        if rows.is_empty() {
            return Ok(None);
        }
        if self.headers.is_empty() {
            return Err(SheetError::EmptyHeader {
                name: self.name.clone(),
            });
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != self.col_count()) {
            return Err(SheetError::LengthMismatch {
                expected: self.col_count(),
                actual: bad.len(),
            });
        }

        let first_row = self.next_empty_row();
        self.rows.extend(rows);
        Ok(Some(AppendedRange {
            first_row,
            last_row: self.last_row(),
        }))
    }

    /// Delete a data row by its absolute sheet row number, returning its cells
    pub fn row_delete(&mut self, row_number: usize) -> Result<Vec<String>> {
        let index = self.data_index(row_number)?;
        Ok(self.rows.remove(index))
    }

    /// Delete rows by absolute row number, one at a time, in the order given.
    ///
    /// Every deletion shifts the rows below it up by one, so callers that
    /// hold pre-deletion row numbers must pass them highest first.
    pub fn delete_rows(&mut self, row_numbers: &[usize]) -> Result<()> {
        for &row_number in row_numbers {
            self.row_delete(row_number)?;
        }
        Ok(())
    }

    fn data_index(&self, row_number: usize) -> Result<usize> {
        if row_number == HEADER_ROW {
            return Err(SheetError::HeaderRow);
        }
        if row_number < FIRST_DATA_ROW || row_number > self.last_row() {
            return Err(SheetError::RowOutOfRange {
                row: row_number,
                last_row: self.last_row(),
            });
        }
        Ok(row_number - FIRST_DATA_ROW)
    }
}

/// Pad a row with empty cells on the right, or drop trailing cells, so it is
/// exactly `width` cells wide.
#[must_use]
pub fn fit_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}
