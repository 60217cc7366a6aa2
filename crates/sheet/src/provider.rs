//! The storage boundary the transfer pipeline reads and writes through.

use crate::book::Book;
use crate::error::{Result, SheetError};
use crate::sheet::{AppendedRange, Sheet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Reference to one sheet inside one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRef {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetRef {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_id, self.sheet_name)
    }
}

/// Backend holding the sheets a transfer moves rows between.
///
/// Row numbers are absolute 1-based sheet rows; row 1 is the header row.
#[async_trait]
pub trait SheetProvider: Send + Sync {
    /// Read the header row and every data row of a sheet.
    async fn read_sheet(&self, sheet: &SheetRef) -> Result<Sheet>;

    /// Read only the header row of a sheet.
    async fn read_headers(&self, sheet: &SheetRef) -> Result<Vec<String>> {
        Ok(self.read_sheet(sheet).await?.headers().to_vec())
    }

    /// Append rows below the last occupied row. Rows must already match the
    /// sheet's column count.
    async fn append_rows(&self, sheet: &SheetRef, rows: Vec<Vec<String>>)
        -> Result<AppendedRange>;

    /// Delete rows one by one, in the order given.
    async fn delete_rows(&self, sheet: &SheetRef, row_numbers: &[usize]) -> Result<()>;
}

/// Volatile in-memory provider: spreadsheet id → [`Book`].
#[derive(Debug, Default)]
pub struct MemoryProvider {
    books: RwLock<HashMap<String, Book>>,
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a whole spreadsheet, replacing any with the same id.
    pub async fn insert_book(&self, book: Book) {
        self.books.write().await.insert(book.id().to_string(), book);
    }

    /// Add or replace one sheet, creating the spreadsheet if needed.
    pub async fn insert_sheet(&self, sheet_ref: &SheetRef, sheet: Sheet) {
        let mut books = self.books.write().await;
        books
            .entry(sheet_ref.spreadsheet_id.clone())
            .or_insert_with(|| Book::new(&sheet_ref.spreadsheet_id))
            .put_sheet(&sheet_ref.sheet_name, sheet);
    }

    /// Copy of the current contents of a sheet.
    pub async fn snapshot(&self, sheet_ref: &SheetRef) -> Result<Sheet> {
        let books = self.books.read().await;
        Ok(Self::book(&books, &sheet_ref.spreadsheet_id)?
            .get_sheet(&sheet_ref.sheet_name)?
            .clone())
    }

    /// Known spreadsheet ids, sorted.
    pub async fn spreadsheet_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.books.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn book<'a>(books: &'a HashMap<String, Book>, id: &str) -> Result<&'a Book> {
        books
            .get(id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound { id: id.to_string() })
    }

    fn book_mut<'a>(books: &'a mut HashMap<String, Book>, id: &str) -> Result<&'a mut Book> {
        books
            .get_mut(id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound { id: id.to_string() })
    }
}

#[async_trait]
impl SheetProvider for MemoryProvider {
    async fn read_sheet(&self, sheet: &SheetRef) -> Result<Sheet> {
        self.snapshot(sheet).await
    }

    async fn read_headers(&self, sheet: &SheetRef) -> Result<Vec<String>> {
        let books = self.books.read().await;
        Ok(Self::book(&books, &sheet.spreadsheet_id)?
            .get_sheet(&sheet.sheet_name)?
            .headers()
            .to_vec())
    }

    async fn append_rows(
        &self,
        sheet: &SheetRef,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendedRange> {
        let mut books = self.books.write().await;
        let target = Self::book_mut(&mut books, &sheet.spreadsheet_id)?
            .get_sheet_mut(&sheet.sheet_name)?;
        let next = target.next_empty_row();
        Ok(target.append_rows(rows)?.unwrap_or(AppendedRange {
            first_row: next,
            last_row: next - 1,
        }))
    }

    async fn delete_rows(&self, sheet: &SheetRef, row_numbers: &[usize]) -> Result<()> {
        let mut books = self.books.write().await;
        let target = Self::book_mut(&mut books, &sheet.spreadsheet_id)?
            .get_sheet_mut(&sheet.sheet_name)?;
        // Work on a copy so a bad row number leaves the sheet untouched.
        let mut updated = target.clone();
        updated.delete_rows(row_numbers)?;
        *target = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> SheetRef {
        SheetRef::new("orders", "Pending")
    }

    async fn provider() -> MemoryProvider {
        let provider = MemoryProvider::new();
        provider
            .insert_sheet(
                &pending(),
                Sheet::from_data(vec![
                    vec!["DATE", "ORDER ID"],
                    vec!["2024-01-10", "ORD-001"],
                    vec!["2024-01-11", "ORD-002"],
                ]),
            )
            .await;
        provider
    }

    #[tokio::test]
    async fn test_read_missing_spreadsheet() {
        let provider = provider().await;
        let err = provider
            .read_sheet(&SheetRef::new("nope", "Pending"))
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::SpreadsheetNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_missing_sheet() {
        let provider = provider().await;
        let err = provider
            .read_headers(&SheetRef::new("orders", "Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::SheetNotFound { .. }));
    }

    #[tokio::test]
    async fn test_append_then_read() {
        let provider = provider().await;
        let range = provider
            .append_rows(
                &pending(),
                vec![vec!["2024-01-12".to_string(), "ORD-003".to_string()]],
            )
            .await
            .unwrap();
        assert_eq!(range.first_row, 4);
        assert_eq!(range.last_row, 4);

        let sheet = provider.read_sheet(&pending()).await.unwrap();
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.row_at(4).unwrap()[1], "ORD-003");
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_sheet_untouched() {
        let provider = provider().await;
        let err = provider.delete_rows(&pending(), &[3, 9]).await.unwrap_err();
        assert!(matches!(err, SheetError::RowOutOfRange { row: 9, .. }));
        assert_eq!(provider.snapshot(&pending()).await.unwrap().row_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_header_row_rejected() {
        let provider = provider().await;
        let err = provider.delete_rows(&pending(), &[1]).await.unwrap_err();
        assert!(matches!(err, SheetError::HeaderRow));
    }
}
