use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use indexmap::IndexMap;

/// A spreadsheet containing multiple named sheets (preserves insertion order)
#[derive(Debug, Clone, Default)]
pub struct Book {
    id: String,
    sheets: IndexMap<String, Sheet>,
}

impl Book {
    /// Create a new empty book with the given spreadsheet id
    #[must_use]
    pub fn new(id: &str) -> Self {
        Book {
            id: id.to_string(),
            sheets: IndexMap::new(),
        }
    }

    /// Get the spreadsheet id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    // ===== Sheet Access =====

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets.get(name).ok_or_else(|| self.not_found(name))
    }

    /// Get a mutable sheet by name
    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        let id = &self.id;
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                spreadsheet: id.clone(),
                name: name.to_string(),
            })
    }

    // ===== Sheet Management =====

    /// Add a sheet to the book
    pub fn add_sheet(&mut self, name: &str, sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// Add or replace a sheet, keeping its position if it already existed
    pub fn put_sheet(&mut self, name: &str, sheet: Sheet) -> Option<Sheet> {
        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet)
    }

    /// Iterate over sheets in order
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    fn not_found(&self, name: &str) -> SheetError {
        SheetError::SheetNotFound {
            spreadsheet: self.id.clone(),
            name: name.to_string(),
        }
    }
}
