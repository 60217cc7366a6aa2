//! Sheet/Book model for sheetshift
//!
//! A [`Sheet`] is a header row plus data rows of string cells, addressed the
//! way a spreadsheet addresses them: row 1 is the header row and data rows
//! start at row 2. A [`Book`] is one spreadsheet holding named sheets.
//!
//! The transfer pipeline only talks to storage through [`SheetProvider`];
//! [`MemoryProvider`] is the volatile in-memory implementation.
//!
//! # Examples
//!
//! ```
//! use sheetshift_sheet::Sheet;
//!
//! let sheet = Sheet::from_data(vec![
//!     vec!["DATE", "ORDER ID", "STATUS"],
//!     vec!["2024-01-10", "ORD-001", "pending"],
//!     vec!["2024-01-11", "ORD-002"],
//! ]);
//!
//! assert_eq!(sheet.row_count(), 2);
//! assert_eq!(sheet.col_count(), 3);
//! // Short rows are padded to the header width.
//! assert_eq!(sheet.row_at(3).unwrap()[2], "");
//! ```
//!
//! ## Loading from CSV
//!
//! ```no_run
//! use sheetshift_sheet::Sheet;
//!
//! let sheet = Sheet::from_csv("orders.csv").unwrap();
//! ```

mod book;
mod csv;
mod error;
pub mod provider;
mod sheet;

/// Re-export book type.
pub use book::Book;
/// Re-export CSV options.
pub use csv::CsvOptions;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export the storage boundary.
pub use provider::{MemoryProvider, SheetProvider, SheetRef};
/// Re-export sheet types.
pub use sheet::{fit_row, AppendedRange, Sheet, FIRST_DATA_ROW, HEADER_ROW};
