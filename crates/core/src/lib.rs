//! # sheetshift-core
//!
//! Order-sheet row transfer pipeline.
//!
//! This crate provides:
//! - Date range and status filtering of a source sheet
//! - Duplicate detection against the destination by order identity
//! - Chunked appends with move-mode source cleanup
//! - Transfer progress records and their store
//! - Header validation against the standard order-sheet layout
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use sheetshift_core::{FilterCriteria, ColumnRules, filter_sheet};
//! use sheetshift_sheet::Sheet;
//!
//! let sheet = Sheet::from_data(vec![
//!     vec!["DATE", "ORDER ID", "STATUS"],
//!     vec!["2024-01-10", "ORD-001", "pending"],
//!     vec!["2024-03-01", "ORD-002", "pending"],
//! ]);
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let criteria = FilterCriteria::new(day(1), day(31)).with_status("Pending");
//!
//! let data = filter_sheet(&sheet, &criteria, &ColumnRules::default()).unwrap();
//! assert_eq!(data.source_row_numbers, vec![2]);
//! ```

/// Header discovery heuristics.
pub mod columns;
/// Transfer configuration.
pub mod config;
/// Cell date parsing.
pub mod dates;
/// Duplicate detection.
pub mod duplicates;
/// Error types and result aliases.
pub mod error;
/// The transfer executor.
pub mod executor;
/// Row filtering.
pub mod filter;
/// Header validation.
pub mod headers;
/// Progress records and stores.
pub mod progress;
/// Transfer requests.
pub mod request;
/// Service facade used by the server and the CLI.
pub mod service;

pub use columns::{find_column, ColumnMatcher, ColumnRules};
pub use config::{TransferConfig, DEFAULT_CHUNK_SIZE};
pub use duplicates::{find_duplicates, DuplicatePartition, IdentityKey, RowSet};
pub use error::{ErrorKind, TransferError, TransferResult};
pub use executor::{TransferExecutor, TransferReport, TransferSummary};
pub use filter::{filter_sheet, FilterCriteria, FilteredData};
pub use headers::{compare_headers, validate_headers, HeaderMismatch, REQUIRED_HEADERS};
pub use progress::{
    MemoryProgressStore, ProgressStore, TransferRecord, TransferStats, TransferStatus,
};
pub use request::{DuplicateHandling, TransferMode, TransferRequest};
pub use service::TransferService;
