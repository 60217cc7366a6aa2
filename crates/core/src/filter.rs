//! Date-range and status filtering of source rows.

use crate::columns::{find_column, ColumnRules};
use crate::dates::{end_of_day, parse_cell_datetime, start_of_day};
use crate::error::{TransferError, TransferResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sheetshift_sheet::{Sheet, FIRST_DATA_ROW};

/// Which rows to pick from a source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub from_date: NaiveDate,
    /// Inclusive through the end of this day.
    pub to_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
}

impl FilterCriteria {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            from_date,
            to_date,
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Status filter, if one was given and is not blank.
    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Rows selected by the filter, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    /// Absolute sheet row number each entry of `rows` came from.
    pub source_row_numbers: Vec<usize>,
}

impl FilteredData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Select the rows whose date falls in `[from, to]` (end-of-day inclusive)
/// and, when a status filter is given and the sheet has a status column,
/// whose status matches case-insensitively.
///
/// The sheet must have a date column. A missing status column disables the
/// status filter instead of failing. A reversed range simply matches nothing.
pub fn filter_sheet(
    sheet: &Sheet,
    criteria: &FilterCriteria,
    rules: &ColumnRules,
) -> TransferResult<FilteredData> {
    let headers = sheet.headers();
    let date_col = find_column(headers, &rules.date).ok_or_else(|| {
        TransferError::validation(format!(
            "No date column found in sheet '{}' (looked for a header containing \"{}\")",
            sheet.name(),
            rules.date.describe()
        ))
    })?;

    let status = match criteria.status_filter() {
        Some(wanted) => match find_column(headers, &rules.status) {
            Some(col) => Some((col, wanted.to_lowercase())),
            None => {
                tracing::debug!(
                    sheet = sheet.name(),
                    "No status column; ignoring status filter"
                );
                None
            }
        },
        None => None,
    };

    let from = start_of_day(criteria.from_date);
    let to = end_of_day(criteria.to_date);

    let mut rows = Vec::new();
    let mut source_row_numbers = Vec::new();
    for (index, row) in sheet.rows().iter().enumerate() {
        let Some(when) = row.get(date_col).and_then(|v| parse_cell_datetime(v)) else {
            continue;
        };
        if when < from || when > to {
            continue;
        }
        if let Some((col, wanted)) = &status {
            let actual = row.get(*col).map(|v| v.trim().to_lowercase());
            if actual.as_deref() != Some(wanted.as_str()) {
                continue;
            }
        }
        rows.push(row.clone());
        source_row_numbers.push(index + FIRST_DATA_ROW);
    }

    Ok(FilteredData {
        headers: headers.to_vec(),
        row_count: rows.len(),
        rows,
        source_row_numbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source() -> Sheet {
        Sheet::from_data(vec![
            vec!["DATE", "ORDER ID", "REMARKS ON STATUS", "STATUS"],
            vec!["2024-01-10", "ORD-001", "called", "pending"],
            vec!["2024-01-11 23:59:59", "ORD-002", "", " Pending "],
            vec!["2024-01-12", "ORD-003", "pending", "delivered"],
            vec!["not a date", "ORD-004", "", "pending"],
            vec!["2024-01-11", "ORD-005", "", "returned"],
        ])
    }

    #[test]
    fn test_range_is_end_of_day_inclusive() {
        let criteria = FilterCriteria::new(ymd(2024, 1, 10), ymd(2024, 1, 11));
        let data = filter_sheet(&source(), &criteria, &ColumnRules::default()).unwrap();

        let ids: Vec<&str> = data.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(ids, vec!["ORD-001", "ORD-002", "ORD-005"]);
        assert_eq!(data.row_count, 3);
        assert_eq!(data.source_row_numbers, vec![2, 3, 6]);
        assert_eq!(data.headers.len(), 4);
    }

    #[test]
    fn test_status_uses_status_column_not_remarks() {
        let criteria =
            FilterCriteria::new(ymd(2024, 1, 1), ymd(2024, 1, 31)).with_status("PENDING");
        let data = filter_sheet(&source(), &criteria, &ColumnRules::default()).unwrap();

        let ids: Vec<&str> = data.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(ids, vec!["ORD-001", "ORD-002"]);
        assert_eq!(data.source_row_numbers, vec![2, 3]);
    }

    #[test]
    fn test_blank_status_means_no_filter() {
        let criteria = FilterCriteria::new(ymd(2024, 1, 1), ymd(2024, 1, 31)).with_status("  ");
        let data = filter_sheet(&source(), &criteria, &ColumnRules::default()).unwrap();
        assert_eq!(data.row_count, 4);
    }

    #[test]
    fn test_missing_status_column_ignores_filter() {
        let sheet = Sheet::from_data(vec![
            vec!["DATE", "ORDER ID"],
            vec!["2024-01-10", "ORD-001"],
            vec!["2024-01-11", "ORD-002"],
        ]);
        let criteria =
            FilterCriteria::new(ymd(2024, 1, 10), ymd(2024, 1, 11)).with_status("delivered");
        let data = filter_sheet(&sheet, &criteria, &ColumnRules::default()).unwrap();
        assert_eq!(data.row_count, 2);
    }

    #[test]
    fn test_missing_date_column_is_validation_error() {
        let sheet = Sheet::from_data(vec![vec!["ORDER ID"], vec!["ORD-001"]]);
        let criteria = FilterCriteria::new(ymd(2024, 1, 10), ymd(2024, 1, 11));
        let err = filter_sheet(&sheet, &criteria, &ColumnRules::default()).unwrap_err();
        assert!(matches!(err, TransferError::Validation(_)));
    }

    #[test]
    fn test_reversed_range_matches_nothing() {
        let criteria = FilterCriteria::new(ymd(2024, 1, 12), ymd(2024, 1, 10));
        let data = filter_sheet(&source(), &criteria, &ColumnRules::default()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_header_only_sheet() {
        let sheet = Sheet::from_data(vec![vec!["DATE", "ORDER ID"]]);
        let criteria = FilterCriteria::new(ymd(2024, 1, 1), ymd(2024, 12, 31));
        let data = filter_sheet(&sheet, &criteria, &ColumnRules::default()).unwrap();
        assert!(data.is_empty());
        assert!(data.source_row_numbers.is_empty());
    }

    #[test]
    fn test_criteria_from_json() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"fromDate":"2024-01-10","toDate":"2024-01-11"}"#).unwrap();
        assert_eq!(criteria.from_date, ymd(2024, 1, 10));
        assert_eq!(criteria.status_filter(), None);
    }
}
