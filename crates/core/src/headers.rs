//! Header contract validation between a source and a destination sheet.

use crate::error::{TransferError, TransferResult};
use serde::Serialize;
use sheetshift_sheet::{SheetProvider, SheetRef};
use std::collections::HashSet;

/// The standard order-sheet header layout, in display order.
pub const REQUIRED_HEADERS: [&str; 14] = [
    "DATE",
    "ORDER ID",
    "TRACKING ID",
    "CUSTOMER NAME",
    "PHONE",
    "CITY",
    "COD",
    "REMARKS ON STATUS",
    "AGENT NAME",
    "STATUS",
    "EXPORT",
    "DELIVERY TYPE",
    "RETURN REASON",
    "REMARKS IF RETURNED",
];

/// Differences between the required header set and a destination's headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMismatch {
    /// Required headers, as configured.
    pub expected: Vec<String>,
    /// Required headers the destination lacks.
    pub missing: Vec<String>,
    /// Destination headers outside the required set.
    pub extra: Vec<String>,
}

fn normalize(header: &str) -> String {
    header.trim().to_uppercase()
}

/// Compare a required header list with actual headers.
///
/// Matching ignores case and surrounding whitespace; reported names keep
/// the casing they were given in. Blank actual headers are ignored.
pub fn compare_headers<R, A>(required: &[R], actual: &[A]) -> Option<HeaderMismatch>
where
    R: AsRef<str>,
    A: AsRef<str>,
{
    let actual_set: HashSet<String> = actual.iter().map(|h| normalize(h.as_ref())).collect();
    let required_set: HashSet<String> = required.iter().map(|h| normalize(h.as_ref())).collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|h| !actual_set.contains(&normalize(h.as_ref())))
        .map(|h| h.as_ref().to_string())
        .collect();
    let extra: Vec<String> = actual
        .iter()
        .filter(|h| !h.as_ref().trim().is_empty())
        .filter(|h| !required_set.contains(&normalize(h.as_ref())))
        .map(|h| h.as_ref().to_string())
        .collect();

    if missing.is_empty() && extra.is_empty() {
        return None;
    }

    Some(HeaderMismatch {
        expected: required.iter().map(|h| h.as_ref().to_string()).collect(),
        missing,
        extra,
    })
}

/// Check a destination sheet's headers against the required set.
///
/// Both sheets must exist. The result is advisory; nothing here blocks a
/// transfer.
pub async fn validate_headers(
    provider: &dyn SheetProvider,
    source: &SheetRef,
    destination: &SheetRef,
    required: &[String],
) -> TransferResult<Option<HeaderMismatch>> {
    provider
        .read_headers(source)
        .await
        .map_err(|e| TransferError::read("read source headers", e))?;
    let actual = provider
        .read_headers(destination)
        .await
        .map_err(|e| TransferError::read("read destination headers", e))?;

    let mismatch = compare_headers(required, &actual);
    if let Some(report) = &mismatch {
        tracing::debug!(
            destination = %destination,
            missing = ?report.missing,
            extra = ?report.extra,
            "Destination headers differ from the required set"
        );
    }
    Ok(mismatch)
}
