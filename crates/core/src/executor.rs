//! Chunked row transfer between two sheets.

use crate::config::TransferConfig;
use crate::duplicates::{find_duplicates, RowSet};
use crate::error::{TransferError, TransferResult};
use crate::filter::filter_sheet;
use crate::progress::{percent, ProgressStore, TransferStatus};
use crate::request::{TransferMode, TransferRequest};
use serde::Serialize;
use sheetshift_sheet::{fit_row, SheetProvider, SheetRef};
use std::sync::Arc;

/// What a finished transfer did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub mode: TransferMode,
    /// Rows matching the date range and status.
    pub filtered_rows: usize,
    pub transferred_rows: usize,
    pub duplicates_found: usize,
    pub chunks_written: usize,
    /// Source rows removed (move mode only).
    pub deleted_rows: usize,
    /// Set when move-mode deletion failed after a successful copy.
    pub delete_warning: Option<String>,
    pub message: String,
}

impl TransferSummary {
    fn empty(mode: TransferMode, filtered_rows: usize, message: impl Into<String>) -> Self {
        Self {
            mode,
            filtered_rows,
            transferred_rows: 0,
            duplicates_found: 0,
            chunks_written: 0,
            deleted_rows: 0,
            delete_warning: None,
            message: message.into(),
        }
    }
}

/// Caller-facing outcome: success flag plus counts and a readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport {
    pub success: bool,
    pub transferred_rows: usize,
    pub duplicates_found: usize,
    pub message: String,
}

impl TransferReport {
    pub fn from_result(result: &TransferResult<TransferSummary>) -> Self {
        match result {
            Ok(summary) => Self {
                success: true,
                transferred_rows: summary.transferred_rows,
                duplicates_found: summary.duplicates_found,
                message: summary.message.clone(),
            },
            Err(err) => Self {
                success: false,
                transferred_rows: 0,
                duplicates_found: 0,
                message: err.to_string(),
            },
        }
    }
}

pub(crate) const NO_MATCHING_ROWS: &str = "No rows matched the selected date range and status";

fn rows_word(count: usize) -> &'static str {
    if count == 1 {
        "row"
    } else {
        "rows"
    }
}

fn completion_message(summary: &TransferSummary) -> String {
    let moved = summary.mode == TransferMode::Move && summary.delete_warning.is_none();
    let mut message = format!(
        "Successfully {} {} {}",
        if moved { "moved" } else { "copied" },
        summary.transferred_rows,
        rows_word(summary.transferred_rows)
    );
    if summary.duplicates_found > 0 {
        message.push_str(&format!(
            " ({} duplicates skipped)",
            summary.duplicates_found
        ));
    }
    if let Some(warning) = &summary.delete_warning {
        message.push_str(&format!("; source rows were kept: {warning}"));
    }
    message
}

/// Runs transfers: filter, deduplicate, append in chunks, then (move mode)
/// delete the copied source rows.
///
/// A failed append aborts the transfer before anything is deleted. A failed
/// delete only produces a warning, since the rows are already safe in the
/// destination.
pub struct TransferExecutor {
    provider: Arc<dyn SheetProvider>,
    progress: Arc<dyn ProgressStore>,
    config: TransferConfig,
}

impl TransferExecutor {
    pub fn new(
        provider: Arc<dyn SheetProvider>,
        progress: Arc<dyn ProgressStore>,
        config: TransferConfig,
    ) -> Self {
        Self {
            provider,
            progress,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Run one transfer whose progress record already exists, leaving the
    /// record completed or failed.
    pub async fn execute(
        &self,
        transfer_id: &str,
        request: &TransferRequest,
    ) -> TransferResult<TransferSummary> {
        tracing::info!(
            transfer_id,
            source = %request.source(),
            destination = %request.destination(),
            mode = %request.mode,
            from = %request.from_date,
            to = %request.to_date,
            "Starting transfer"
        );

        let result = self.run(transfer_id, request).await;
        let finish = match &result {
            Ok(summary) => {
                tracing::info!(
                    transfer_id,
                    transferred = summary.transferred_rows,
                    duplicates = summary.duplicates_found,
                    deleted = summary.deleted_rows,
                    "{}",
                    summary.message
                );
                self.progress
                    .set_status(
                        transfer_id,
                        TransferStatus::Completed,
                        Some(summary.message.clone()),
                    )
                    .await
            }
            Err(err) => {
                tracing::error!(transfer_id, error = %err, "Transfer failed");
                self.progress
                    .set_status(transfer_id, TransferStatus::Failed, Some(err.to_string()))
                    .await
            }
        };
        if let Err(err) = finish {
            tracing::warn!(transfer_id, error = %err, "Could not record transfer outcome");
        }
        result
    }

    async fn run(
        &self,
        transfer_id: &str,
        request: &TransferRequest,
    ) -> TransferResult<TransferSummary> {
        request.validate()?;
        self.progress
            .set_status(transfer_id, TransferStatus::Processing, None)
            .await?;

        let source_ref = request.source();
        let destination_ref = request.destination();

        let source = self
            .provider
            .read_sheet(&source_ref)
            .await
            .map_err(|e| TransferError::read("read source sheet", e))?;
        let filtered = filter_sheet(&source, &request.criteria(), &self.config.columns)?;
        let total = filtered.row_count;
        self.progress.set_total_rows(transfer_id, total).await?;
        if filtered.is_empty() {
            return Ok(TransferSummary::empty(request.mode, 0, NO_MATCHING_ROWS));
        }

        let destination = self
            .provider
            .read_sheet(&destination_ref)
            .await
            .map_err(|e| TransferError::read("read destination sheet", e))?;
        if destination.col_count() == 0 {
            return Err(TransferError::validation(format!(
                "Destination sheet {destination_ref} has no header row"
            )));
        }

        let partition = find_duplicates(
            RowSet::new(&filtered.headers, &filtered.rows),
            RowSet::new(destination.headers(), destination.rows()),
            self.config.identity_key,
            &self.config.columns,
        );
        let duplicates = partition.duplicates.len();
        self.progress
            .update(transfer_id, percent(duplicates, total), duplicates, duplicates)
            .await?;

        if partition.unique.is_empty() {
            let mut summary = TransferSummary::empty(
                request.mode,
                total,
                format!(
                    "All {total} matching {} already exist in the destination",
                    rows_word(total)
                ),
            );
            summary.duplicates_found = duplicates;
            return Ok(summary);
        }

        let width = destination.col_count();
        let accepted: Vec<Vec<String>> = partition
            .unique
            .iter()
            .map(|&i| fit_row(filtered.rows[i].clone(), width))
            .collect();
        let accepted_source_rows: Vec<usize> = partition
            .unique
            .iter()
            .map(|&i| filtered.source_row_numbers[i])
            .collect();

        let (transferred, chunks_written) = self
            .write_chunks(
                transfer_id,
                &destination_ref,
                destination.next_empty_row(),
                &accepted,
                duplicates,
                total,
            )
            .await?;

        let mut summary = TransferSummary {
            mode: request.mode,
            filtered_rows: total,
            transferred_rows: transferred,
            duplicates_found: duplicates,
            chunks_written,
            deleted_rows: 0,
            delete_warning: None,
            message: String::new(),
        };

        if request.mode == TransferMode::Move && transferred > 0 {
            let mut rows = accepted_source_rows;
            rows.truncate(transferred);
            match self.delete_source_rows(&source_ref, rows).await {
                Ok(deleted) => summary.deleted_rows = deleted,
                Err(err) => {
                    tracing::warn!(
                        transfer_id,
                        source = %source_ref,
                        error = %err,
                        "Rows were copied but could not be deleted from the source"
                    );
                    self.progress.record_error(transfer_id).await?;
                    summary.delete_warning = Some(err.to_string());
                }
            }
        }

        summary.message = completion_message(&summary);
        Ok(summary)
    }

    /// Append rows in order, `chunk_size` at a time. Returns rows and chunks written.
    async fn write_chunks(
        &self,
        transfer_id: &str,
        destination: &SheetRef,
        first_empty_row: usize,
        rows: &[Vec<String>],
        duplicates: usize,
        total: usize,
    ) -> TransferResult<(usize, usize)> {
        let chunk_size = self.config.chunk_size.max(1);
        let total_chunks = rows.len().div_ceil(chunk_size);
        let mut cursor = first_empty_row;
        let mut written = 0;

        for (index, chunk) in rows.chunks(chunk_size).enumerate() {
            let chunk_number = index + 1;
            let range = self
                .provider
                .append_rows(destination, chunk.to_vec())
                .await
                .map_err(|source| TransferError::WriteFailure {
                    chunk: chunk_number,
                    total_chunks,
                    source,
                })?;

            if range.first_row != cursor {
                tracing::warn!(
                    transfer_id,
                    expected_row = cursor,
                    actual_row = range.first_row,
                    "Destination changed while transferring"
                );
                cursor = range.first_row;
            }
            cursor += chunk.len();
            written += chunk.len();

            tracing::debug!(
                transfer_id,
                chunk = chunk_number,
                total_chunks,
                rows = chunk.len(),
                next_row = cursor,
                "Chunk written"
            );

            let processed = duplicates + written;
            self.progress
                .update(transfer_id, percent(processed, total), processed, duplicates)
                .await?;
        }

        Ok((written, total_chunks))
    }

    /// Delete source rows highest first so earlier deletions do not shift
    /// rows still waiting to be deleted.
    async fn delete_source_rows(
        &self,
        source: &SheetRef,
        mut row_numbers: Vec<usize>,
    ) -> TransferResult<usize> {
        row_numbers.sort_unstable_by(|a, b| b.cmp(a));
        row_numbers.dedup();
        self.provider
            .delete_rows(source, &row_numbers)
            .await
            .map_err(|source| TransferError::DeleteFailure {
                rows: row_numbers.len(),
                source,
            })?;
        Ok(row_numbers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(mode: TransferMode, transferred: usize, duplicates: usize) -> TransferSummary {
        TransferSummary {
            mode,
            filtered_rows: transferred + duplicates,
            transferred_rows: transferred,
            duplicates_found: duplicates,
            chunks_written: 1,
            deleted_rows: 0,
            delete_warning: None,
            message: String::new(),
        }
    }

    #[test]
    fn test_message_moved() {
        assert_eq!(
            completion_message(&summary(TransferMode::Move, 150, 0)),
            "Successfully moved 150 rows"
        );
    }

    #[test]
    fn test_message_copied_with_duplicates() {
        assert_eq!(
            completion_message(&summary(TransferMode::Copy, 1, 2)),
            "Successfully copied 1 row (2 duplicates skipped)"
        );
    }

    #[test]
    fn test_message_after_failed_delete_says_copied() {
        let mut s = summary(TransferMode::Move, 3, 0);
        s.delete_warning = Some("Failed to delete 3 source rows: boom".into());
        let message = completion_message(&s);
        assert!(message.starts_with("Successfully copied 3 rows"));
        assert!(message.contains("source rows were kept"));
    }

    #[test]
    fn test_report_from_error() {
        let result: TransferResult<TransferSummary> =
            Err(TransferError::validation("Missing required parameters: toDate"));
        let report = TransferReport::from_result(&result);
        assert!(!report.success);
        assert_eq!(report.transferred_rows, 0);
        assert!(report.message.contains("toDate"));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let mut s = summary(TransferMode::Copy, 2, 0);
        s.message = completion_message(&s);
        let json = serde_json::to_value(TransferReport::from_result(&Ok(s))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["transferredRows"], 2);
        assert_eq!(json["duplicatesFound"], 0);
    }
}
