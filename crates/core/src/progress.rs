//! Transfer progress records and the store that owns them.

use crate::error::{TransferError, TransferResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Lifecycle of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TransferStatus {
    /// Completed and failed transfers never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_become(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Processing | Self::Failed) => true,
            (Self::Processing, Self::Processing | Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Row counters of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStats {
    pub total_rows: usize,
    pub processed_rows: usize,
    pub duplicates: usize,
    pub errors: usize,
}

/// Progress of one transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub status: TransferStatus,
    /// Percentage, 0 to 100.
    pub progress: u8,
    pub message: Option<String>,
    pub stats: TransferStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransferRecord {
    fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            status: TransferStatus::Pending,
            progress: 0,
            message: None,
            stats: TransferStats::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn ensure_mutable(&self) -> TransferResult<()> {
        if self.status.is_terminal() {
            return Err(TransferError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: self.status,
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Storage for transfer records.
///
/// The executor is the only writer of a given record; any number of readers
/// may poll concurrently. Implementations must reject changes to terminal
/// records.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Create a pending record.
    async fn create(&self, id: &str) -> TransferResult<TransferRecord>;

    /// Set the number of rows the transfer will look at.
    async fn set_total_rows(&self, id: &str, total_rows: usize) -> TransferResult<()>;

    /// Record progress after a step. `processed_rows` may not exceed the total.
    async fn update(
        &self,
        id: &str,
        progress: u8,
        processed_rows: usize,
        duplicate_rows: usize,
    ) -> TransferResult<()>;

    /// Count one non-fatal error.
    async fn record_error(&self, id: &str) -> TransferResult<()>;

    /// Move the record to a new status, optionally with a message.
    async fn set_status(
        &self,
        id: &str,
        status: TransferStatus,
        message: Option<String>,
    ) -> TransferResult<()>;

    /// Read a record. Unknown ids are `NotFound`.
    async fn get(&self, id: &str) -> TransferResult<TransferRecord>;
}

/// Volatile store keyed by transfer id.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<String, TransferRecord>>,
}

impl MemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_record<F>(&self, id: &str, f: F) -> TransferResult<()>
    where
        F: FnOnce(&mut TransferRecord) -> TransferResult<()> + Send,
    {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TransferError::NotFound(format!("transfer {id}")))?;
        f(record)?;
        record.touch();
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn create(&self, id: &str) -> TransferResult<TransferRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(TransferError::AlreadyExists(id.to_string()));
        }
        let record = TransferRecord::new(id);
        records.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn set_total_rows(&self, id: &str, total_rows: usize) -> TransferResult<()> {
        self.with_record(id, |record| {
            record.ensure_mutable()?;
            if record.stats.processed_rows > total_rows {
                return Err(TransferError::validation(format!(
                    "total rows {total_rows} below processed rows {}",
                    record.stats.processed_rows
                )));
            }
            record.stats.total_rows = total_rows;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        id: &str,
        progress: u8,
        processed_rows: usize,
        duplicate_rows: usize,
    ) -> TransferResult<()> {
        self.with_record(id, |record| {
            record.ensure_mutable()?;
            if processed_rows > record.stats.total_rows {
                return Err(TransferError::validation(format!(
                    "processed rows {processed_rows} exceed total rows {}",
                    record.stats.total_rows
                )));
            }
            record.progress = progress.min(100);
            record.stats.processed_rows = processed_rows;
            record.stats.duplicates = duplicate_rows;
            Ok(())
        })
        .await
    }

    async fn record_error(&self, id: &str) -> TransferResult<()> {
        self.with_record(id, |record| {
            record.ensure_mutable()?;
            record.stats.errors += 1;
            Ok(())
        })
        .await
    }

    async fn set_status(
        &self,
        id: &str,
        status: TransferStatus,
        message: Option<String>,
    ) -> TransferResult<()> {
        self.with_record(id, |record| {
            if !record.status.can_become(status) {
                return Err(TransferError::InvalidTransition {
                    id: record.id.clone(),
                    from: record.status,
                    to: status,
                });
            }
            record.status = status;
            if message.is_some() {
                record.message = message;
            }
            match status {
                TransferStatus::Completed => {
                    record.progress = 100;
                    record.completed_at = Some(Utc::now());
                }
                TransferStatus::Failed => {
                    record.stats.errors = record.stats.errors.max(1);
                    record.completed_at = Some(Utc::now());
                }
                TransferStatus::Pending | TransferStatus::Processing => {}
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> TransferResult<TransferRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TransferError::NotFound(format!("transfer {id}")))
    }
}

/// Percentage of `done` out of `total`, rounded down. An empty transfer is done.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.min(total) * 100 / total) as u8
}
