//! Entry point shared by the HTTP server and the CLI.

use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::executor::{TransferExecutor, TransferSummary};
use crate::filter::{filter_sheet, FilterCriteria, FilteredData};
use crate::headers::{self, HeaderMismatch};
use crate::progress::{MemoryProgressStore, ProgressStore, TransferRecord};
use crate::request::TransferRequest;
use sheetshift_sheet::{SheetProvider, SheetRef};
use std::sync::Arc;
use uuid::Uuid;

/// Starts transfers, answers progress queries and previews filters.
///
/// Cloning is cheap; clones share the provider and the progress store.
#[derive(Clone)]
pub struct TransferService {
    provider: Arc<dyn SheetProvider>,
    progress: Arc<dyn ProgressStore>,
    executor: Arc<TransferExecutor>,
}

impl TransferService {
    /// Build a service. Fails if the configuration is invalid.
    pub fn new(
        provider: Arc<dyn SheetProvider>,
        progress: Arc<dyn ProgressStore>,
        config: TransferConfig,
    ) -> TransferResult<Self> {
        config.validate()?;
        let executor = Arc::new(TransferExecutor::new(
            Arc::clone(&provider),
            Arc::clone(&progress),
            config,
        ));
        Ok(Self {
            provider,
            progress,
            executor,
        })
    }

    /// Build a service that keeps progress records in memory.
    pub fn in_memory(
        provider: Arc<dyn SheetProvider>,
        config: TransferConfig,
    ) -> TransferResult<Self> {
        Self::new(provider, Arc::new(MemoryProgressStore::new()), config)
    }

    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        self.executor.config()
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn SheetProvider> {
        &self.provider
    }

    /// Validate the request, create a pending record and run the transfer in
    /// the background. Returns the transfer id immediately.
    pub async fn start(&self, request: TransferRequest) -> TransferResult<String> {
        request.validate()?;
        let transfer_id = new_transfer_id();
        self.progress.create(&transfer_id).await?;

        let executor = Arc::clone(&self.executor);
        let id = transfer_id.clone();
        tokio::spawn(async move {
            // The outcome lands in the progress store.
            let _ = executor.execute(&id, &request).await;
        });

        Ok(transfer_id)
    }

    /// Run a transfer to completion. Returns the transfer id alongside the
    /// outcome so callers can still look up the record after a failure.
    pub async fn run(&self, request: &TransferRequest) -> (String, TransferResult<TransferSummary>) {
        let transfer_id = new_transfer_id();
        if let Err(err) = self.progress.create(&transfer_id).await {
            return (transfer_id, Err(err));
        }
        let result = self.executor.execute(&transfer_id, request).await;
        (transfer_id, result)
    }

    /// Current state of a transfer.
    pub async fn progress(&self, transfer_id: &str) -> TransferResult<TransferRecord> {
        self.progress.get(transfer_id).await
    }

    /// Compare the destination's headers with the configured required set.
    pub async fn validate_headers(
        &self,
        source: &SheetRef,
        destination: &SheetRef,
    ) -> TransferResult<Option<HeaderMismatch>> {
        headers::validate_headers(
            self.provider.as_ref(),
            source,
            destination,
            &self.config().required_headers,
        )
        .await
    }

    /// Rows of a sheet matching the criteria, without transferring anything.
    pub async fn filtered_data(
        &self,
        sheet: &SheetRef,
        criteria: &FilterCriteria,
    ) -> TransferResult<FilteredData> {
        let data = self
            .provider
            .read_sheet(sheet)
            .await
            .map_err(|e| TransferError::read("read sheet", e))?;
        filter_sheet(&data, criteria, &self.config().columns)
    }
}

fn new_transfer_id() -> String {
    Uuid::new_v4().to_string()
}
