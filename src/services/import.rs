//! Product bulk import

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::aggregates::{screen_rows, ImportSummary, ProductImportRow};
use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome { Inserted, DuplicateSku }

#[async_trait]
pub trait ProductImportRepository: Send + Sync {
    /// Deletes every product and variant. Returns the number of products removed.
    async fn clear_all(&self) -> Result<u64>;
    async fn insert(&self, row: &ProductImportRow) -> Result<InsertOutcome>;
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub products: Vec<ProductImportRow>,
    #[serde(default)]
    pub clear_existing: bool,
}

pub struct ImportService {
    repo: Arc<dyn ProductImportRepository>,
}

impl ImportService {
    pub fn new(repo: Arc<dyn ProductImportRepository>) -> Self { Self { repo } }

    /// Row-level failures are counted in the summary; only a failed clear or
    /// a lost connection fails the whole import.
    pub async fn import(&self, request: ImportRequest) -> Result<ImportSummary> {
        if request.clear_existing {
            let removed = self.repo.clear_all().await?;
            tracing::warn!(removed, "cleared existing products before import");
        }
        let mut summary = ImportSummary::default();
        for (row_number, row) in screen_rows(request.products, &mut summary) {
            match self.repo.insert(&row).await {
                Ok(InsertOutcome::Inserted) => summary.record_imported(),
                Ok(InsertOutcome::DuplicateSku) => {
                    let sku = row.normalized_sku().unwrap_or_default();
                    summary.record_skipped(format!("Row {row_number}: SKU {sku} already exists"));
                }
                Err(e) => summary.record_error(format!("Row {row_number}: {e}")),
            }
        }
        tracing::info!(imported = summary.imported, errors = summary.errors, skipped = summary.skipped, "product import finished");
        Ok(summary)
    }
}
