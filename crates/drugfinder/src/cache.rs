use crate::bulk::DatasetSource;
use drugfinder_core::bulk::BulkDataset;
use drugfinder_core::FetchError;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Process-lifetime holder for the bulk dataset.
///
/// Filled by the first successful load. Concurrent first callers wait on the
/// same load; a failed load leaves the cell empty so a later call retries.
#[derive(Debug, Default)]
pub struct DatasetCache {
    cell: OnceCell<Arc<BulkDataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that starts out populated, e.g. from a saved CSV
    pub fn seeded(dataset: BulkDataset) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(dataset))),
        }
    }

    pub fn get(&self) -> Option<Arc<BulkDataset>> {
        self.cell.get().cloned()
    }

    /// The cached dataset, loading it from `source` if not yet populated
    pub async fn get_or_load<S: DatasetSource>(
        &self,
        source: &S,
    ) -> Result<Arc<BulkDataset>, FetchError> {
        self.cell
            .get_or_try_init(|| async {
                let dataset = source.load().await?;
                log::info!("Cached bulk dataset with {} rows", dataset.len());
                Ok::<_, FetchError>(Arc::new(dataset))
            })
            .await
            .cloned()
    }
}
