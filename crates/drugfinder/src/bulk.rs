use crate::config::ApiConfig;
use crate::prelude::*;
use drugfinder_core::bulk::{
    parse_bulk_page, BulkAccumulator, BulkDataset, BulkPage, PartialLoad, DEFAULT_PER_PAGE,
};
use drugfinder_core::export::{partial_path, read_csv, write_csv};
use drugfinder_core::FetchError;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Anything that can produce the bulk reference dataset
pub trait DatasetSource {
    fn load(&self) -> impl Future<Output = Result<BulkDataset, FetchError>> + Send;
}

/// HTTP client for the paged bulk JSON endpoint
#[derive(Debug, Clone)]
pub struct BulkClient {
    client: reqwest::Client,
    url: String,
    service_key: String,
    per_page: u32,
    output: Option<PathBuf>,
}

impl BulkClient {
    pub fn new(config: &ApiConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            url: config.bulk_url.clone(),
            service_key: config.bulk_service_key.clone(),
            per_page: DEFAULT_PER_PAGE,
            output: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Persist every load to `path`, or to its `_partial` sibling on failure
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    async fn fetch_page(&self, page: u32) -> Result<BulkPage, FetchError> {
        let page = page.to_string();
        let per_page = self.per_page.to_string();

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("page", page.as_str()),
                ("perPage", per_page.as_str()),
                ("returnType", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            log::warn!("Bulk dataset page {} failed with HTTP {}", page, status);
            return Err(FetchError::http_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(format!("failed to read response body: {e}")))?;

        parse_bulk_page(&body)
    }

    /// Fetch every page of the dataset.
    ///
    /// A failure at any page fails the whole load; the rows collected so far
    /// are persisted to the partial path when an output is configured.
    pub async fn load_dataset(&self) -> Result<BulkDataset, FetchError> {
        log::info!("Loading bulk dataset from {}", self.url);

        let mut acc = BulkAccumulator::new();
        let stop = loop {
            let page = acc.next_page();
            let outcome = self.fetch_page(page).await;
            if let Some(stop) = acc.accept(outcome) {
                break stop;
            }
            log::info!(
                "Bulk dataset: {}/{} rows after page {}",
                acc.collected(),
                acc.total(),
                page
            );
        };

        match acc.finish(stop) {
            Ok(dataset) => {
                log::info!(
                    "Bulk dataset loaded: {} rows, {} columns",
                    dataset.len(),
                    dataset.columns().len()
                );
                if let Some(path) = &self.output {
                    self.persist_or_warn(&dataset, path);
                }
                Ok(dataset)
            }
            Err(PartialLoad { dataset, error }) => {
                log::warn!(
                    "Bulk dataset load failed after {} rows: {}",
                    dataset.len(),
                    error
                );
                if let Some(path) = self.output.as_ref().filter(|_| !dataset.is_empty()) {
                    self.persist_or_warn(&dataset, &partial_path(path));
                }
                Err(error)
            }
        }
    }

    fn persist_or_warn(&self, dataset: &BulkDataset, path: &Path) {
        match persist_dataset(dataset, path) {
            Ok(()) => log::info!("Saved {} rows to {}", dataset.len(), path.display()),
            Err(e) => log::warn!("Could not save dataset to {}: {:#}", path.display(), e),
        }
    }
}

impl DatasetSource for BulkClient {
    async fn load(&self) -> Result<BulkDataset, FetchError> {
        self.load_dataset().await
    }
}

/// Write `dataset` as CSV, creating parent directories as needed
pub fn persist_dataset(dataset: &BulkDataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(dataset, std::io::BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Read a dataset saved by [`persist_dataset`]
pub fn read_dataset(path: &Path) -> Result<BulkDataset> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to read dataset from {}", path.display()))
}
