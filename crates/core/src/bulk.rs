//! Bulk reference dataset: JSON pages, paging state and the in-memory table

use crate::error::FetchError;
use crate::record::DrugRecord;
use serde::Deserialize;

/// Rows requested per bulk page unless configured otherwise
pub const DEFAULT_PER_PAGE: u32 = 1000;

/// One page of the bulk JSON endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkPage {
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub data: Vec<DrugRecord>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(rename = "perPage", default)]
    pub per_page: Option<u64>,
    #[serde(rename = "currentCount", default)]
    pub current_count: Option<u64>,
    #[serde(rename = "matchCount", default)]
    pub match_count: Option<u64>,
}

/// Decode one bulk page from its JSON body
pub fn parse_bulk_page(body: &str) -> Result<BulkPage, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Schema(format!("invalid JSON page: {e}")))
}

/// The whole reference table, rows in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkDataset {
    columns: Vec<String>,
    rows: Vec<DrugRecord>,
}

impl BulkDataset {
    /// Build a dataset; columns are the union of the rows' fields in
    /// first-seen order.
    pub fn from_rows(rows: Vec<DrugRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DrugRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How a bulk load ended
#[derive(Debug, Clone, PartialEq)]
pub enum BulkStop {
    Complete,
    Failed(FetchError),
}

/// Rows collected before a bulk load failed
#[derive(Debug, Clone, PartialEq)]
pub struct PartialLoad {
    pub dataset: BulkDataset,
    pub error: FetchError,
}

/// Paging state machine for the bulk endpoint
#[derive(Debug)]
pub struct BulkAccumulator {
    page: u32,
    total: u64,
    rows: Vec<DrugRecord>,
}

impl Default for BulkAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkAccumulator {
    pub fn new() -> Self {
        Self {
            page: 1,
            total: 0,
            rows: Vec::new(),
        }
    }

    pub fn next_page(&self) -> u32 {
        self.page
    }

    pub fn collected(&self) -> usize {
        self.rows.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Take in the outcome for [`Self::next_page`]; `None` means fetch the
    /// next page.
    pub fn accept(&mut self, outcome: Result<BulkPage, FetchError>) -> Option<BulkStop> {
        let page = match outcome {
            Ok(page) => page,
            Err(e) => return Some(BulkStop::Failed(e)),
        };

        if self.page == 1 {
            self.total = page.total_count.unwrap_or(0);
        }

        if page.data.is_empty() {
            return Some(BulkStop::Complete);
        }

        self.rows.extend(page.data);

        if self.rows.len() as u64 >= self.total {
            return Some(BulkStop::Complete);
        }

        self.page += 1;
        None
    }

    /// A completed load with rows is the dataset; anything else hands back
    /// the partial rows with the reason.
    pub fn finish(self, stop: BulkStop) -> Result<BulkDataset, PartialLoad> {
        let dataset = BulkDataset::from_rows(self.rows);
        match stop {
            BulkStop::Complete if !dataset.is_empty() => Ok(dataset),
            BulkStop::Complete => Err(PartialLoad {
                dataset,
                error: FetchError::NotFound,
            }),
            BulkStop::Failed(error) => Err(PartialLoad { dataset, error }),
        }
    }
}
