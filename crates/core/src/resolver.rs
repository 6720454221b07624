//! Identical-ingredient resolution: bulk filtering, lookup planning, merging
//!
//! Resolution runs in two halves. [`plan_identical`] works out, from the
//! bulk dataset alone, which item names need a live lookup. The shell runs
//! those lookups in order and feeds each result set to a [`ResultMerger`],
//! which deduplicates by product code.

use crate::bulk::BulkDataset;
use crate::criteria::SearchCriteria;
use crate::record::DrugRecord;
use crate::schema::{ColumnMap, ColumnRole};
use std::collections::HashSet;
use std::fmt;

/// Most distinct item names looked up per resolution
pub const MAX_ITEM_LOOKUPS: usize = 50;

/// Why a resolution produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The dataset has no recognizable column for this role
    MissingColumn(ColumnRole),
    /// No bulk row carries the ingredient code
    NoMatchingRows,
    /// Matching rows were all removed by the secondary criteria
    FilteredOut,
    /// Matching rows carry no usable item names
    NoItemNames,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmptyReason::MissingColumn(role) => {
                write!(f, "dataset has no {} column", role.label())
            }
            EmptyReason::NoMatchingRows => f.write_str("no rows carry the ingredient code"),
            EmptyReason::FilteredOut => f.write_str("no rows match the other criteria"),
            EmptyReason::NoItemNames => f.write_str("matching rows have no item names"),
        }
    }
}

/// What to do for one identical-ingredient request
#[derive(Debug, Clone, PartialEq)]
pub enum IdenticalPlan {
    Empty(EmptyReason),
    /// No item-name column: the filtered bulk rows are the answer
    BulkRows(Vec<DrugRecord>),
    /// Look up each name live, in order
    Lookup(Vec<String>),
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rows whose ingredient-code column equals `code`.
///
/// Fails with the missing role when the column cannot be located.
pub fn find_identical(dataset: &BulkDataset, code: &str) -> Result<Vec<DrugRecord>, EmptyReason> {
    let columns = ColumnMap::detect(dataset.columns());
    find_identical_with(dataset, &columns, code)
}

fn find_identical_with(
    dataset: &BulkDataset,
    columns: &ColumnMap,
    code: &str,
) -> Result<Vec<DrugRecord>, EmptyReason> {
    let column = columns
        .get(ColumnRole::IngredientCode)
        .ok_or(EmptyReason::MissingColumn(ColumnRole::IngredientCode))?;

    Ok(dataset
        .rows()
        .iter()
        .filter(|row| row.get(column) == Some(code))
        .cloned()
        .collect())
}

/// Apply the secondary criteria to bulk rows: product code exact,
/// manufacturer and item name case-insensitive substring. A filter whose
/// column is unknown is skipped.
pub fn narrow_rows(
    rows: Vec<DrugRecord>,
    criteria: &SearchCriteria,
    columns: &ColumnMap,
) -> Vec<DrugRecord> {
    let product = criteria
        .product_code
        .as_deref()
        .zip(columns.get(ColumnRole::ProductCode));
    let manufacturer = criteria
        .manufacturer
        .as_deref()
        .zip(columns.get(ColumnRole::Manufacturer));
    let item_name = criteria
        .item_name
        .as_deref()
        .zip(columns.get(ColumnRole::ItemName));

    rows.into_iter()
        .filter(|row| {
            product.map_or(true, |(code, col)| row.get(col) == Some(code))
                && manufacturer.map_or(true, |(needle, col)| {
                    row.get(col).is_some_and(|v| contains_ignore_case(v, needle))
                })
                && item_name.map_or(true, |(needle, col)| {
                    row.get(col).is_some_and(|v| contains_ignore_case(v, needle))
                })
        })
        .collect()
}

/// Distinct non-empty values of `column`, in row order, at most `limit`.
pub fn distinct_values(rows: &[DrugRecord], column: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Decide how to answer an identical-ingredient search from the bulk data.
///
/// `criteria.ingredient_code` must be set; without it the plan is empty.
pub fn plan_identical(dataset: &BulkDataset, criteria: &SearchCriteria) -> IdenticalPlan {
    let Some(code) = criteria.ingredient_code.as_deref() else {
        return IdenticalPlan::Empty(EmptyReason::NoMatchingRows);
    };
    let columns = ColumnMap::detect(dataset.columns());

    let mut rows = match find_identical_with(dataset, &columns, code) {
        Ok(rows) => rows,
        Err(reason) => return IdenticalPlan::Empty(reason),
    };
    if rows.is_empty() {
        return IdenticalPlan::Empty(EmptyReason::NoMatchingRows);
    }

    if criteria.has_secondary() {
        rows = narrow_rows(rows, criteria, &columns);
        if rows.is_empty() {
            return IdenticalPlan::Empty(EmptyReason::FilteredOut);
        }
    }

    let Some(item_column) = columns.get(ColumnRole::ItemName) else {
        return IdenticalPlan::BulkRows(rows);
    };

    let names = distinct_values(&rows, item_column, MAX_ITEM_LOOKUPS);
    if names.is_empty() {
        return IdenticalPlan::Empty(EmptyReason::NoItemNames);
    }
    IdenticalPlan::Lookup(names)
}

/// Merges live lookup results, keeping the first record per product code.
///
/// Records without a product code are dropped, as are records that fail the
/// caller's manufacturer (substring) or product code (exact) criteria.
#[derive(Debug, Default)]
pub struct ResultMerger {
    product_code: Option<String>,
    manufacturer: Option<String>,
    seen: HashSet<String>,
    records: Vec<DrugRecord>,
}

impl ResultMerger {
    pub fn new(criteria: &SearchCriteria) -> Self {
        Self {
            product_code: criteria.product_code.clone(),
            manufacturer: criteria.manufacturer.clone(),
            ..Default::default()
        }
    }

    fn admits(&self, record: &DrugRecord) -> bool {
        if let Some(needle) = &self.manufacturer {
            let value = record.manufacturer().unwrap_or_default();
            if !contains_ignore_case(value, needle) {
                return false;
            }
        }
        if let Some(code) = &self.product_code {
            if record.product_code() != Some(code.as_str()) {
                return false;
            }
        }
        true
    }

    /// Fold in one lookup's records; returns how many were kept.
    pub fn absorb(&mut self, records: Vec<DrugRecord>) -> usize {
        let before = self.records.len();
        for record in records {
            let Some(code) = record.product_code() else {
                continue;
            };
            if self.seen.contains(code) || !self.admits(&record) {
                continue;
            }
            self.seen.insert(code.to_string());
            self.records.push(record);
        }
        self.records.len() - before
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<DrugRecord> {
        self.records
    }
}
