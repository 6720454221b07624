//! Request dispatch shared by the HTTP handlers and the CLI
//!
//! Validates criteria, decides between a plain detail search and an
//! identical-ingredient resolution, and turns dataset failures into
//! [`Error`] values. Remote fetch failures never surface here; they come
//! back as empty or partial record lists.

use crate::bulk::DatasetSource;
use crate::cache::DatasetCache;
use crate::detail::DetailSearch;
use crate::prelude::Error;
use crate::resolve::{resolve_identical, ResultSource};
use drugfinder_core::bulk::BulkDataset;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::resolver::find_identical;
use drugfinder_core::DrugRecord;
use std::sync::Arc;

/// Outcome of a search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReply {
    pub records: Vec<DrugRecord>,
    /// The records are raw bulk rows rather than detail records
    pub identical: bool,
}

async fn load_dataset<S: DatasetSource>(
    cache: &DatasetCache,
    source: &S,
) -> Result<Arc<BulkDataset>, Error> {
    let dataset = cache
        .get_or_load(source)
        .await
        .map_err(|e| Error::DatasetUnavailable(e.to_string()))?;
    if dataset.is_empty() {
        return Err(Error::DatasetUnavailable("dataset is empty".to_string()));
    }
    Ok(dataset)
}

/// Run a search.
///
/// With an ingredient code the request is answered by identical-ingredient
/// resolution over the cached dataset; otherwise by one paged detail search.
pub async fn search<D, S>(
    criteria: SearchCriteria,
    detail: &D,
    cache: &DatasetCache,
    source: &S,
) -> Result<SearchReply, Error>
where
    D: DetailSearch,
    S: DatasetSource,
{
    let criteria = criteria.normalized();
    if !criteria.has_any() {
        return Err(Error::NoCriteria);
    }

    if criteria.ingredient_code.is_some() {
        let dataset = load_dataset(cache, source).await?;
        let resolution = resolve_identical(&dataset, &criteria, detail).await;
        match resolution.empty_reason {
            Some(reason) => log::info!("Identical-ingredient search is empty: {}", reason),
            None => log::info!(
                "Resolved {} record(s) from {} lookup(s), {} failed",
                resolution.records.len(),
                resolution.lookups,
                resolution.failed_lookups
            ),
        }
        return Ok(SearchReply {
            records: resolution.records,
            identical: resolution.source == ResultSource::BulkRows,
        });
    }

    let result = detail.search(&criteria).await;
    Ok(SearchReply {
        records: result.records,
        identical: false,
    })
}

/// Bulk rows sharing `ingredient_code`.
pub async fn identical<S: DatasetSource>(
    ingredient_code: Option<String>,
    cache: &DatasetCache,
    source: &S,
) -> Result<Vec<DrugRecord>, Error> {
    let code = ingredient_code
        .filter(|code| !code.is_empty())
        .ok_or(Error::MissingIngredientCode)?;

    let dataset = load_dataset(cache, source).await?;
    match find_identical(&dataset, &code) {
        Ok(rows) => Ok(rows),
        Err(reason) => {
            log::info!("No identical rows for {}: {}", code, reason);
            Ok(Vec::new())
        }
    }
}
