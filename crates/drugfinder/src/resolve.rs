use crate::detail::DetailSearch;
use drugfinder_core::bulk::BulkDataset;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::resolver::{plan_identical, EmptyReason, IdenticalPlan, ResultMerger};
use drugfinder_core::{DrugRecord, FetchError};

/// Where the records of a resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// Merged live detail lookups, one per item name
    LiveDetail,
    /// Raw bulk rows; the dataset has no item-name column to look up
    BulkRows,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub records: Vec<DrugRecord>,
    pub source: ResultSource,
    /// Live lookups issued
    pub lookups: usize,
    /// Lookups that aborted for a reason other than "no results"
    pub failed_lookups: usize,
    pub empty_reason: Option<EmptyReason>,
}

impl Resolution {
    fn empty(reason: EmptyReason) -> Self {
        Self {
            records: Vec::new(),
            source: ResultSource::LiveDetail,
            lookups: 0,
            failed_lookups: 0,
            empty_reason: Some(reason),
        }
    }
}

/// Resolve every product sharing `criteria.ingredient_code`.
///
/// The bulk dataset picks the item names; each name is looked up live, one
/// after another, and the results are merged without duplicate product codes.
pub async fn resolve_identical<D: DetailSearch>(
    dataset: &BulkDataset,
    criteria: &SearchCriteria,
    detail: &D,
) -> Resolution {
    let names = match plan_identical(dataset, criteria) {
        IdenticalPlan::Empty(reason) => {
            log::info!("No identical-ingredient candidates: {}", reason);
            return Resolution::empty(reason);
        }
        IdenticalPlan::BulkRows(records) => {
            log::info!(
                "No item-name column in the dataset; returning {} bulk rows",
                records.len()
            );
            return Resolution {
                records,
                source: ResultSource::BulkRows,
                lookups: 0,
                failed_lookups: 0,
                empty_reason: None,
            };
        }
        IdenticalPlan::Lookup(names) => names,
    };

    log::info!(
        "Looking up {} item name(s) for ingredient {}",
        names.len(),
        criteria.ingredient_code.as_deref().unwrap_or_default()
    );

    let mut merger = ResultMerger::new(criteria);
    let mut failed_lookups = 0;
    for name in &names {
        let result = detail.search(&criteria.for_item_name(name)).await;
        match result.error() {
            None | Some(FetchError::NotFound) => {}
            Some(e) => {
                failed_lookups += 1;
                log::warn!("Lookup for {} failed: {}", name, e);
            }
        }
        let kept = merger.absorb(result.records);
        log::debug!("{}: kept {} record(s)", name, kept);
    }

    Resolution {
        records: merger.into_records(),
        source: ResultSource::LiveDetail,
        lookups: names.len(),
        failed_lookups,
        empty_reason: None,
    }
}
