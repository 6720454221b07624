use crate::bulk::{read_dataset, BulkClient};
use crate::config::ApiConfig;
use crate::output::{print_json, print_records};
use crate::prelude::*;
use drugfinder_core::bulk::{BulkDataset, DEFAULT_PER_PAGE};
use drugfinder_core::resolver::find_identical;
use drugfinder_core::DrugRecord;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
#[command(after_help = "EXAMPLES:
    # Fetch the bulk dataset and list products with the ingredient
    drugfinder identical 281700ATB

    # Work offline from a saved dataset
    drugfinder identical 281700ATB --dataset drug_data_api.csv --json")]
pub struct IdenticalOptions {
    /// Ingredient code (gnlNmCd)
    gnl_nm_cd: String,

    /// Read the dataset from a saved CSV instead of fetching it
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where a fetched dataset is saved
    #[arg(short, long, default_value = "drug_data_api.csv")]
    output: PathBuf,

    /// Rows per bulk dataset page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Rows to show in the table
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct IdenticalOutput {
    #[serde(rename = "gnlNmCd")]
    ingredient_code: String,
    count: usize,
    results: Vec<DrugRecord>,
}

async fn dataset(options: &IdenticalOptions, global: &crate::Global) -> Result<BulkDataset> {
    if let Some(path) = &options.dataset {
        return read_dataset(path);
    }

    let config = ApiConfig::resolve(global)?;
    let bulk = BulkClient::new(&config, config.build_client()?)
        .with_per_page(options.per_page)
        .with_output(&options.output);
    bulk.load_dataset()
        .await
        .map_err(|e| eyre!("Failed to load the bulk dataset: {}", e))
}

pub async fn run(options: IdenticalOptions, global: crate::Global) -> Result<()> {
    let dataset = dataset(&options, &global).await?;

    let results = find_identical(&dataset, &options.gnl_nm_cd).unwrap_or_else(|reason| {
        log::warn!("Identical-ingredient lookup skipped: {}", reason);
        Vec::new()
    });

    if options.json {
        return print_json(&IdenticalOutput {
            ingredient_code: options.gnl_nm_cd,
            count: results.len(),
            results,
        });
    }

    print_records(
        &format!("Products with ingredient code {}", options.gnl_nm_cd),
        &results,
        &[],
        options.limit,
    );
    Ok(())
}
