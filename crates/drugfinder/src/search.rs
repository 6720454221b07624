use crate::bulk::BulkClient;
use crate::config::ApiConfig;
use crate::detail::DetailClient;
use crate::output::{print_json, print_records};
use crate::prelude::{println, *};
use colored::Colorize;
use drugfinder_core::bulk::DEFAULT_PER_PAGE;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::record::{INGREDIENT_CODE, ITEM_NAME, MANUFACTURER, PRODUCT_CODE};
use drugfinder_core::resolver::find_identical;
use drugfinder_core::DrugRecord;
use serde::Serialize;
use std::path::PathBuf;

const SEARCH_COLUMNS: &[&str] = &[ITEM_NAME, PRODUCT_CODE, INGREDIENT_CODE, MANUFACTURER];

#[derive(Debug, clap::Args)]
#[command(after_help = "EXAMPLES:
    # Search by item name, then list every product with the same ingredient
    drugfinder search --itm-nm 졸피드정

    # Only the detail search
    drugfinder search --mnf-entp-nm 한미약품 --no-search-identical

    # Identical-ingredient rows for a known code, as JSON
    drugfinder search --gnl-nm-cd 281700ATB --json")]
pub struct SearchOptions {
    /// Ingredient code (gnlNmCd)
    #[arg(long)]
    gnl_nm_cd: Option<String>,

    /// Item name (itmNm)
    #[arg(long)]
    itm_nm: Option<String>,

    /// Product code (mdsCd)
    #[arg(long)]
    mds_cd: Option<String>,

    /// Manufacturer name (mnfEntpNm)
    #[arg(long)]
    mnf_entp_nm: Option<String>,

    /// Rows to request from the detail search
    #[arg(short, long, default_value = "10")]
    num_rows: u32,

    /// Stop after the detail search
    #[arg(long)]
    no_search_identical: bool,

    /// Where the fetched bulk dataset is saved
    #[arg(short, long, default_value = "drug_data_api.csv")]
    output: PathBuf,

    /// Rows per bulk dataset page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl SearchOptions {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            ingredient_code: self.gnl_nm_cd.clone(),
            item_name: self.itm_nm.clone(),
            product_code: self.mds_cd.clone(),
            manufacturer: self.mnf_entp_nm.clone(),
            num_rows: Some(self.num_rows),
        }
        .normalized()
    }
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    results: Vec<DrugRecord>,
    #[serde(rename = "gnlNmCd")]
    ingredient_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identical: Option<Vec<DrugRecord>>,
}

/// The ingredient code of the first record, if it has one
fn first_ingredient_code(records: &[DrugRecord]) -> Option<String> {
    records
        .first()
        .and_then(DrugRecord::ingredient_code)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let criteria = options.criteria();
    if !criteria.has_any() {
        return Err(Error::NoCriteria.into());
    }

    let config = ApiConfig::resolve(&global)?;
    let client = config.build_client()?;

    let mut output = SearchOutput {
        results: Vec::new(),
        ingredient_code: criteria.ingredient_code.clone(),
        identical: None,
    };

    if output.ingredient_code.is_none() {
        let detail = DetailClient::new(&config, client.clone());
        let result = detail.search_pages(&criteria, 1).await;
        if let Some(e) = result.error() {
            log::info!("Detail search ended early: {}", e);
        }

        if !options.json {
            println!("{} {}", "Search:".bold(), criteria.describe());
            print_records("Detail search results", &result.records, SEARCH_COLUMNS, 5);
        }
        output.ingredient_code = first_ingredient_code(&result.records);
        output.results = result.records;
    }

    if !options.no_search_identical {
        match output.ingredient_code.clone() {
            Some(code) => {
                let bulk = BulkClient::new(&config, client)
                    .with_per_page(options.per_page)
                    .with_output(&options.output);
                let dataset = bulk
                    .load_dataset()
                    .await
                    .map_err(|e| eyre!("Failed to load the bulk dataset: {}", e))?;

                let rows = find_identical(&dataset, &code).unwrap_or_else(|reason| {
                    log::warn!("Identical-ingredient lookup skipped: {}", reason);
                    Vec::new()
                });

                if !options.json {
                    print_records(
                        &format!("Products with ingredient code {}", code),
                        &rows,
                        &[],
                        10,
                    );
                }
                output.identical = Some(rows);
            }
            None if !options.json => {
                println!("{}", "No ingredient code to search identical products with".yellow());
            }
            None => {}
        }
    }

    if options.json {
        print_json(&output)?;
    }

    Ok(())
}
