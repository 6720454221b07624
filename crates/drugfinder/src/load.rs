use crate::bulk::BulkClient;
use crate::config::ApiConfig;
use crate::output::print_records;
use crate::prelude::{println, *};
use colored::Colorize;
use drugfinder_core::bulk::DEFAULT_PER_PAGE;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct LoadOptions {
    /// Where the dataset is saved
    #[arg(short, long, default_value = "drug_data_api.csv")]
    output: PathBuf,

    /// Rows per bulk dataset page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,
}

pub async fn run(options: LoadOptions, global: crate::Global) -> Result<()> {
    let config = ApiConfig::resolve(&global)?;
    let bulk = BulkClient::new(&config, config.build_client()?)
        .with_per_page(options.per_page)
        .with_output(&options.output);

    let dataset = bulk
        .load_dataset()
        .await
        .map_err(|e| eyre!("Failed to load the bulk dataset: {}", e))?;

    println!(
        "{} {} rows, {} columns",
        "Loaded".green().bold(),
        dataset.len(),
        dataset.columns().len()
    );
    println!("{} {}", "Saved to".bold(), options.output.display());
    println!("{} {}", "Columns:".bold(), dataset.columns().join(", "));
    print_records("First rows", dataset.rows(), &[], 3);

    Ok(())
}
