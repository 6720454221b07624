use crate::prelude::*;
use clap::Parser;

mod bulk;
mod cache;
mod config;
mod detail;
mod dispatch;
mod error;
mod identical;
mod load;
mod output;
mod prelude;
mod resolve;
mod search;
mod server;
#[cfg(test)]
mod testing;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Search Korean drug price records and find products sharing an active ingredient"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Service key for the public data APIs
    #[clap(long, env = "DRUGFINDER_SERVICE_KEY", global = true, hide_env_values = true)]
    service_key: Option<String>,

    /// Timeout in seconds for each remote call
    #[clap(long, env = "DRUGFINDER_TIMEOUT_SECS", global = true, default_value = "30")]
    timeout: u64,

    /// Accept invalid TLS certificates from the remote APIs
    #[clap(long, env = "DRUGFINDER_INSECURE", global = true, default_value = "false")]
    insecure: bool,

    /// Whether to display additional information.
    #[clap(long, env = "DRUGFINDER_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Search drug details, then list products with the same ingredient
    Search(crate::search::SearchOptions),

    /// List bulk dataset rows sharing an ingredient code
    Identical(crate::identical::IdenticalOptions),

    /// Fetch the bulk dataset and save it as CSV
    Load(crate::load::LoadOptions),

    /// Run the HTTP API
    Serve(crate::server::ServeOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();

    let default_filter = if app.global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match app.command {
        SubCommands::Search(options) => crate::search::run(options, app.global).await,
        SubCommands::Identical(options) => crate::identical::run(options, app.global).await,
        SubCommands::Load(options) => crate::load::run(options, app.global).await,
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
