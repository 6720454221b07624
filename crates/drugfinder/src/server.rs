use crate::bulk::{read_dataset, BulkClient, DatasetSource};
use crate::cache::DatasetCache;
use crate::config::ApiConfig;
use crate::detail::{DetailClient, DetailSearch};
use crate::dispatch;
use crate::prelude::{eprintln, *};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use drugfinder_core::bulk::DEFAULT_PER_PAGE;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::DrugRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Host to bind to
    #[arg(long, env = "DRUGFINDER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "DRUGFINDER_PORT", default_value = "5000")]
    port: u16,

    /// Seed the dataset cache from a saved CSV instead of fetching it
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where a fetched dataset is saved
    #[arg(short, long, default_value = "drug_data_api.csv")]
    output: PathBuf,

    /// Rows per bulk dataset page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,
}

/// Shared handler state
pub struct AppState<D, S> {
    pub detail: Arc<D>,
    pub source: Arc<S>,
    pub cache: Arc<DatasetCache>,
}

impl<D, S> Clone for AppState<D, S> {
    fn clone(&self) -> Self {
        Self {
            detail: self.detail.clone(),
            source: self.source.clone(),
            cache: self.cache.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdenticalRequest {
    #[serde(rename = "gnlNmCd", default)]
    pub ingredient_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(rename = "isIdenticalSearch")]
    pub is_identical_search: bool,
    pub results: Vec<DrugRecord>,
}

#[derive(Debug, Serialize)]
pub struct IdenticalResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<DrugRecord>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn error_response(err: Error) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    log::warn!("Request failed ({}): {}", status, err);

    let body = ErrorResponse {
        success: false,
        error: err.to_string(),
    };
    (status, Json(body)).into_response()
}

fn invalid_body(rejection: JsonRejection) -> Error {
    Error::InvalidRequest(rejection.body_text())
}

async fn search_handler<D, S>(
    State(state): State<AppState<D, S>>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Response
where
    D: DetailSearch + Send + Sync + 'static,
    S: DatasetSource + Send + Sync + 'static,
{
    let criteria = match body {
        Ok(Json(criteria)) => criteria,
        Err(rejection) => return error_response(invalid_body(rejection)),
    };
    match dispatch::search(criteria, &*state.detail, &state.cache, &*state.source).await {
        Ok(reply) => Json(SearchResponse {
            success: true,
            is_identical_search: reply.identical,
            results: reply.records,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn identical_handler<D, S>(
    State(state): State<AppState<D, S>>,
    body: Result<Json<IdenticalRequest>, JsonRejection>,
) -> Response
where
    D: DetailSearch + Send + Sync + 'static,
    S: DatasetSource + Send + Sync + 'static,
{
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(invalid_body(rejection)),
    };
    match dispatch::identical(request.ingredient_code, &state.cache, &*state.source).await {
        Ok(results) => Json(IdenticalResponse {
            success: true,
            count: results.len(),
            results,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

/// The API routes with permissive CORS
pub fn router<D, S>(state: AppState<D, S>) -> Router
where
    D: DetailSearch + Send + Sync + 'static,
    S: DatasetSource + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(search_handler::<D, S>))
        .route("/api/identical", post(identical_handler::<D, S>))
        .layer(cors)
        .with_state(state)
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = ApiConfig::resolve(&global)?;
    let client = config.build_client()?;

    let cache = match &options.dataset {
        Some(path) => DatasetCache::seeded(read_dataset(path)?),
        None => DatasetCache::new(),
    };
    if let Some(dataset) = cache.get() {
        log::info!("Seeded dataset cache with {} rows", dataset.len());
    }

    let state = AppState {
        detail: Arc::new(DetailClient::new(&config, client.clone())),
        source: Arc::new(
            BulkClient::new(&config, client)
                .with_per_page(options.per_page)
                .with_output(&options.output),
        ),
        cache: Arc::new(cache),
    };

    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    eprintln!("drugfinder API listening on http://{}", addr);
    if global.verbose {
        eprintln!("Search endpoint: POST http://{}/api/search", addr);
        eprintln!("Identical endpoint: POST http://{}/api/identical", addr);
    }

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}
