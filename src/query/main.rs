//! Query server for provider searches.
//!
//! Serves attribute search and address + radius search over an in-memory
//! provider dataset, with geocoding memoized for a fixed TTL.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geoaccess::config::Config;
use geoaccess::filter::FilterOptions;
use geoaccess::geocode::{GeocodeCache, NominatimGeocoder, SystemClock};
use geoaccess::{Coordinate, ProviderDataset, SearchResult, SearchService};

mod params;
use params::{ProviderQueryParams, RadiusQueryParams};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "geoaccess")]
#[command(about = "Provider filtering and geo-radius search server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Provider CSV, optionally gzipped (overrides config)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Nominatim base URL (overrides config)
    #[arg(long)]
    geocoder_url: Option<String>,
}

/// Application state shared across handlers
struct AppState {
    search: SearchService,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(data) = args.data {
        config.dataset.path = data;
    }
    if let Some(url) = args.geocoder_url {
        config.geocoder.base_url = url;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("GeoAccess Query Server");

    let dataset = ProviderDataset::load(&config.dataset.path).context("Failed to load providers")?;
    if dataset.is_empty() {
        anyhow::bail!("No usable providers in {}", config.dataset.path.display());
    }

    info!("Using geocoder at {}", config.geocoder.base_url);
    let geocoder = NominatimGeocoder::new(
        &config.geocoder.base_url,
        &config.geocoder.user_agent,
        config.geocoder.timeout(),
    )
    .context("Failed to create geocoder client")?;
    let cache = GeocodeCache::with_clock(
        Arc::new(geocoder),
        Arc::new(SystemClock),
        config.geocoder.cache_ttl(),
    )
    .with_timeout(config.geocoder.timeout());

    let state = Arc::new(AppState {
        search: SearchService::new(Arc::new(dataset), cache),
    });

    spawn_cache_housekeeping(state.clone(), config.geocoder.cache_ttl());

    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/filters", get(filters_handler))
        .route("/v1/providers", get(providers_handler))
        .route("/v1/radius", get(radius_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop expired geocode entries so the map stays bounded.
fn spawn_cache_housekeeping(state: Arc<AppState>, ttl: std::time::Duration) {
    let period = ttl.max(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            state.search.geocode_cache().purge_expired();
        }
    });
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: state.search.dataset().len(),
        cached_addresses: state.search.geocode_cache().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    providers: usize,
    cached_addresses: usize,
}

/// Filter option lists for building the search form
async fn filters_handler(State(state): State<Arc<AppState>>) -> Response {
    let dataset = state.search.dataset();
    Json(FiltersResponse {
        options: dataset.options(),
        center: dataset.centroid(),
    })
    .into_response()
}

#[derive(Serialize)]
struct FiltersResponse<'a> {
    #[serde(flatten)]
    options: &'a FilterOptions,
    center: Option<Coordinate>,
}

/// Attribute-only search
async fn providers_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProviderQueryParams>,
) -> Response {
    let result = state.search.attribute_search(&params.to_filter());
    search_response(result)
}

/// Address + radius search
async fn radius_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RadiusQueryParams>,
) -> Response {
    let result = state.search.radius_search(&params.to_request()).await;
    search_response(result)
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    #[serde(flatten)]
    result: SearchResult<'a>,
    total: usize,
}

/// Results borrow from the dataset, so serialize before the borrow ends.
fn search_response(result: SearchResult<'_>) -> Response {
    let total = result.len();
    Json(SearchResponse { result, total }).into_response()
}
