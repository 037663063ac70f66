//! HTTP routes.
//!
//! - `GET /` landing page
//! - `GET /scrape` one page of a plain scrape
//! - `GET /search` one page of a filtered, searched and sorted scrape
//! - `GET /download` spreadsheet of the default scrape

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, ScraperKind, SnapshotKind};
use crate::error::AppError;
use crate::export::{self, XLSX_MIME};
use crate::models::Property;
use crate::query::{Format, QuerySpec, RawQuery};
use crate::render;
use crate::scrapers::{FixtureScraper, RealtorScraper, ScraperTrait, SearchParams};
use crate::shaper::{self, Page};
use crate::snapshot::{InMemorySnapshotStore, JsonFileSnapshotStore, SnapshotStore, LAST_RESULT_KEY};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<dyn ScraperTrait>,
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Scrape parameters used when a request omits them, and by `/download`.
    pub defaults: SearchParams,
    /// Where `/download` saves the workbook it serves.
    pub export_path: PathBuf,
}

impl AppState {
    /// Builds the scraper and snapshot store selected by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let scraper: Arc<dyn ScraperTrait> = match config.scraper.kind {
            ScraperKind::Realtor => Arc::new(RealtorScraper::with_timeout(config.scraper.timeout)?),
            ScraperKind::Fixture => Arc::new(FixtureScraper::new(&config.scraper.fixture_path)),
        };
        let snapshots: Arc<dyn SnapshotStore> = match config.snapshot.kind {
            SnapshotKind::File => Arc::new(JsonFileSnapshotStore::new(&config.snapshot.dir)),
            SnapshotKind::Memory => Arc::new(InMemorySnapshotStore::new()),
        };
        info!("Using {} scraper", scraper.source_name());

        Ok(Self {
            scraper,
            snapshots,
            defaults: config.scrape.clone().into(),
            export_path: config.export.path.clone(),
        })
    }

    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Property>, AppError> {
        let properties = self.scraper.scrape(params).await.map_err(AppError::Scrape)?;
        info!("{} returned {} properties", self.scraper.source_name(), properties.len());
        Ok(properties)
    }

    async fn save(&self, page: &Page) -> Result<(), AppError> {
        self.snapshots
            .put(LAST_RESULT_KEY, &page.properties)
            .await
            .map_err(AppError::Snapshot)
    }

    /// Re-scrapes with the default parameters and builds a workbook.
    pub async fn export(&self) -> Result<Vec<u8>, AppError> {
        let properties = self.scrape(&self.defaults).await?;
        export::export_to(properties, &self.export_path)
            .await
            .map_err(AppError::Export)
    }
}

/// Build an axum `Router` serving every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/scrape", get(scrape))
        .route("/search", get(search))
        .route("/download", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the application on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

fn respond(route: &str, spec: &QuerySpec, page: Page) -> Response {
    match spec.format {
        Format::Json => Json(page).into_response(),
        Format::Html => Html(render::results_page(route, spec, &page)).into_response(),
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let spec = QuerySpec::parse(&RawQuery::default(), &state.defaults)?;
    Ok(Html(render::index_page(&spec)))
}

async fn scrape(
    State(state): State<AppState>,
    Query(raw): Query<RawQuery>,
) -> Result<Response, AppError> {
    let spec = QuerySpec::parse(&raw, &state.defaults)?;
    let properties = state.scrape(&spec.search).await?;
    let page = shaper::paginate(properties, spec.page, spec.per_page);
    state.save(&page).await?;
    Ok(respond("/scrape", &spec, page))
}

async fn search(
    State(state): State<AppState>,
    Query(raw): Query<RawQuery>,
) -> Result<Response, AppError> {
    let spec = QuerySpec::parse(&raw, &state.defaults)?;
    let properties = state.scrape(&spec.search).await?;
    let page = shaper::shape(properties, &spec)?;
    state.save(&page).await?;
    Ok(respond("/search", &spec, page))
}

async fn download(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = state.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"results.xlsx\""),
        ],
        bytes,
    )
        .into_response())
}
