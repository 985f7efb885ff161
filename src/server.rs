use crate::boundary::BoundaryDocument;
use crate::config::AppConfig;
use crate::data::RiskTable;
use crate::projection::{self, ColorRanges};
use crate::types::RiskIndex;
use crate::view;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub struct AppState {
    pub table: RiskTable,
    pub boundary: BoundaryDocument,
    pub ranges: ColorRanges,
    /// Dataset region codes with no matching boundary feature. Those
    /// regions render blank on the map; surfaced in /api/meta.
    pub unmatched_codes: Vec<String>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(table: RiskTable, boundary: BoundaryDocument, config: AppConfig) -> Self {
        let ranges = projection::color_ranges(&table);
        let unmatched_codes: Vec<String> = table
            .region_codes()
            .into_iter()
            .filter(|code| !boundary.contains_code(code))
            .collect();
        if !unmatched_codes.is_empty() {
            warn!(
                count = unmatched_codes.len(),
                "region codes without boundary features will render blank"
            );
        }
        AppState {
            table,
            boundary,
            ranges,
            unmatched_codes,
            config,
        }
    }
}

#[derive(Serialize)]
struct IndexMeta {
    index: RiskIndex,
    title: &'static str,
    column: &'static str,
    color_scale: &'static str,
    color_range: [f64; 2],
}

#[derive(Serialize)]
struct MetaResponse {
    years: Vec<i32>,
    indices: Vec<IndexMeta>,
    dataset_fingerprint: String,
    boundary_features: usize,
    unmatched_codes: Vec<String>,
}

pub async fn start_server(state: AppState) -> Result<()> {
    let port = state.config.server.port;
    let static_dir = state.config.server.static_dir.clone();
    let state = Arc::new(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("starting dashboard on http://{}", addr);

    let app = Router::new()
        .route("/api/meta", get(meta_handler))
        .route("/api/boundary", get(boundary_handler))
        .route("/api/year/:year", get(year_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn meta_handler(State(state): State<Arc<AppState>>) -> Json<MetaResponse> {
    let indices = RiskIndex::ALL
        .iter()
        .map(|&index| IndexMeta {
            index,
            title: index.title(),
            column: index.column(),
            color_scale: index.color_scale(),
            color_range: state.ranges.range(index),
        })
        .collect();

    Json(MetaResponse {
        years: state.table.years(),
        indices,
        dataset_fingerprint: state.table.fingerprint().to_string(),
        boundary_features: state.boundary.feature_count(),
        unmatched_codes: state.unmatched_codes.clone(),
    })
}

async fn boundary_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Verbatim passthrough of the cached document.
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.boundary.raw().to_owned(),
    )
}

async fn year_handler(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Json<view::YearView> {
    // An empty year is a warning payload, not an error response.
    Json(view::build_year_view(&state.table, &state.ranges, year))
}
