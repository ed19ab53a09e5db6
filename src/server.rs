//! ==============================================================================
//! server.rs - web server for the dashboard, detail pages, api and export
//! ==============================================================================
//!
//! routes:
//!     GET  /                 dashboard html (?status=..&sort=..)
//!     GET  /sensors/:index   detail html for one row of the current snapshot
//!     POST /refresh          manual refresh, then back to /
//!     GET  /export.csv       csv download of the current snapshot
//!     GET  /api/status       refresh state + summary as json
//!     GET  /api/sensors      records as json (?status=..&sort=..)
//!     POST /api/refresh      manual refresh, json state
//!
//! every handler takes one DashboardView snapshot from the coordinator and
//! renders from it, so a page never mixes two record sets.
//!
//! ==============================================================================

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::domain::{SensorRecord, SensorSummary};
use crate::export;
use crate::refresh::{DashboardView, RefreshCoordinator};
use crate::render::{self, PageOptions};
use crate::source::RecordSource;
use crate::table::{select_rows, TableQuery};

// ==============================================================================
// shared state
// ==============================================================================

pub struct AppState<S> {
    pub coordinator: RefreshCoordinator<S>,
    pub export_base: String,
    pub page: PageOptions,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            export_base: self.export_base.clone(),
            page: self.page,
        }
    }
}

pub fn router<S: RecordSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler::<S>))
        .route("/sensors/:index", get(detail_handler::<S>))
        .route("/refresh", post(refresh_handler::<S>))
        .route("/export.csv", get(export_handler::<S>))
        .route("/api/status", get(status_handler::<S>))
        .route("/api/sensors", get(sensors_handler::<S>))
        .route("/api/refresh", post(api_refresh_handler::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ==============================================================================
// html
// ==============================================================================

async fn dashboard_handler<S: RecordSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<TableQuery>,
) -> Html<String> {
    let view = state.coordinator.view().await;
    Html(render::render_dashboard(&view, &query, state.page))
}

async fn detail_handler<S: RecordSource>(
    State(state): State<AppState<S>>,
    Path(index): Path<usize>,
) -> Response {
    let view = state.coordinator.view().await;
    match view.records().get(index) {
        Some(record) => {
            Html(render::render_detail(record, index, view.last_updated(), state.page)).into_response()
        }
        None => {
            let message = format!(
                "sensor row {} is not in the current data ({} rows)",
                index,
                view.records().len()
            );
            (StatusCode::NOT_FOUND, Html(render::render_not_found(&message, state.page))).into_response()
        }
    }
}

async fn refresh_handler<S: RecordSource>(State(state): State<AppState<S>>) -> Redirect {
    info!("[HTTP] manual refresh");
    state.coordinator.refresh().await;
    Redirect::to("/")
}

// ==============================================================================
// export
// ==============================================================================

async fn export_handler<S: RecordSource>(State(state): State<AppState<S>>) -> Response {
    let view = state.coordinator.view().await;
    match export::export(view.records(), &state.export_base) {
        Ok(csv) => {
            info!("[EXPORT] {} rows as {}", view.records().len(), csv.filename);
            let disposition = format!("attachment; filename=\"{}\"", csv.filename.replace('"', "_"));
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv.content,
            )
                .into_response()
        }
        Err(e) => {
            error!("[EXPORT] failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("export failed: {e}")).into_response()
        }
    }
}

// ==============================================================================
// json api
// ==============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub connected: bool,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<ErrorBody>,
    pub source: String,
    pub summary: SensorSummary,
}

impl From<&DashboardView> for StatusBody {
    fn from(view: &DashboardView) -> Self {
        Self {
            connected: view.is_connected(),
            loading: view.loading,
            last_updated: view.last_updated(),
            error: view
                .last_error()
                .map(|f| ErrorBody { message: f.message.clone(), at: f.at }),
            source: view.source.clone(),
            summary: view.summary(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SensorRow<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub record: &'a SensorRecord,
}

async fn status_handler<S: RecordSource>(State(state): State<AppState<S>>) -> Json<StatusBody> {
    let view = state.coordinator.view().await;
    Json(StatusBody::from(&view))
}

async fn sensors_handler<S: RecordSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<TableQuery>,
) -> Response {
    let view = state.coordinator.view().await;
    let rows: Vec<SensorRow<'_>> = select_rows(view.records(), &query)
        .into_iter()
        .map(|(index, record)| SensorRow { index, record })
        .collect();
    Json(rows).into_response()
}

async fn api_refresh_handler<S: RecordSource>(State(state): State<AppState<S>>) -> Json<StatusBody> {
    let view = state.coordinator.refresh().await;
    Json(StatusBody::from(&view))
}
