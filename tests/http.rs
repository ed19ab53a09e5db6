mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{record, unavailable, ScriptedSource};
use deploy_dash::render::PageOptions;
use deploy_dash::server::{router, AppState};
use deploy_dash::RefreshCoordinator;

async fn app(replies: Vec<common::Reply>, prime: bool) -> Router {
    let coordinator = RefreshCoordinator::new(ScriptedSource::new(replies));
    if prime {
        coordinator.refresh().await;
    }
    router(AppState {
        coordinator,
        export_base: "sensor-deployment-status".to_string(),
        page: PageOptions::default(),
    })
}

fn three_sites() -> Vec<common::Reply> {
    let mut trouble = record("Coastal Board", "ORP-0518", "Trouble");
    trouble.latest_updates = "21 Feb: no signal\n23 Feb: said \"still intermittent\"".to_string();
    vec![Ok(vec![
        record("Northfield Paper", "PH-0101", "Live"),
        trouble,
        record("Riverbend Pulp", "TMP-0330", "NA"),
    ])]
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn dashboard_renders_gauge_and_table() {
    let app = app(three_sites(), true).await;
    let (status, _, body) = send(&app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Northfield Paper"));
    assert!(body.contains("33%"), "one of three live");
    assert!(body.contains("1 of 3"));
    assert!(body.contains("Attention Required"));
    assert!(body.contains(r#"href="/sensors/2""#));
}

#[tokio::test]
async fn dashboard_filters_by_status() {
    let app = app(three_sites(), true).await;
    let (_, _, body) = send(&app, "GET", "/?status=Trouble").await;

    assert!(body.contains("Coastal Board"));
    assert!(!body.contains(r#"href="/sensors/0""#));
    assert!(body.contains(r#"href="/sensors/1""#));
}

#[tokio::test]
async fn export_downloads_csv_named_by_today() {
    let app = app(three_sites(), true).await;
    let before = Utc::now().date_naive();
    let (status, headers, body) = send(&app, "GET", "/export.csv").await;
    let after = Utc::now().date_naive();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    let expected: Vec<String> = [before, after]
        .iter()
        .map(|d| format!("attachment; filename=\"sensor-deployment-status-{}.csv\"", d.format("%Y-%m-%d")))
        .collect();
    assert!(expected.iter().any(|e| e == disposition), "{disposition}");

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 12);
    assert_eq!(&headers[3], "Status");

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    let statuses: Vec<&str> = rows.iter().map(|r| &r[3]).collect();
    assert_eq!(statuses, ["Live", "Trouble", "NA"]);
    assert_eq!(&rows[1][4], "21 Feb: no signal\n23 Feb: said \"still intermittent\"");
    assert!(body.contains(r#""23 Feb: said ""still intermittent""""#));
}

#[tokio::test]
async fn detail_page_and_missing_row() {
    let app = app(three_sites(), true).await;

    let (status, _, body) = send(&app, "GET", "/sensors/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ORP-0518"));
    assert!(body.contains("<li>21 Feb: no signal</li>"));
    assert!(body.contains("row 1 of data fetched at"));

    let (status, _, body) = send(&app, "GET", "/sensors/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("not in the current data (3 rows)"));
}

#[tokio::test]
async fn status_api_reports_summary_and_connection() {
    let app = app(three_sites(), true).await;
    let (status, _, body) = send(&app, "GET", "/api/status").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["connected"], true);
    assert_eq!(json["loading"], false);
    assert!(json["error"].is_null());
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["live"], 1);
    assert_eq!(json["summary"]["trouble"], 1);
    assert_eq!(json["summary"]["notDeployed"], 1);
}

#[tokio::test]
async fn sensors_api_keeps_snapshot_index() {
    let app = app(three_sites(), true).await;
    let (_, _, body) = send(&app, "GET", "/api/sensors?status=NA").await;

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["index"], 2);
    assert_eq!(rows[0]["customerName"], "Riverbend Pulp");
    assert_eq!(rows[0]["status"], "NA");
}

#[tokio::test]
async fn refresh_failure_keeps_data_and_flags_error() {
    let mut replies = three_sites();
    replies.push(Err(unavailable()));
    let app = app(replies, true).await;

    let (status, _, body) = send(&app, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["connected"], false);
    assert_eq!(json["summary"]["total"], 3);
    assert!(json["error"]["message"].as_str().unwrap().contains("503"));

    let (_, _, body) = send(&app, "GET", "/").await;
    assert!(body.contains("Connection lost"));
    assert!(body.contains("Northfield Paper"));
}

#[tokio::test]
async fn manual_refresh_redirects_home() {
    let app = app(three_sites(), false).await;
    let (status, headers, _) = send(&app, "POST", "/refresh").await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/");

    let (_, _, body) = send(&app, "GET", "/api/status").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["summary"]["total"], 3);
}

#[tokio::test]
async fn empty_dashboard_before_first_fetch() {
    let app = app(vec![], false).await;
    let (status, _, body) = send(&app, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Setup Required"));
    assert!(body.contains("No sensors to show"));

    let (_, _, body) = send(&app, "GET", "/export.csv").await;
    assert_eq!(body.lines().count(), 1, "header only");
}
