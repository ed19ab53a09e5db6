//! ==============================================================================
//! render.rs - server-side html for the dashboard
//! ==============================================================================
//!
//! purpose:
//!     pure functions from an immutable DashboardView to html. nothing here
//!     reads shared state or the clock except for formatting timestamps.
//!
//! pages:
//!     - dashboard: header, connection banner, status gauge, status cards,
//!                  trouble alert, export button, sensor table
//!     - detail:    one record, including the update history
//!     - not found: stale or bad row index
//!
//! relationships:
//!     - used by: server.rs
//!     - uses: table.rs (row selection), domain.rs (summary percentages)
//!
//! ==============================================================================

use std::f64::consts::PI;
use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::domain::{SensorRecord, SensorStatus, SensorSummary};
use crate::refresh::DashboardView;
use crate::table::{select_rows, TableQuery};

const PREVIEW_CHARS: usize = 100;
const GAUGE_RADIUS: f64 = 90.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct PageOptions {
    pub dark_mode: bool,
}

// ==============================================================================
// presentation helpers
// ==============================================================================

/// css class for a status badge
pub fn status_class(status: &SensorStatus) -> &'static str {
    match status {
        SensorStatus::Live => "status-live",
        SensorStatus::Trouble => "status-trouble",
        _ => "status-muted",
    }
}

/// css class for a table row
pub fn row_class(status: &SensorStatus) -> &'static str {
    match status {
        SensorStatus::Live => "row-live",
        SensorStatus::Trouble => "row-trouble",
        SensorStatus::NotDeployed => "row-na",
        _ => "row-plain",
    }
}

/// table cell text for the latest-updates log
pub fn preview_updates(updates: &str) -> String {
    if updates.is_empty() {
        return "No updates available".to_string();
    }
    if updates.chars().count() > PREVIEW_CHARS {
        let head: String = updates.chars().take(PREVIEW_CHARS).collect();
        return format!("{head}...");
    }
    updates.to_string()
}

/// history entries for the detail page, blank lines dropped
pub fn update_lines(updates: &str) -> Vec<&str> {
    updates
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// stroke-dashoffset of a gauge arc drawn for `pct` percent
pub fn gauge_offset(pct: f64) -> f64 {
    let circumference = 2.0 * PI * GAUGE_RADIUS;
    circumference - (pct / 100.0) * circumference
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

// ==============================================================================
// page shell
// ==============================================================================

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f3f6f9; color: #1f2937; }
body.dark { background: #111827; color: #e5e7eb; }
body.dark .card, body.dark table, body.dark header { background: #1f2937; }
header { display: flex; justify-content: space-between; align-items: center; padding: 1rem 2rem; background: #fff; box-shadow: 0 1px 2px #0002; }
main { max-width: 80rem; margin: 0 auto; padding: 2rem; }
.card { background: #fff; border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 1px 2px #0002; }
.banner-ok { border-left: 4px solid #10b981; }
.banner-bad { border-left: 4px solid #ef4444; }
.banner-setup { border-left: 4px solid #f59e0b; }
.snapshot { color: #6b7280; margin: 0 0 1rem; }
.gauge { display: flex; gap: 2rem; align-items: center; flex-wrap: wrap; }
.cards { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; flex: 1; }
.stat { border-radius: 8px; padding: 1rem; background: #f9fafb; }
.stat b { font-size: 1.8rem; display: block; }
.alert { background: #fef2f2; border: 1px solid #fecaca; color: #991b1b; }
table { width: 100%; border-collapse: collapse; background: #fff; border-radius: 12px; overflow: hidden; }
th, td { text-align: left; padding: .6rem .8rem; border-bottom: 1px solid #e5e7eb; vertical-align: top; }
td a { color: inherit; text-decoration: none; display: block; }
.row-live { background: #ecfdf5; } .row-trouble { background: #fef2f2; } .row-na { background: #f9fafb; }
.badge { padding: .15rem .6rem; border-radius: 999px; font-size: .8rem; font-weight: 600; }
.status-live { color: #059669; background: #ecfdf5; }
.status-trouble { color: #dc2626; background: #fef2f2; }
.status-muted { color: #4b5563; background: #f3f4f6; }
.btn { display: inline-block; padding: .5rem 1rem; border-radius: 8px; background: #2563eb; color: #fff; border: 0; text-decoration: none; cursor: pointer; }
.toolbar { display: flex; justify-content: space-between; margin-bottom: .5rem; }
.updates { white-space: pre-line; }
"#;

fn page(title: &str, body: &str, opts: PageOptions) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body class="{theme}">
{body}
</body>
</html>"#,
        title = html_escape(title),
        theme = if opts.dark_mode { "dark" } else { "light" },
    )
}

// ==============================================================================
// dashboard
// ==============================================================================

fn render_header(view: &DashboardView) -> String {
    let updated = view
        .last_updated()
        .map(local_time)
        .unwrap_or_else(|| "never".to_string());
    let refresh_label = if view.loading { "Refreshing..." } else { "Refresh" };
    format!(
        r#"<header>
  <div><h1>Sensor Deployment Status</h1><small>Last updated: {updated}</small></div>
  <form method="post" action="/refresh"><button class="btn" type="submit">{refresh_label}</button></form>
</header>"#
    )
}

fn render_connection(view: &DashboardView) -> String {
    if view.is_connected() {
        let updated = view.last_updated().map(local_time).unwrap_or_default();
        return format!(
            r#"<div class="card banner-ok">Connected to {} &middot; last sync {}</div>"#,
            html_escape(&view.source),
            updated
        );
    }
    if let Some(failure) = view.last_error() {
        let showing = match view.last_updated() {
            Some(at) => format!("showing data from {}", local_time(at)),
            None => "no data loaded yet".to_string(),
        };
        return format!(
            r#"<div class="card banner-bad">Connection lost: {} &middot; {}</div>"#,
            html_escape(&failure.message),
            showing
        );
    }
    r#"<div class="card banner-setup"><b>Setup Required:</b> configure a sheet source in dashboard.toml to enable live data</div>"#
        .to_string()
}

fn render_gauge(summary: &SensorSummary) -> String {
    let live_pct = summary.live_percent();
    let circumference = 2.0 * PI * GAUGE_RADIUS;
    let mut out = String::new();

    let _ = write!(
        out,
        r##"<section class="card"><h2>System Status Overview</h2><div class="gauge">
<svg width="200" height="200" viewBox="0 0 200 200" style="transform: rotate(-90deg)">
  <circle cx="100" cy="100" r="90" stroke="#f3f4f6" stroke-width="12" fill="transparent"/>
  <circle cx="100" cy="100" r="90" stroke="#10b981" stroke-width="12" fill="transparent"
    stroke-dasharray="{circumference:.2}" stroke-dashoffset="{offset:.2}" stroke-linecap="round"/>
</svg>
<div><b style="font-size:2.5rem">{live_round}%</b><div>LIVE</div><small>{live} of {total}</small></div>
<div class="cards">"##,
        offset = gauge_offset(live_pct),
        live_round = live_pct.round(),
        live = summary.live,
        total = summary.total,
    );

    let cards = [
        ("Total Sensors", summary.total, 100.0),
        ("Live", summary.live, live_pct),
        ("Trouble", summary.trouble, summary.trouble_percent()),
        ("Not Deployed", summary.not_deployed, summary.not_deployed_percent()),
    ];
    for (label, count, pct) in cards {
        let _ = write!(
            out,
            r#"<div class="stat">{label}<b>{count}</b><small>{}%</small></div>"#,
            if summary.total == 0 { 0.0 } else { pct.round() }
        );
    }
    out.push_str("</div></div></section>");

    if summary.trouble > 0 {
        let plural = if summary.trouble > 1 { "s" } else { "" };
        let _ = write!(
            out,
            r#"<section class="card alert"><h3>Attention Required</h3><p>{} sensor{} require immediate attention. Review the details below and contact the appropriate site teams.</p></section>"#,
            summary.trouble, plural
        );
    }
    out
}

fn render_table(records: &[SensorRecord], query: &TableQuery) -> String {
    let rows = select_rows(records, query);
    let mut out = String::new();

    out.push_str(
        r#"<div class="toolbar"><div>Filter: <a href="/">All</a> · <a href="/?status=Live">Live</a> · <a href="/?status=Trouble">Trouble</a> · <a href="/?status=NA">NA</a> · <a href="/?sort=deployment_date">Newest first</a></div>
<a class="btn" href="/export.csv">Export CSV</a></div>
<table><thead><tr><th>Customer Name</th><th>Sensor Assigned</th><th>Deployment Date</th><th>Status</th><th>Latest Updates</th></tr></thead><tbody>"#,
    );

    if rows.is_empty() {
        out.push_str(r#"<tr><td colspan="5">No sensors to show</td></tr>"#);
    }
    for (index, record) in rows {
        let link = format!("/sensors/{index}");
        let _ = write!(
            out,
            r#"<tr class="{row}"><td><a href="{link}">{customer}</a></td><td><a href="{link}">{sensor}</a></td><td>{date}</td><td><span class="badge {badge}">{status}</span></td><td>{updates}</td></tr>"#,
            row = row_class(&record.status),
            customer = html_escape(&record.customer_name),
            sensor = html_escape(&record.sensor_assigned),
            date = html_escape(&record.deployment_date),
            badge = status_class(&record.status),
            status = html_escape(record.status.as_str()),
            updates = html_escape(&preview_updates(&record.latest_updates)),
        );
    }
    out.push_str("</tbody></table>");
    out
}

pub fn render_dashboard(view: &DashboardView, query: &TableQuery, opts: PageOptions) -> String {
    let summary = view.summary();
    let body = format!(
        "{}<main>{}{}{}</main>",
        render_header(view),
        render_connection(view),
        render_gauge(&summary),
        render_table(view.records(), query),
    );
    page("Sensor Deployment Status", &body, opts)
}

// ==============================================================================
// detail
// ==============================================================================

fn render_trouble_section(record: &SensorRecord) -> String {
    if record.reason_for_trouble.is_empty() && record.resolution_status.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<section class="card alert"><h3>Trouble Information</h3>"#);
    if !record.reason_for_trouble.is_empty() {
        let _ = write!(out, "<p><b>Reason:</b> {}</p>", html_escape(&record.reason_for_trouble));
    }
    if !record.resolution_status.is_empty() {
        let _ = write!(out, "<p><b>Resolution Status:</b> {}</p>", html_escape(&record.resolution_status));
    }
    out.push_str("</section>");
    out
}

fn render_history(record: &SensorRecord) -> String {
    let lines = update_lines(&record.latest_updates);
    if lines.is_empty() {
        return r#"<section class="card"><h3>Update History</h3><p>No update history available</p></section>"#
            .to_string();
    }
    let items: String = lines
        .iter()
        .map(|line| format!("<li>{}</li>", html_escape(line)))
        .collect();
    format!(r#"<section class="card"><h3>Update History</h3><ul>{items}</ul></section>"#)
}

/// `index` and `fetched_at` identify the snapshot row; rows are re-read on
/// every refresh, so a bookmarked detail link can point at another sensor later
pub fn render_detail(
    record: &SensorRecord,
    index: usize,
    fetched_at: Option<DateTime<Utc>>,
    opts: PageOptions,
) -> String {
    let snapshot = match fetched_at {
        Some(at) => format!("row {} of data fetched at {}", index, local_time(at)),
        None => format!("row {index}"),
    };
    let body = format!(
        r#"<header><div><h1>{sensor}</h1><small>{customer}</small></div><a class="btn" href="/">Close</a></header>
<main>
<p class="snapshot"><small>{snapshot}</small></p>
<section class="card">
  <p><b>Status:</b> <span class="badge {badge}">{status}</span></p>
  <p><b>Deployment Date:</b> {date}</p>
  <p><b>Deployment:</b> {deployment}</p>
</section>
<section class="card"><h3>Technical Details</h3>
  <p><b>Unit:</b> {unit}</p>
  <p><b>Application:</b> {application}</p>
  <p><b>Parameter:</b> {parameter}</p>
  <p><b>Measurement Range:</b> {range}</p>
</section>
{trouble}{history}
</main>"#,
        sensor = html_escape(&record.sensor_assigned),
        customer = html_escape(&record.customer_name),
        badge = status_class(&record.status),
        status = html_escape(record.status.as_str()),
        date = html_escape(or_fallback(&record.deployment_date, "Not deployed")),
        deployment = html_escape(&record.deployment),
        unit = html_escape(or_fallback(&record.unit, "N/A")),
        application = html_escape(or_fallback(&record.application, "N/A")),
        parameter = html_escape(or_fallback(&record.parameter, "N/A")),
        range = html_escape(or_fallback(&record.measurement_range, "N/A")),
        trouble = render_trouble_section(record),
        history = render_history(record),
    );
    let title = format!("{} - {}", record.sensor_assigned, record.customer_name);
    page(&title, &body, opts)
}

pub fn render_not_found(message: &str, opts: PageOptions) -> String {
    let body = format!(
        r#"<main><section class="card"><h1>Not found</h1><p>{}</p><a class="btn" href="/">Back to dashboard</a></section></main>"#,
        html_escape(message)
    );
    page("Not found", &body, opts)
}
