//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::FOOTER_TEXT;
use crate::state::SharedState;
use crate::{BUILD_GIT_SHA, BUILD_TIMESTAMP};

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let mut collectors = String::new();
    for info in &state.collectors {
        writeln!(
            collectors,
            r#"        <tr><td><code>{}</code></td><td class="{}">{}</td><td>{}</td></tr>"#,
            info.name,
            if info.enabled { "on" } else { "off" },
            if info.enabled { "enabled" } else { "disabled" },
            if info.default_enabled { "yes" } else { "no" },
        )
        .ok();
    }

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"<li><a href="/health">/health</a> - scrape status and exporter statistics</li>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Herakles Disk Exporter</title>
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; margin: 0; padding: 20px; }}
        .container {{ max-width: 800px; margin: 0 auto; background: white; padding: 32px; border-radius: 8px; }}
        h1 {{ border-bottom: 3px solid #007bff; padding-bottom: 12px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ text-align: left; padding: 6px 10px; border-bottom: 1px solid #eee; }}
        .on {{ color: #28a745; }}
        .off {{ color: #999; }}
        .footer {{ margin-top: 32px; color: #666; font-size: 0.9em; text-align: center; }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Disk Exporter</h1>
    <p>Version <b>{version}</b> ({git_sha}, built {built}) | Uptime <b>{uptime}</b></p>

    <h2>Endpoints</h2>
    <ul>
        <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
        {health_link}
        <li><a href="/config">/config</a> - effective configuration (YAML)</li>
    </ul>

    <h2>Collectors</h2>
    <table>
        <tr><th>name</th><th>state</th><th>default</th></tr>
{collectors}    </table>

    <div class="footer">{footer}</div>
</div>
</body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
        git_sha = BUILD_GIT_SHA,
        built = BUILD_TIMESTAMP,
        uptime = uptime,
        health_link = health_link,
        collectors = collectors,
        footer = FOOTER_TEXT
    ))
}
