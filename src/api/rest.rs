use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, warn};

use super::DaemonHealth;
use crate::domain::collector::{Category, CollectRequest, Collector, CollectorError};
use crate::domain::snapshot::Snapshot;

/// Shared application state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub collector: Collector,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(collector: Collector) -> Self {
        Self {
            collector,
            started_at: Instant::now(),
        }
    }

    pub fn health(&self) -> DaemonHealth {
        DaemonHealth {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            degradations: self.collector.degradation_counts(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub traceroute: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: &str, details: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details: details.to_string(),
            timestamp: Utc::now(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/network-status", get(network_status))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<DaemonHealth> {
    Json(state.health())
}

async fn network_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<Snapshot>, ApiError> {
    let category = match params.category.as_deref() {
        None | Some("") => Category::All,
        Some(raw) => raw.parse().map_err(|e: CollectorError| {
            warn!(status_type = raw, "rejected unknown status type");
            api_error(StatusCode::BAD_REQUEST, "Invalid status type", e)
        })?,
    };

    let request = CollectRequest {
        category,
        traceroute: params.traceroute,
    };

    state.collector.collect(&request).await.map(Json).map_err(|e| {
        error!(error = %e, "network status collection failed");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch network status",
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::CollectorConfig;
    use crate::domain::runner::scripted::ScriptedRunner;

    fn app(runner: ScriptedRunner) -> Router {
        let collector = Collector::new(Arc::new(runner), CollectorConfig::default());
        router(AppState::new(collector))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn unknown_type_is_bad_request() {
        let (status, body) = get_json(
            app(ScriptedRunner::new()),
            "/api/network-status?type=disks",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid status type");
        assert!(body["details"].as_str().unwrap().contains("disks"));
        assert!(body["timestamp"].is_string());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unknown_type_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (status, _) = get_json(
            app(ScriptedRunner::new()),
            "/api/network-status?type=bandwidth",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("rejected unknown status type"));
        assert!(output.contains("bandwidth"));
    }

    #[tokio::test]
    async fn security_category_only() {
        let runner = ScriptedRunner::new().ok(
            "lsof -i -P -n",
            "sshd 301 root 3u IPv4 0x5e2b 0t0 TCP *:22 (LISTEN)\n",
        );
        let (status, body) = get_json(app(runner), "/api/network-status?type=security").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["security"]["ports"][0]["port"], 22);
        assert_eq!(body["security"]["ports"][0]["risk"], "high");
        assert!(body.get("interfaces").is_none());
        assert!(body.get("macInfo").is_none());
    }

    #[tokio::test]
    async fn missing_type_collects_everything() {
        let (status, body) = get_json(app(ScriptedRunner::new()), "/api/network-status").await;
        assert_eq!(status, StatusCode::OK);
        for key in [
            "interfaces",
            "traffic",
            "security",
            "routes",
            "performance",
            "ping",
            "macInfo",
        ] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["ping"]["latency"], 999.0);
        assert!(body["degraded"].as_array().is_some());
    }

    #[tokio::test]
    async fn health_reports_degradation_counts() {
        let app = app(ScriptedRunner::new());
        let (_, _) = get_json(app.clone(), "/api/network-status?type=routes").await;
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        let degradations = body["degradations"].as_array().unwrap();
        assert!(degradations.iter().any(|d| d["probe"] == "ping"));
    }
}
