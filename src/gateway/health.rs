use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};
use time::OffsetDateTime;
use tracing::debug;

use crate::state::GatewayState;

pub fn health_routes() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(check))
        .route("/health/readiness", get(readiness))
        .route("/health/liveness", get(liveness))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
}

/// Resident and virtual size of this process, in whole megabytes.
#[derive(Debug, Serialize)]
pub struct MemoryUsage {
    pub rss: String,
    #[serde(rename = "virtual")]
    pub virtual_size: String,
}

fn megabytes(bytes: u64) -> String {
    format!("{}MB", (bytes as f64 / (1024.0 * 1024.0)).round() as u64)
}

/// `None` where the platform does not expose process statistics.
fn memory_usage() -> Option<MemoryUsage> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let process = system.process(pid)?;
    Some(MemoryUsage {
        rss: megabytes(process.memory()),
        virtual_size: megabytes(process.virtual_memory()),
    })
}

impl HealthStatus {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            timestamp: OffsetDateTime::now_utc(),
            uptime: None,
            memory: None,
            service: None,
        }
    }
}

fn uptime(state: &GatewayState) -> String {
    format!("{}s", state.started_at.elapsed().as_secs())
}

pub async fn check(State(state): State<GatewayState>) -> Json<HealthStatus> {
    debug!("health check");
    Json(HealthStatus {
        uptime: Some(uptime(&state)),
        memory: memory_usage(),
        service: Some("gateway"),
        ..HealthStatus::new("ok")
    })
}

pub async fn readiness() -> Json<HealthStatus> {
    Json(HealthStatus {
        memory: memory_usage(),
        ..HealthStatus::new("ready")
    })
}

pub async fn liveness(State(state): State<GatewayState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        uptime: Some(uptime(&state)),
        ..HealthStatus::new("alive")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::AuthClient;
    use std::time::Duration;

    fn state() -> GatewayState {
        GatewayState::new(AuthClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap())
    }

    #[tokio::test]
    async fn health_payloads() {
        let Json(ok) = check(State(state())).await;
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "gateway");
        assert!(value["uptime"].as_str().unwrap().ends_with('s'));
        assert!(value["timestamp"].is_string());

        let Json(ready) = readiness().await;
        let value = serde_json::to_value(&ready).unwrap();
        assert_eq!(value["status"], "ready");
        assert!(value.get("uptime").is_none());

        let Json(alive) = liveness(State(state())).await;
        assert_eq!(alive.status, "alive");
        assert!(alive.uptime.is_some());
        assert!(alive.memory.is_none());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn health_and_readiness_report_process_memory() {
        let Json(ok) = check(State(state())).await;
        let value = serde_json::to_value(&ok).unwrap();
        let rss = value["memory"]["rss"].as_str().expect("rss reported");
        assert!(rss.ends_with("MB"));
        assert!(rss.trim_end_matches("MB").parse::<u64>().unwrap() > 0);
        assert!(value["memory"]["virtual"].as_str().unwrap().ends_with("MB"));

        let Json(ready) = readiness().await;
        assert!(ready.memory.is_some());
    }

    #[test]
    fn megabytes_round_to_nearest() {
        assert_eq!(megabytes(0), "0MB");
        assert_eq!(megabytes(1024 * 1024 + 600 * 1024), "2MB");
        assert_eq!(megabytes(1024 * 1024 + 100 * 1024), "1MB");
    }
}
