//! Health Check Endpoints
//!
//! `/`는 단순 생존 확인, `/health`는 인덱서까지 확인하는 "깊은 헬스체크".
//! 인덱서가 죽어도 200을 반환하고 `status: degraded`로 표시한다
//! (읽기 엔드포인트 외에 `/rebalance/calculate`는 여전히 동작하므로).

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

pub const SERVICE_NAME: &str = "AutoPilot DeFi Backend";

/// `GET /` 응답
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Health check 응답
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub indexer: IndexerStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct IndexerStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "active",
        service: SERVICE_NAME,
    })
}

/// GET /health
///
/// 서버 및 인덱서 상태 확인
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = std::time::Instant::now();
    let indexer = match state.indexer.ping().await {
        Ok(()) => IndexerStatus {
            connected: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "Indexer health check failed");
            IndexerStatus {
                connected: false,
                latency_ms: None,
                error: Some(err.to_string()),
            }
        }
    };

    Json(HealthResponse {
        status: if indexer.connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexer,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
