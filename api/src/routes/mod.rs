//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/`, `/health` - 상태 확인
//! - `/portfolio/*`, `/rebalance/*` - 리밸런싱 계산
//! - `/permission/*`, `/permission-events/*`, `/rebalances/*`, `/stats/*`,
//!   `/daily-metrics`, `/dashboard/*` - 인덱서 데이터

pub mod extract;
pub mod health;
pub mod portfolio;
pub mod wallet;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /                                  - 서비스 상태
/// GET  /health                            - 서버 + 인덱서 상태
///
/// GET  /portfolio/:wallet_address         - 현재 vs 목표 배분
/// POST /rebalance/calculate               - 리밸런싱 계산
///
/// GET  /permission/:wallet_address        - 활성 권한
/// GET  /permission-events/:wallet_address - 권한 이벤트 (?limit=)
/// GET  /rebalances/:wallet_address        - 리밸런싱 이력 (?limit=)
/// GET  /stats/:wallet_address             - 사용자 통계
/// GET  /daily-metrics                     - 일별 집계 (?days=)
/// GET  /dashboard/:wallet_address         - 대시보드 복합 조회
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health
        .route("/", get(health::root))
        .route("/health", get(health::health_check))

        // Portfolio
        .route("/portfolio/:wallet_address", get(portfolio::get_portfolio))
        .route("/rebalance/calculate", post(portfolio::calculate_rebalance))

        // Indexer data
        .route("/permission/:wallet_address", get(wallet::get_permission))
        .route("/permission-events/:wallet_address", get(wallet::get_permission_events))
        .route("/rebalances/:wallet_address", get(wallet::get_rebalances))
        .route("/stats/:wallet_address", get(wallet::get_user_stats))
        .route("/daily-metrics", get(wallet::get_daily_metrics))
        .route("/dashboard/:wallet_address", get(wallet::get_dashboard))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// `ALLOWED_ORIGINS`가 있으면 해당 origin만, 없으면 전체 허용.
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if state.config.is_production() {
            tracing::warn!("ALLOWED_ORIGINS is not set, CORS allows any origin");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        services::{
            indexer::mock::{event, stats, MockIndexer},
            FixedMarketOracle, RebalanceEngine, StaticAllocation,
        },
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(indexer: MockIndexer, config: Config) -> AppState {
        AppState {
            indexer: Arc::new(indexer),
            engine: Arc::new(RebalanceEngine::default()),
            market: Arc::new(FixedMarketOracle::default()),
            allocations: Arc::new(StaticAllocation::default()),
            config: Arc::new(config),
        }
    }

    fn app(indexer: MockIndexer) -> Router {
        create_router(state_with(indexer, Config::from_lookup(|_| None).unwrap()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (status, body) = get_json(app(MockIndexer::default()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "active", "service": "AutoPilot DeFi Backend"}));

        let (status, body) = get_json(app(MockIndexer::default()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["indexer"]["connected"], true);

        let down = MockIndexer {
            failing: vec!["ping"],
            ..Default::default()
        };
        let (status, body) = get_json(app(down), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert!(body["indexer"]["error"].as_str().unwrap().contains("ping unavailable"));
    }

    #[tokio::test]
    async fn test_calculate_rebalance_scenarios() {
        let body = json!({
            "target_allocation": {"ETH": 65},
            "rebalance_threshold": 3,
            "monthly_spending_cap": 1000,
            "slippage_limit": 1
        });
        let (status, out) = post_json(app(MockIndexer::default()), "/rebalance/calculate", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["actions"].as_array().unwrap().len(), 1);
        assert_eq!(out["actions"][0]["token_in"], "USDC");
        assert_eq!(out["actions"][0]["token_out"], "ETH");
        assert_eq!(out["estimated_gas_saved_usd"], 4.29);
        assert_eq!(out["execution_price_gwei"], 22.0);
        assert_eq!(out["status"], "Ready to Execute");

        let body = json!({
            "target_allocation": {"ETH": 56},
            "rebalance_threshold": 3,
            "monthly_spending_cap": 1000,
            "slippage_limit": 1
        });
        let (status, out) = post_json(app(MockIndexer::default()), "/rebalance/calculate", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(out["actions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calculate_rejects_negative_threshold() {
        let body = json!({
            "target_allocation": {"ETH": 60},
            "rebalance_threshold": -1,
            "monthly_spending_cap": 1000,
            "slippage_limit": 1
        });
        let (status, out) = post_json(app(MockIndexer::default()), "/rebalance/calculate", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(out["code"], "VALIDATION_ERROR");
        assert!(out["detail"].as_str().unwrap().contains("rebalance_threshold"));
    }

    #[tokio::test]
    async fn test_portfolio_snapshot() {
        let (status, body) = get_json(app(MockIndexer::default()), "/portfolio/0xABC").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["wallet"], "0xABC");
        assert_eq!(body["current_allocation"]["ETH"], 55.0);
        assert_eq!(body["target_allocation"]["ETH"], 60.0);
        assert_eq!(body["drift"], 5.0);
    }

    #[tokio::test]
    async fn test_read_endpoints_wrap_in_envelope() {
        let indexer = MockIndexer {
            events: (0..8).map(|i| event(&format!("e{}", i), 1_700_000_000 - i)).collect(),
            stats: Some(stats()),
            ..Default::default()
        };
        let app = app(indexer);

        let (status, body) = get_json(app.clone(), "/permission/0xabc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": null}));

        let (_, body) = get_json(app.clone(), "/permission-events/0xabc?limit=5").await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        // 기본 limit 10, 데이터 8건
        let (_, body) = get_json(app.clone(), "/permission-events/0xabc").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 8);

        let (_, body) = get_json(app.clone(), "/stats/0xabc").await;
        assert_eq!(body["data"]["totalRebalances"], 3);

        let (_, body) = get_json(app.clone(), "/rebalances/0xabc?limit=1000").await;
        assert_eq!(body["data"], json!([]));

        let (_, body) = get_json(app, "/daily-metrics?days=3").await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_indexer_failure_surfaces_as_bad_gateway() {
        let indexer = MockIndexer {
            failing: vec!["permission"],
            ..Default::default()
        };
        let (status, body) = get_json(app(indexer), "/permission/0xabc").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "INDEXER_ERROR");
        assert_eq!(body["detail"], "GraphQL errors: permission unavailable");
    }

    #[tokio::test]
    async fn test_dashboard_policies() {
        let degraded = MockIndexer {
            stats: Some(stats()),
            failing: vec!["permissionEvents"],
            ..Default::default()
        };
        let (status, body) = get_json(app(degraded), "/dashboard/0xabc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["permissionEvents"], json!([]));
        assert_eq!(body["data"]["stats"]["user"], "0xabc");
        assert_eq!(body["data"]["errors"][0]["field"], "permissionEvents");

        let strict_config = Config::from_lookup(|key| {
            (key == "DASHBOARD_POLICY").then(|| "strict".to_string())
        })
        .unwrap();
        let failing = MockIndexer {
            failing: vec!["permissionEvents"],
            ..Default::default()
        };
        let app = create_router(state_with(failing, strict_config));
        let (status, _) = get_json(app, "/dashboard/0xabc").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_invalid_limit_is_rejected() {
        let (status, body) = get_json(app(MockIndexer::default()), "/rebalances/0xabc?limit=many").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(!body["detail"].as_str().unwrap().is_empty());

        let (status, body) = get_json(app(MockIndexer::default()), "/daily-metrics?days=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_malformed_calculate_body_is_json_error() {
        let body = json!({"target_allocation": {"ETH": 65}});
        let (status, out) = post_json(app(MockIndexer::default()), "/rebalance/calculate", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(out["code"], "BAD_REQUEST");
        assert!(out["detail"].as_str().unwrap().contains("rebalance_threshold"));

        let request = Request::post("/rebalance/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, out) = send(app(MockIndexer::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(out["code"], "BAD_REQUEST");
    }
}
