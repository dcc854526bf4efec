//! Wallet Data Endpoints
//!
//! 인덱서 데이터를 `{"success": true, "data": ...}`로 감싸서 반환한다.
//! 인덱서 실패는 502 + `{"detail": ...}` (빈 데이터로 숨기지 않음).
//! 대시보드만 예외: `DashboardPolicy`에 따라 부분 실패를 흡수할 수 있다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    routes::extract::ApiQuery,
    services::{
        fetch_dashboard,
        indexer::{DailyMetrics, Permission, PermissionEvent, Rebalance, UserStats},
        DashboardData,
    },
    types::{ApiResponse, WalletAddress},
    AppState,
};

/// limit 상한
pub const MAX_LIMIT: u32 = 100;

const DEFAULT_EVENT_LIMIT: u32 = 10;
const DEFAULT_REBALANCE_LIMIT: u32 = 20;
const DEFAULT_METRIC_DAYS: u32 = 7;

/// `?limit=` 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// `?days=` 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

fn capped(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).min(MAX_LIMIT)
}

/// GET /permission/:wallet_address
pub async fn get_permission(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<Option<Permission>>>, ApiError> {
    let user = WalletAddress::new(&wallet_address);
    let permission = state.indexer.get_permission(&user).await?;
    Ok(Json(ApiResponse::success(permission)))
}

/// GET /permission-events/:wallet_address?limit=
pub async fn get_permission_events(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<PermissionEvent>>>, ApiError> {
    let user = WalletAddress::new(&wallet_address);
    let limit = capped(query.limit, DEFAULT_EVENT_LIMIT);

    let events = state.indexer.get_permission_events(&user, limit).await?;
    Ok(Json(ApiResponse::success(events)))
}

/// GET /rebalances/:wallet_address?limit=
pub async fn get_rebalances(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Rebalance>>>, ApiError> {
    let user = WalletAddress::new(&wallet_address);
    let limit = capped(query.limit, DEFAULT_REBALANCE_LIMIT);

    let rebalances = state.indexer.get_rebalances(&user, limit).await?;
    Ok(Json(ApiResponse::success(rebalances)))
}

/// GET /stats/:wallet_address
pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<Option<UserStats>>>, ApiError> {
    let user = WalletAddress::new(&wallet_address);
    let stats = state.indexer.get_user_stats(&user).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /daily-metrics?days=
pub async fn get_daily_metrics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DaysQuery>,
) -> Result<Json<ApiResponse<Vec<DailyMetrics>>>, ApiError> {
    let days = capped(query.days, DEFAULT_METRIC_DAYS);
    let metrics = state.indexer.get_daily_metrics(days).await?;
    Ok(Json(ApiResponse::success(metrics)))
}

/// GET /dashboard/:wallet_address
///
/// 권한 + 최근 이벤트 5건 + 최근 리밸런싱 10건 + 통계
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let user = WalletAddress::new(&wallet_address);
    let data = fetch_dashboard(state.indexer.as_ref(), &user, state.config.dashboard_policy).await?;
    Ok(Json(ApiResponse::success(data)))
}
