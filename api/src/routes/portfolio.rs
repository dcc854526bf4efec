//! Portfolio & Rebalance Endpoints
//!
//! 현재 배분 스냅샷과 리밸런싱 계산. 실행은 하지 않는다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    routes::extract::ApiJson,
    services::{Allocation, MarketSnapshot, PortfolioConfig, PortfolioSnapshot, RebalanceOutcome},
    types::WalletAddress,
    AppState,
};

/// 리밸런싱 계산 요청
///
/// `PortfolioConfig` 필드 + 선택적 지갑 주소 (현재 배분 조회용)
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(flatten)]
    pub config: PortfolioConfig,
    #[serde(default)]
    pub wallet: Option<String>,
}

/// GET /portfolio/:wallet_address
///
/// 현재 배분 vs 기본 목표 배분 (ETH 60 / USDC 40)
///
/// # Response
///
/// ```json
/// {
///   "wallet": "0x...",
///   "current_allocation": {"ETH": 55.0, "USDC": 45.0},
///   "target_allocation": {"ETH": 60.0, "USDC": 40.0},
///   "drift": 5.0,
///   "estimated_gas_saved": 4.29
/// }
/// ```
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<PortfolioSnapshot>, ApiError> {
    let wallet = WalletAddress::new(&wallet_address);
    let (current, market) = load_inputs(&state, &wallet).await?;

    // 응답에는 요청 받은 주소 그대로, 조회에만 정규화 주소 사용
    Ok(Json(state.engine.snapshot(&wallet_address, current, &market)))
}

/// POST /rebalance/calculate
///
/// # Flow
///
/// 1. 설정 검증 (음수/NaN 거부)
/// 2. 현재 배분 + 시장 스냅샷 조회
/// 3. drift → 액션, 가스 절감 추정
pub async fn calculate_rebalance(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CalculateRequest>,
) -> Result<Json<RebalanceOutcome>, ApiError> {
    req.config.validate().map_err(ApiError::ValidationError)?;

    let wallet = WalletAddress::new(req.wallet.as_deref().unwrap_or_default());
    let (current, market) = load_inputs(&state, &wallet).await?;

    Ok(Json(state.engine.evaluate(&req.config, &current, &market)))
}

/// 엔진 입력 조회. 공급자 실패는 503
async fn load_inputs(
    state: &AppState,
    wallet: &WalletAddress,
) -> Result<(Allocation, MarketSnapshot), ApiError> {
    let current = state.allocations.current_allocation(wallet).await.map_err(|err| {
        tracing::warn!(error = ?err, "Allocation source failed");
        ApiError::ServiceUnavailable("Allocation source".to_string())
    })?;

    let market = state.market.snapshot().await.map_err(|err| {
        tracing::warn!(error = ?err, "Market oracle failed");
        ApiError::ServiceUnavailable("Market oracle".to_string())
    })?;

    Ok((current, market))
}
