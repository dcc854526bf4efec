//! Rebalance Decision Engine
//!
//! 목표 비중 대비 drift를 계산하고, 임계값을 넘으면 스왑 액션을 제안한다.
//! 실행은 하지 않는다 (서명/전송은 클라이언트 몫).
//!
//! # Algorithm
//!
//! ```text
//! drift = target(primary) - current(primary)
//! |drift| >= threshold  →  액션 1건 (overweight → underweight)
//! |drift| <  threshold  →  액션 없음
//!
//! gas_saved_usd = (avg_gwei - current_gwei) * 1e-9 * gas_units * asset_price
//! ```
//!
//! 액션 결정은 primary 토큰 하나만 본다. 토큰별 drift는 `drifts`로 별도 보고.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::market::{Allocation, MarketSnapshot};

/// 계산 성공 시 상태 라벨
pub const STATUS_READY: &str = "Ready to Execute";

/// 사용자 포트폴리오 설정 (요청마다 생성, 저장하지 않음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// 토큰 → 목표 비중(%). 합이 100일 필요는 없음
    pub target_allocation: BTreeMap<String, f64>,
    /// 리밸런싱 트리거 (%p)
    pub rebalance_threshold: f64,
    /// 월 지출 한도 (USD)
    pub monthly_spending_cap: f64,
    /// 최대 허용 슬리피지 (%)
    pub slippage_limit: f64,
}

impl PortfolioConfig {
    /// 음수/NaN 입력 거부. 0은 유효
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("rebalance_threshold", self.rebalance_threshold),
            ("monthly_spending_cap", self.monthly_spending_cap),
            ("slippage_limit", self.slippage_limit),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }

        if let Some((token, _)) = self
            .target_allocation
            .iter()
            .find(|(_, pct)| !pct.is_finite() || **pct < 0.0)
        {
            return Err(format!("target allocation for {} must be a non-negative number", token));
        }

        Ok(())
    }
}

/// 제안된 스왑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceAction {
    pub token_in: String,
    pub token_out: String,
    pub amount: f64,
    pub reason: String,
}

/// 토큰별 drift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenDrift {
    pub token: String,
    pub current: f64,
    pub target: f64,
    pub drift: f64,
    pub exceeds_threshold: bool,
}

/// `POST /rebalance/calculate` 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalanceOutcome {
    pub actions: Vec<RebalanceAction>,
    pub estimated_gas_saved_usd: f64,
    pub execution_price_gwei: f64,
    pub status: String,
    pub drifts: Vec<TokenDrift>,
}

/// `GET /portfolio/:wallet` 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub wallet: String,
    pub current_allocation: Allocation,
    pub target_allocation: Allocation,
    pub drift: f64,
    pub estimated_gas_saved: f64,
}

/// 엔진 파라미터
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// drift를 추적하는 변동성 자산
    pub primary_token: String,
    /// 반대편 스테이블
    pub quote_token: String,
    /// 설정에 primary 목표가 없을 때
    pub default_primary_target: f64,
    /// 액션 금액 (USD). drift 비례 사이징 전까지 고정값
    pub reference_amount: f64,
    /// 스왑 1회 가스 사용량
    pub swap_gas_units: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            primary_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            default_primary_target: 60.0,
            reference_amount: 250.0,
            swap_gas_units: 150_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RebalanceEngine {
    settings: EngineSettings,
}

impl RebalanceEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// 목표 비중. primary 누락 → 기본값,
    /// quote 누락 + primary 외 목표 없음 → 100 - target(primary), 그 외 누락 → 0
    fn target_for(&self, targets: &BTreeMap<String, f64>, token: &str) -> f64 {
        let primary = self.settings.primary_token.as_str();
        match targets.get(token) {
            Some(pct) => *pct,
            None if token == primary => self.settings.default_primary_target,
            None if token == self.settings.quote_token && targets.keys().all(|t| t == primary) => {
                100.0 - self.target_for(targets, primary)
            }
            None => 0.0,
        }
    }

    /// target(primary) - current(primary)
    pub fn primary_drift(&self, targets: &BTreeMap<String, f64>, current: &Allocation) -> f64 {
        let primary = self.settings.primary_token.as_str();
        let current_pct = current.get(primary).copied().unwrap_or(0.0);
        self.target_for(targets, primary) - current_pct
    }

    /// |drift| >= threshold 이면 정확히 1건
    pub fn plan_actions(&self, config: &PortfolioConfig, current: &Allocation) -> Vec<RebalanceAction> {
        let drift = self.primary_drift(&config.target_allocation, current);
        let threshold = config.rebalance_threshold;

        if drift.abs() < threshold {
            return Vec::new();
        }

        let primary = &self.settings.primary_token;
        let quote = &self.settings.quote_token;
        // drift > 0: primary 부족 → quote를 팔아 primary 매수
        let (token_in, token_out) = if drift >= 0.0 {
            (quote.clone(), primary.clone())
        } else {
            (primary.clone(), quote.clone())
        };

        vec![RebalanceAction {
            token_in,
            token_out,
            amount: self.settings.reference_amount,
            reason: format!("Drift {:.2}% >= Threshold {:.2}%", drift, threshold),
        }]
    }

    /// 두 배분에 등장하는 모든 토큰의 drift (심볼 순)
    pub fn drift_report(&self, config: &PortfolioConfig, current: &Allocation) -> Vec<TokenDrift> {
        let mut tokens: BTreeSet<&str> = config
            .target_allocation
            .keys()
            .chain(current.keys())
            .map(String::as_str)
            .collect();
        tokens.insert(self.settings.primary_token.as_str());

        tokens
            .into_iter()
            .map(|token| {
                let target = self.target_for(&config.target_allocation, token);
                let current_pct = current.get(token).copied().unwrap_or(0.0);
                let drift = target - current_pct;
                TokenDrift {
                    token: token.to_string(),
                    current: current_pct,
                    target,
                    drift,
                    exceeds_threshold: drift.abs() >= config.rebalance_threshold,
                }
            })
            .collect()
    }

    pub fn gas_savings_usd(&self, market: &MarketSnapshot) -> f64 {
        estimate_gas_savings_usd(
            market.average_gas_gwei,
            market.current_gas_gwei,
            self.settings.swap_gas_units,
            market.asset_price_usd,
        )
    }

    pub fn evaluate(
        &self,
        config: &PortfolioConfig,
        current: &Allocation,
        market: &MarketSnapshot,
    ) -> RebalanceOutcome {
        let actions = self.plan_actions(config, current);

        tracing::info!(
            drift = self.primary_drift(&config.target_allocation, current),
            threshold = config.rebalance_threshold,
            actions = actions.len(),
            "Rebalance evaluated"
        );

        RebalanceOutcome {
            actions,
            estimated_gas_saved_usd: self.gas_savings_usd(market),
            execution_price_gwei: market.current_gas_gwei,
            status: STATUS_READY.to_string(),
            drifts: self.drift_report(config, current),
        }
    }

    /// 기본 목표 (primary 60 / quote 40) 기준 스냅샷
    pub fn snapshot(&self, wallet: &str, current: Allocation, market: &MarketSnapshot) -> PortfolioSnapshot {
        let target_allocation = self.default_targets();
        let drift = round2(self.primary_drift(&target_allocation, &current));

        PortfolioSnapshot {
            wallet: wallet.to_string(),
            current_allocation: current,
            target_allocation,
            drift,
            estimated_gas_saved: self.gas_savings_usd(market),
        }
    }

    fn default_targets(&self) -> Allocation {
        let primary = self.settings.default_primary_target;
        Allocation::from([
            (self.settings.primary_token.clone(), primary),
            (self.settings.quote_token.clone(), 100.0 - primary),
        ])
    }
}

/// 저가스 구간 실행으로 절약한 비용 (USD, 소수 둘째 자리)
pub fn estimate_gas_savings_usd(
    average_gas_gwei: f64,
    current_gas_gwei: f64,
    gas_units: u64,
    asset_price_usd: f64,
) -> f64 {
    let savings_asset = (average_gas_gwei - current_gas_gwei) * 1e-9 * gas_units as f64;
    round2(savings_asset * asset_price_usd)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
