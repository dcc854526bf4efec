//! Market Data Providers
//!
//! 리밸런싱 엔진의 외부 입력 (가스 가격, 자산 가격, 현재 자산 배분).
//!
//! # Implementation Options
//!
//! 1. Fixed (현재): 고정 기준값 반환
//! 2. RPC: `eth_gasPrice` + 최근 블록 base fee 평균
//! 3. External API: Chainlink, CoinGecko 등
//!
//! 엔진은 trait만 보므로 구현 교체 시 엔진 코드 변경 없음.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::types::WalletAddress;

/// 토큰 심볼 → 비중(%)
pub type Allocation = BTreeMap<String, f64>;

/// 가스/가격 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketSnapshot {
    /// 사용자가 수동 실행 시 평균적으로 지불했을 가스 가격
    pub average_gas_gwei: f64,
    /// 실제 실행에 사용할 현재 가스 가격
    pub current_gas_gwei: f64,
    /// 가스 자산(ETH)의 USD 가격
    pub asset_price_usd: f64,
}

#[async_trait]
pub trait MarketOracle: Send + Sync {
    async fn snapshot(&self) -> Result<MarketSnapshot>;
}

/// 고정값 오라클
#[derive(Debug, Clone)]
pub struct FixedMarketOracle {
    snapshot: MarketSnapshot,
}

impl FixedMarketOracle {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for FixedMarketOracle {
    fn default() -> Self {
        Self::new(MarketSnapshot {
            average_gas_gwei: 35.0,
            current_gas_gwei: 22.0,
            asset_price_usd: 2200.0,
        })
    }
}

#[async_trait]
impl MarketOracle for FixedMarketOracle {
    async fn snapshot(&self) -> Result<MarketSnapshot> {
        Ok(self.snapshot)
    }
}

/// 지갑의 현재 자산 배분 조회
#[async_trait]
pub trait AllocationSource: Send + Sync {
    async fn current_allocation(&self, wallet: &WalletAddress) -> Result<Allocation>;
}

/// 모든 지갑에 같은 배분을 돌려주는 구현
///
/// 인덱서에 잔고 엔티티가 생기면 인덱서 기반 구현으로 교체.
#[derive(Debug, Clone)]
pub struct StaticAllocation {
    allocation: Allocation,
}

impl StaticAllocation {
    pub fn new(allocation: Allocation) -> Self {
        Self { allocation }
    }
}

impl Default for StaticAllocation {
    fn default() -> Self {
        Self::new(Allocation::from([
            ("ETH".to_string(), 55.0),
            ("USDC".to_string(), 45.0),
        ]))
    }
}

#[async_trait]
impl AllocationSource for StaticAllocation {
    async fn current_allocation(&self, wallet: &WalletAddress) -> Result<Allocation> {
        tracing::debug!(wallet = %wallet, "Using static allocation");
        Ok(self.allocation.clone())
    }
}
