//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `IndexerClient`: Envio 인덱서 GraphQL 조회
//! - `RebalanceEngine`: drift 계산 및 리밸런싱 제안
//! - `MarketOracle` / `AllocationSource`: 엔진 입력 (가스, 가격, 현재 배분)

pub mod indexer;
mod market;
mod rebalancer;

pub use indexer::{
    fetch_dashboard, DashboardData, DashboardPolicy, IndexerClient, IndexerConfig, IndexerError,
    IndexerReader, OrEmpty,
};
pub use market::{Allocation, AllocationSource, FixedMarketOracle, MarketOracle, MarketSnapshot, StaticAllocation};
pub use rebalancer::{
    estimate_gas_savings_usd, EngineSettings, PortfolioConfig, PortfolioSnapshot, RebalanceAction,
    RebalanceEngine, RebalanceOutcome, TokenDrift, STATUS_READY,
};
