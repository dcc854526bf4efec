//! AutoPilot DeFi API Library
//!
//! # Overview
//!
//! 지갑 단위 DeFi 포트폴리오 데이터와 리밸런싱 제안을 HTTP로 제공하는 백엔드.
//! 데이터는 Envio 인덱서(GraphQL)가 소유하고, 이 서비스는 읽기만 한다.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌──────────────────────────┐  ┌─────────┐ │
//! │  │ Routes  │  │        Services          │  │  Types  │ │
//! │  │         │──│ IndexerClient            │  │         │ │
//! │  │         │  │ RebalanceEngine          │  │         │ │
//! │  │         │  │ MarketOracle/Allocation  │  │         │ │
//! │  └─────────┘  └────────────┬─────────────┘  └─────────┘ │
//! └────────────────────────────┼─────────────────────────────┘
//!                              │ GraphQL (POST, 10s timeout)
//!                              ▼
//!                     ┌────────────────┐
//!                     │  Envio Indexer │
//!                     └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 인덱서 클라이언트, 리밸런싱 엔진
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use autopilot_api::{routes, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(config)?;
//!     let app = routes::create_router(state);
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use anyhow::Context;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use services::{IndexerClient, RebalanceEngine};

use services::{AllocationSource, FixedMarketOracle, IndexerReader, MarketOracle, StaticAllocation};

/// 애플리케이션 전역 상태
///
/// 모든 필드는 불변이고 요청 간 공유만 한다.
#[derive(Clone)]
pub struct AppState {
    pub indexer: Arc<dyn IndexerReader>,
    pub engine: Arc<RebalanceEngine>,
    pub market: Arc<dyn MarketOracle>,
    pub allocations: Arc<dyn AllocationSource>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 기본 구현으로 상태 구성 (Envio 클라이언트 + 고정 시장 데이터)
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let indexer = IndexerClient::new(config.indexer())
            .context("Failed to build indexer HTTP client")?;

        Ok(Self {
            indexer: Arc::new(indexer),
            engine: Arc::new(RebalanceEngine::default()),
            market: Arc::new(FixedMarketOracle::default()),
            allocations: Arc::new(StaticAllocation::default()),
            config: Arc::new(config),
        })
    }
}
