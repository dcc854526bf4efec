//! Indexer Service
//!
//! Envio 인덱서(GraphQL)에서 지갑 단위 데이터를 읽어온다.
//!
//! # Failure Contract
//!
//! 모든 조회는 `Result<T, IndexerError>`를 반환하고, 전파/흡수 여부는 호출자가 결정한다.
//! - HTTP 읽기 엔드포인트: 그대로 전파 → 502
//! - 빈 값으로 대체하고 싶은 호출자: [`OrEmpty::or_empty`] (warn 로그 후 `Default`)
//!
//! "레코드 없음"은 에러가 아니다 (`None` / 빈 Vec).

mod client;
mod models;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::DEFAULT_GRAPHQL_URL;
use crate::types::WalletAddress;

pub use client::IndexerClient;
pub use models::{DailyMetrics, Permission, PermissionEvent, PermissionEventType, Rebalance, UserStats};

/// 대시보드에 포함되는 최근 권한 이벤트 수
pub const DASHBOARD_EVENT_LIMIT: u32 = 5;
/// 대시보드에 포함되는 최근 리밸런싱 수
pub const DASHBOARD_REBALANCE_LIMIT: u32 = 10;

/// 인덱서 클라이언트 설정
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub graphql_url: String,
    /// 단일 요청 타임아웃 (재시도 없음)
    pub timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// 인덱서 조회 실패
#[derive(Debug, Error)]
pub enum IndexerError {
    /// 연결 실패, 타임아웃 등
    #[error("Indexer request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// 2xx 이외의 HTTP 상태
    #[error("Indexer returned HTTP {0}")]
    Status(u16),

    /// 응답의 `errors` 배열
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Malformed indexer response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// 인덱서 읽기 인터페이스
///
/// `IndexerClient`가 실제 구현, 테스트에서는 in-memory 구현으로 교체.
#[async_trait]
pub trait IndexerReader: Send + Sync {
    /// 활성 권한 1건 (없으면 `None`)
    async fn get_permission(&self, user: &WalletAddress) -> Result<Option<Permission>, IndexerError>;

    /// 최신순 최대 `limit`건
    async fn get_permission_events(
        &self,
        user: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<PermissionEvent>, IndexerError>;

    /// 최신순 최대 `limit`건
    async fn get_rebalances(&self, user: &WalletAddress, limit: u32) -> Result<Vec<Rebalance>, IndexerError>;

    async fn get_user_stats(&self, user: &WalletAddress) -> Result<Option<UserStats>, IndexerError>;

    /// 최근 `days`일, 최신순
    async fn get_daily_metrics(&self, days: u32) -> Result<Vec<DailyMetrics>, IndexerError>;

    /// 연결 확인용 최소 쿼리
    async fn ping(&self) -> Result<(), IndexerError>;
}

/// 조회 실패를 빈 값으로 흡수
pub trait OrEmpty<T> {
    fn or_empty(self, what: &str) -> T;
}

impl<T: Default> OrEmpty<T> for Result<T, IndexerError> {
    fn or_empty(self, what: &str) -> T {
        self.unwrap_or_else(|err| {
            tracing::warn!(query = what, error = %err, "Indexer query failed, returning empty result");
            T::default()
        })
    }
}

// ============ Dashboard ============

/// 대시보드 부분 실패 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashboardPolicy {
    /// 실패한 하위 쿼리는 빈 값 + `errors`에 기록
    #[default]
    Degrade,
    /// 하나라도 실패하면 전체 실패
    Strict,
}

impl FromStr for DashboardPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "strict" => Ok(Self::Strict),
            other => Err(anyhow::anyhow!(
                "DASHBOARD_POLICY must be 'degrade' or 'strict', got '{}'",
                other
            )),
        }
    }
}

/// 대시보드 복합 응답
///
/// 네 필드는 항상 존재한다. `errors`가 비어 있지 않으면 해당 필드는 "없음"이 아니라 "조회 실패".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub permission: Option<Permission>,
    pub permission_events: Vec<PermissionEvent>,
    pub rebalances: Vec<Rebalance>,
    pub stats: Option<UserStats>,
    pub errors: Vec<SubQueryError>,
}

/// 실패한 하위 쿼리
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubQueryError {
    pub field: &'static str,
    pub message: String,
}

/// 권한, 최근 이벤트 5건, 최근 리밸런싱 10건, 통계를 동시에 조회
///
/// 네 쿼리는 서로 의존하지 않으므로 `tokio::join!`으로 한 번에 fan-out.
pub async fn fetch_dashboard(
    reader: &dyn IndexerReader,
    user: &WalletAddress,
    policy: DashboardPolicy,
) -> Result<DashboardData, IndexerError> {
    let (permission, events, rebalances, stats) = tokio::join!(
        reader.get_permission(user),
        reader.get_permission_events(user, DASHBOARD_EVENT_LIMIT),
        reader.get_rebalances(user, DASHBOARD_REBALANCE_LIMIT),
        reader.get_user_stats(user),
    );

    if policy == DashboardPolicy::Strict {
        return Ok(DashboardData {
            permission: permission?,
            permission_events: events?,
            rebalances: rebalances?,
            stats: stats?,
            errors: Vec::new(),
        });
    }

    let mut errors = Vec::new();
    let data = DashboardData {
        permission: degrade("permission", permission, &mut errors),
        permission_events: degrade("permissionEvents", events, &mut errors),
        rebalances: degrade("rebalances", rebalances, &mut errors),
        stats: degrade("stats", stats, &mut errors),
        errors: Vec::new(),
    };

    if !errors.is_empty() {
        tracing::warn!(user = %user, failed = errors.len(), "Dashboard served with degraded fields");
    }

    Ok(DashboardData { errors, ..data })
}

fn degrade<T: Default>(
    field: &'static str,
    result: Result<T, IndexerError>,
    errors: &mut Vec<SubQueryError>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            errors.push(SubQueryError {
                field,
                message: err.to_string(),
            });
            Err::<T, _>(err).or_empty(field)
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! 테스트용 in-memory 인덱서
    use super::*;

    #[derive(Default)]
    pub struct MockIndexer {
        pub permission: Option<Permission>,
        pub events: Vec<PermissionEvent>,
        pub rebalances: Vec<Rebalance>,
        pub stats: Option<UserStats>,
        pub daily: Vec<DailyMetrics>,
        /// 이 쿼리들은 GraphQL 에러를 반환
        pub failing: Vec<&'static str>,
    }

    impl MockIndexer {
        fn check(&self, query: &'static str) -> Result<(), IndexerError> {
            if self.failing.contains(&query) {
                Err(IndexerError::GraphQl(vec![format!("{} unavailable", query)]))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl IndexerReader for MockIndexer {
        async fn get_permission(&self, _user: &WalletAddress) -> Result<Option<Permission>, IndexerError> {
            self.check("permission")?;
            Ok(self.permission.clone())
        }

        async fn get_permission_events(
            &self,
            _user: &WalletAddress,
            limit: u32,
        ) -> Result<Vec<PermissionEvent>, IndexerError> {
            self.check("permissionEvents")?;
            Ok(self.events.iter().take(limit as usize).cloned().collect())
        }

        async fn get_rebalances(&self, _user: &WalletAddress, limit: u32) -> Result<Vec<Rebalance>, IndexerError> {
            self.check("rebalances")?;
            Ok(self.rebalances.iter().take(limit as usize).cloned().collect())
        }

        async fn get_user_stats(&self, _user: &WalletAddress) -> Result<Option<UserStats>, IndexerError> {
            self.check("stats")?;
            Ok(self.stats.clone())
        }

        async fn get_daily_metrics(&self, days: u32) -> Result<Vec<DailyMetrics>, IndexerError> {
            self.check("dailyMetrics")?;
            Ok(self.daily.iter().take(days as usize).cloned().collect())
        }

        async fn ping(&self) -> Result<(), IndexerError> {
            self.check("ping")
        }
    }

    pub fn event(id: &str, timestamp: u64) -> PermissionEvent {
        PermissionEvent {
            id: id.to_string(),
            user: "0xabc".to_string(),
            event_type: PermissionEventType::Used,
            amount: Some("10".to_string()),
            remaining: Some("90".to_string()),
            timestamp,
            block_number: timestamp / 12,
            transaction_hash: format!("0x{}", id),
        }
    }

    pub fn stats() -> UserStats {
        UserStats {
            id: "0xabc".to_string(),
            user: "0xabc".to_string(),
            total_rebalances: 3,
            total_gas_used: 450_000,
            total_spent: "750".to_string(),
            last_rebalance: Some(1_700_000_000),
        }
    }
}
