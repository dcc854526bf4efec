//! Envio GraphQL Client
//!
//! Hasura 스타일 GraphQL 엔드포인트에 `{"query", "variables"}`를 POST한다.
//!
//! # Behavior
//! - 단일 시도, 재시도 없음. 타임아웃은 `IndexerConfig::timeout`
//! - 2xx 이외 → `IndexerError::Status`
//! - `errors` 배열 → `IndexerError::GraphQl`
//! - `data` 누락 → 레코드 없음
//! - limit/정렬은 클라이언트에서도 한 번 더 강제 (인덱서가 어겨도 계약 유지)

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    DailyMetrics, IndexerConfig, IndexerError, IndexerReader, Permission, PermissionEvent, Rebalance,
    UserStats,
};
use crate::types::WalletAddress;

const PERMISSION_QUERY: &str = r#"
query GetPermission($user: String!) {
  Permission(where: {user: {_eq: $user}, active: {_eq: true}}, limit: 1) {
    id
    user
    spendingCap
    spent
    expiry
    active
    grantedAt
    revokedAt
    timestamp
  }
}
"#;

const PERMISSION_EVENTS_QUERY: &str = r#"
query GetPermissionEvents($user: String!, $limit: Int!) {
  PermissionEvent(
    where: {user: {_eq: $user}}
    order_by: {timestamp: desc}
    limit: $limit
  ) {
    id
    user
    eventType
    amount
    remaining
    timestamp
    blockNumber
    transactionHash
  }
}
"#;

const REBALANCES_QUERY: &str = r#"
query GetRebalances($user: String!, $limit: Int!) {
  Rebalance(
    where: {user: {_eq: $user}}
    order_by: {timestamp: desc}
    limit: $limit
  ) {
    id
    user
    tokenIn
    tokenOut
    amountIn
    amountOut
    gasUsed
    timestamp
    blockNumber
    transactionHash
  }
}
"#;

const USER_STATS_QUERY: &str = r#"
query GetUserStats($user: String!) {
  UserStats(where: {user: {_eq: $user}}, limit: 1) {
    id
    user
    totalRebalances
    totalGasUsed
    totalSpent
    lastRebalance
  }
}
"#;

const DAILY_METRICS_QUERY: &str = r#"
query GetDailyMetrics($limit: Int!) {
  DailyMetrics(
    order_by: {date: desc}
    limit: $limit
  ) {
    id
    date
    totalRebalances
    totalGasUsed
    uniqueUsers
    totalVolume
  }
}
"#;

const PING_QUERY: &str = "query Ping { __typename }";

/// GraphQL 응답 envelope
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

/// Envio 인덱서 클라이언트
///
/// # Example
/// ```ignore
/// let client = IndexerClient::new(IndexerConfig::default())?;
/// let permission = client.get_permission(&WalletAddress::new("0xAbC...")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    graphql_url: String,
}

impl IndexerClient {
    pub fn new(config: IndexerConfig) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(IndexerError::Transport)?;

        Ok(Self {
            http,
            graphql_url: config.graphql_url,
        })
    }

    /// 쿼리 실행 후 `data` 객체 반환
    async fn execute(
        &self,
        operation: &'static str,
        document: &str,
        variables: Value,
    ) -> Result<Map<String, Value>, IndexerError> {
        let started = Instant::now();

        let response = self
            .http
            .post(&self.graphql_url)
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await
            .map_err(IndexerError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(operation, status = status.as_u16(), "Indexer returned non-success status");
            return Err(IndexerError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(IndexerError::Transport)?;
        let envelope: GraphQlResponse = serde_json::from_slice(&body).map_err(IndexerError::Decode)?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages = errors
                .iter()
                .map(|err| match err.get("message").and_then(Value::as_str) {
                    Some(message) => message.to_string(),
                    None => err.to_string(),
                })
                .collect();
            return Err(IndexerError::GraphQl(messages));
        }

        tracing::debug!(
            operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexer query completed"
        );

        Ok(envelope.data.unwrap_or_default())
    }

    /// `data.<root>` 배열을 타입으로 디코딩 (없거나 null이면 빈 Vec)
    async fn rows<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        document: &str,
        root: &str,
        variables: Value,
    ) -> Result<Vec<T>, IndexerError> {
        let mut data = self.execute(operation, document, variables).await?;

        match data.remove(root) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(rows) => serde_json::from_value(rows).map_err(IndexerError::Decode),
        }
    }
}

/// 최신순 정렬 후 limit 적용 (stable sort: 동일 키는 인덱서 순서 유지)
fn newest_first<T, K, F>(mut rows: Vec<T>, limit: u32, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows.truncate(limit as usize);
    rows
}

#[async_trait]
impl IndexerReader for IndexerClient {
    async fn get_permission(&self, user: &WalletAddress) -> Result<Option<Permission>, IndexerError> {
        let rows: Vec<Permission> = self
            .rows(
                "GetPermission",
                PERMISSION_QUERY,
                "Permission",
                json!({ "user": user.as_str() }),
            )
            .await?;

        Ok(rows.into_iter().find(|perm| perm.active))
    }

    async fn get_permission_events(
        &self,
        user: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<PermissionEvent>, IndexerError> {
        let rows = self
            .rows(
                "GetPermissionEvents",
                PERMISSION_EVENTS_QUERY,
                "PermissionEvent",
                json!({ "user": user.as_str(), "limit": limit }),
            )
            .await?;

        Ok(newest_first(rows, limit, |event: &PermissionEvent| event.timestamp))
    }

    async fn get_rebalances(&self, user: &WalletAddress, limit: u32) -> Result<Vec<Rebalance>, IndexerError> {
        let rows = self
            .rows(
                "GetRebalances",
                REBALANCES_QUERY,
                "Rebalance",
                json!({ "user": user.as_str(), "limit": limit }),
            )
            .await?;

        Ok(newest_first(rows, limit, |rebalance: &Rebalance| rebalance.timestamp))
    }

    async fn get_user_stats(&self, user: &WalletAddress) -> Result<Option<UserStats>, IndexerError> {
        let rows: Vec<UserStats> = self
            .rows(
                "GetUserStats",
                USER_STATS_QUERY,
                "UserStats",
                json!({ "user": user.as_str() }),
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn get_daily_metrics(&self, days: u32) -> Result<Vec<DailyMetrics>, IndexerError> {
        let rows = self
            .rows(
                "GetDailyMetrics",
                DAILY_METRICS_QUERY,
                "DailyMetrics",
                json!({ "limit": days }),
            )
            .await?;

        Ok(newest_first(rows, days, |day: &DailyMetrics| day.date))
    }

    async fn ping(&self) -> Result<(), IndexerError> {
        self.execute("Ping", PING_QUERY, json!({})).await.map(|_| ())
    }
}
