//! Indexer Models
//!
//! Envio 인덱서가 소유하는 읽기 전용 엔티티.
//! 이 서비스는 절대 쓰지 않으며, eventually-consistent 스냅샷으로 취급한다.
//!
//! 필드 이름은 인덱서 스키마와 동일한 camelCase (프론트엔드도 그대로 사용).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{amount_from_any, opt_amount_from_any, opt_u64_from_any, u64_from_any};

/// 위임된 지출 권한
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    /// 소유자 주소
    pub user: String,
    /// 지출 한도 (토큰 최소 단위)
    #[serde(deserialize_with = "amount_from_any")]
    pub spending_cap: String,
    #[serde(deserialize_with = "amount_from_any")]
    pub spent: String,
    /// 만료 시각 (unix seconds)
    #[serde(deserialize_with = "u64_from_any")]
    pub expiry: u64,
    pub active: bool,
    #[serde(deserialize_with = "u64_from_any")]
    pub granted_at: u64,
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    pub revoked_at: Option<u64>,
    #[serde(deserialize_with = "u64_from_any")]
    pub timestamp: u64,
}

/// 권한 라이프사이클 이벤트 (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEvent {
    pub id: String,
    pub user: String,
    pub event_type: PermissionEventType,
    /// USED 이벤트에만 존재
    #[serde(default, deserialize_with = "opt_amount_from_any")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "opt_amount_from_any")]
    pub remaining: Option<String>,
    #[serde(deserialize_with = "u64_from_any")]
    pub timestamp: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub block_number: u64,
    pub transaction_hash: String,
}

/// 이벤트 타입
///
/// 인덱서가 새로운 타입을 추가해도 깨지지 않도록 `Other`로 원문 보존.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionEventType {
    Granted,
    Revoked,
    Used,
    Other(String),
}

impl From<String> for PermissionEventType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "GRANTED" => Self::Granted,
            "REVOKED" => Self::Revoked,
            "USED" => Self::Used,
            _ => Self::Other(raw),
        }
    }
}

impl From<PermissionEventType> for String {
    fn from(kind: PermissionEventType) -> Self {
        match kind {
            PermissionEventType::Granted => "GRANTED".to_string(),
            PermissionEventType::Revoked => "REVOKED".to_string(),
            PermissionEventType::Used => "USED".to_string(),
            PermissionEventType::Other(raw) => raw,
        }
    }
}

/// 실행된 리밸런싱 스왑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rebalance {
    pub id: String,
    pub user: String,
    pub token_in: String,
    pub token_out: String,
    #[serde(deserialize_with = "amount_from_any")]
    pub amount_in: String,
    #[serde(deserialize_with = "amount_from_any")]
    pub amount_out: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub gas_used: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub timestamp: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub block_number: u64,
    pub transaction_hash: String,
}

/// 지갑별 누적 통계 (지갑당 1건)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub id: String,
    pub user: String,
    #[serde(deserialize_with = "u64_from_any")]
    pub total_rebalances: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub total_gas_used: u64,
    #[serde(deserialize_with = "amount_from_any")]
    pub total_spent: String,
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    pub last_rebalance: Option<u64>,
}

/// 일별 집계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub id: String,
    /// UTC 날짜 (YYYY-MM-DD)
    pub date: NaiveDate,
    #[serde(deserialize_with = "u64_from_any")]
    pub total_rebalances: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub total_gas_used: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub unique_users: u64,
    #[serde(deserialize_with = "amount_from_any")]
    pub total_volume: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_permission() {
        // Hasura 응답 형식: numeric 컬럼은 문자열
        let json = r#"{
            "id": "0xabc-1700000000",
            "user": "0xabc",
            "spendingCap": "1000000000",
            "spent": "250000000",
            "expiry": "1702592000",
            "active": true,
            "grantedAt": "1700000000",
            "timestamp": "1700000000"
        }"#;

        let perm: Permission = serde_json::from_str(json).unwrap();
        assert_eq!(perm.spending_cap, "1000000000");
        assert_eq!(perm.expiry, 1_702_592_000);
        assert_eq!(perm.revoked_at, None);
        assert!(perm.active);
    }

    #[test]
    fn test_event_type_round_trips_unknown_values() {
        let json = r#"{
            "id": "0xdead-0",
            "user": "0xabc",
            "eventType": "EXTENDED",
            "amount": null,
            "remaining": null,
            "timestamp": 1700000100,
            "blockNumber": 19000001,
            "transactionHash": "0xdead"
        }"#;

        let event: PermissionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, PermissionEventType::Other("EXTENDED".into()));

        let out = serde_json::to_value(&event).unwrap();
        assert_eq!(out["eventType"], "EXTENDED");
        assert_eq!(out["blockNumber"], 19_000_001);
    }

    #[test]
    fn test_daily_metrics_date() {
        let json = r#"{
            "id": "2024-01-15",
            "date": "2024-01-15",
            "totalRebalances": 4,
            "totalGasUsed": "600000",
            "uniqueUsers": 2,
            "totalVolume": "1000"
        }"#;

        let day: DailyMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(day.total_gas_used, 600_000);

        let out = serde_json::to_value(&day).unwrap();
        assert_eq!(out["date"], "2024-01-15");
    }
}
