//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// API 응답 래퍼
///
/// 읽기 엔드포인트는 모두 `{"success": true, "data": ...}` 형태로 응답한다.
/// 실패는 `ApiError`가 별도 본문으로 처리.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 지갑 주소 (정규화됨)
///
/// 인덱서는 주소를 lowercase로 저장하므로 조회 전에 trim + lowercase.
/// 형식 검증은 하지 않는다: 매칭되지 않는 주소는 "레코드 없음"으로 끝난다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(addr: &str) -> Self {
        Self(addr.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============ BigInt 컬럼 디코딩 ============
//
// Hasura는 numeric/bigint 컬럼을 문자열 또는 숫자로 내려준다.
// 카운터/타임스탬프는 u64로, 토큰 금액은 10진 문자열로 유지 (wei 단위는 u64 범위 초과).

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => n
                .as_u64()
                .ok_or_else(|| E::custom(format!("expected unsigned integer, got {}", n))),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected unsigned integer, got {:?}", s))),
        }
    }

    fn into_decimal_string(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s.trim().to_string(),
        }
    }
}

/// `"123"` 또는 `123` → u64
pub fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_u64()
}

/// nullable 버전. `#[serde(default)]`와 함께 사용
pub fn opt_u64_from_any<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_u64)
        .transpose()
}

/// 금액 컬럼 → 10진 문자열
pub fn amount_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrString::deserialize(deserializer)?.into_decimal_string())
}

/// nullable 금액 컬럼
pub fn opt_amount_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_decimal_string))
}
