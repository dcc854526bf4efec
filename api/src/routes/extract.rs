//! Request Extractors
//!
//! axum 기본 `Json`/`Query`는 파싱 실패 시 text/plain 본문을 돌려준다.
//! 이 래퍼들은 rejection을 `ApiError::BadRequest`로 바꿔 `{"detail","code"}` 형식을 유지한다.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON 본문
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// 쿼리 스트링
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
