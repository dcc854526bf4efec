//! Configuration Module
//!
//! 환경변수 기반 설정 (12-Factor).
//! 모든 값은 앱 시작 시점에 한 번 읽고 검증한다 (fail-fast).
//! 런타임에 전역 상태로 다시 읽지 않고, `Config`를 생성자에 명시적으로 전달한다.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::services::{DashboardPolicy, IndexerConfig};

/// Envio GraphQL 기본 엔드포인트
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8080/v1/graphql";

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 8000)
    pub port: u16,

    /// Envio 인덱서 GraphQL URL
    pub graphql_url: String,

    /// 인덱서 요청 타임아웃 (기본값: 10초)
    pub indexer_timeout: Duration,

    /// 대시보드 부분 실패 처리 정책
    pub dashboard_policy: DashboardPolicy,

    /// CORS 허용 origin 목록 (비어 있으면 전체 허용)
    pub allowed_origins: Vec<String>,

    /// 환경 (development, staging, production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Optional Environment Variables
    ///
    /// - `PORT`: 서버 포트 (기본값: 8000)
    /// - `ENVIO_GRAPHQL_URL`: 인덱서 GraphQL URL
    /// - `INDEXER_TIMEOUT_SECS`: 인덱서 타임아웃 (기본값: 10)
    /// - `DASHBOARD_POLICY`: degrade | strict
    /// - `ALLOWED_ORIGINS`: 콤마로 구분된 CORS origin 목록
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 key lookup 함수로 설정 구성
    ///
    /// 테스트에서 프로세스 환경변수를 건드리지 않기 위해 분리.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let port = lookup("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let timeout_secs: u64 = lookup("INDEXER_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("INDEXER_TIMEOUT_SECS must be a valid number")?;
        if timeout_secs == 0 {
            bail!("INDEXER_TIMEOUT_SECS must be greater than zero");
        }

        let dashboard_policy = match lookup("DASHBOARD_POLICY") {
            Some(raw) => raw.parse()?,
            None => DashboardPolicy::default(),
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            port,
            graphql_url: lookup("ENVIO_GRAPHQL_URL")
                .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string()),
            indexer_timeout: Duration::from_secs(timeout_secs),
            dashboard_policy,
            allowed_origins,
            environment,
        })
    }

    /// 인덱서 클라이언트 설정
    pub fn indexer(&self) -> IndexerConfig {
        IndexerConfig {
            graphql_url: self.graphql_url.clone(),
            timeout: self.indexer_timeout,
        }
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
