//! KIS 접속 설정.
//!
//! 앱키/앱시크릿은 환경 변수에서만 읽고 설정 파일에는 두지 않습니다.

use crate::ExchangeError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KisEnvironment {
    /// 실전투자
    #[default]
    Real,
    /// 모의투자
    Paper,
}

impl KisEnvironment {
    /// 환경별 REST 호스트.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }

    /// 인증 정보 환경 변수 접두사.
    fn env_prefix(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "KIS",
            KisEnvironment::Paper => "KIS_MOCK",
        }
    }
}

impl FromStr for KisEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "real" | "prod" => Ok(KisEnvironment::Real),
            "paper" | "mock" | "test" => Ok(KisEnvironment::Paper),
            _ => Err(format!("Unknown KIS environment: {}", s)),
        }
    }
}

/// KIS API 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KisConfig {
    /// 앱키
    pub app_key: String,
    /// 앱시크릿
    pub app_secret: String,
    /// 환경 (실전/모의)
    pub environment: KisEnvironment,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 미리 발급받은 접근 토큰 (있으면 토큰 발급 생략)
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    /// 기본 URL 재정의 (프록시/테스트 서버용)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(app_key: String, app_secret: String, environment: KisEnvironment) -> Self {
        Self {
            app_key,
            app_secret,
            environment,
            timeout_secs: 30,
            access_token: None,
            base_url: None,
        }
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 기본 URL 재정의.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// 미리 발급받은 접근 토큰 설정.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// 환경 변수에서 설정 생성.
    ///
    /// # 환경 변수
    /// - Real: KIS_APP_KEY, KIS_APP_SECRET
    /// - Paper: KIS_MOCK_APP_KEY, KIS_MOCK_APP_SECRET
    /// - 공통: KIS_ACCESS_TOKEN (선택)
    ///
    /// # Errors
    /// 앱키/시크릿이 설정되지 않았으면 `ExchangeError::Unauthorized`.
    pub fn from_env(environment: KisEnvironment) -> Result<Self, ExchangeError> {
        let prefix = environment.env_prefix();
        let app_key = read_env(&format!("{}_APP_KEY", prefix))?;
        let app_secret = read_env(&format!("{}_APP_SECRET", prefix))?;

        let mut config = Self::new(app_key, app_secret, environment);
        config.access_token = std::env::var("KIS_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Ok(config)
    }

    /// 실제 요청에 쓰는 호스트 (재정의가 있으면 그것).
    pub fn rest_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_base_url())
    }
}

fn read_env(key: &str) -> Result<String, ExchangeError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ExchangeError::Unauthorized(format!("{} 환경변수가 설정되지 않았습니다", key)))
}
