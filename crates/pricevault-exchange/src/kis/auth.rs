//! KIS 접근 토큰 관리.
//!
//! `/oauth2/tokenP`로 토큰을 발급받아 프로세스 안에서 재사용합니다.
//! KIS는 발급 요청을 1분에 1회로 제한하므로 동시에 여러 요청이 만료를
//! 감지해도 실제 발급은 한 번만 일어나도록 잠금을 잡은 채 재확인합니다.

use super::config::KisConfig;
use crate::ExchangeError;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 만료까지 이 시간보다 적게 남으면 새로 발급.
const RENEW_MARGIN_MINUTES: i64 = 60;

/// 외부에서 받은 토큰은 만료 시각을 알 수 없어 발급 직후로 간주 (KIS 토큰 수명 24시간).
const PRESET_LIFETIME_HOURS: i64 = 24;

/// 발급 한도 초과 (1분 1회).
const ISSUE_THROTTLED_CODE: &str = "EGW00133";

#[derive(Serialize)]
struct IssueRequest<'a> {
    grant_type: &'static str,
    appkey: &'a str,
    appsecret: &'a str,
}

#[derive(Deserialize)]
struct IssueResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    /// "YYYY-MM-DD HH:MM:SS" (KST)
    #[serde(default)]
    access_token_token_expired: String,
}

#[derive(Deserialize)]
struct IssueFailure {
    error_code: String,
    error_description: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// 발급받은 접근 토큰.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// `now` 기준으로 갱신 여유 시간 안에 만료되는지.
    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::minutes(RENEW_MARGIN_MINUTES)
    }

    /// `authorization` 헤더 값.
    pub fn bearer(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

/// KIS 인증 관리자.
///
/// 토큰 캐시와 발급 호출을 한 잠금으로 묶어 중복 발급을 막습니다.
pub struct KisOAuth {
    config: KisConfig,
    http: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl KisOAuth {
    /// 인증 관리자 생성.
    ///
    /// `config.access_token`이 있으면 그 토큰으로 시작하고 발급 요청을 하지 않습니다.
    pub fn new(config: KisConfig) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        let cached = config.access_token.as_ref().map(|value| AccessToken {
            value: value.clone(),
            token_type: default_token_type(),
            expires_at: Utc::now() + Duration::hours(PRESET_LIFETIME_HOURS),
        });

        Ok(Self {
            config,
            http,
            cached: Mutex::new(cached),
        })
    }

    pub fn config(&self) -> &KisConfig {
        &self.config
    }

    /// 유효한 토큰 반환. 없거나 만료가 가까우면 발급합니다.
    pub async fn get_token(&self) -> Result<AccessToken, ExchangeError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        match cached.as_ref() {
            Some(token) if !token.needs_renewal(now) => return Ok(token.clone()),
            Some(token) => warn!(expires_at = %token.expires_at, "KIS 토큰 만료 임박, 재발급"),
            None => debug!("캐시된 KIS 토큰 없음, 발급 요청"),
        }

        let fresh = self.issue().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    async fn issue(&self) -> Result<AccessToken, ExchangeError> {
        let KisConfig {
            app_key,
            app_secret,
            ..
        } = &self.config;
        if app_key.is_empty() || app_secret.is_empty() {
            return Err(ExchangeError::Unauthorized(
                "KIS 앱키/앱시크릿이 설정되지 않았습니다".to_string(),
            ));
        }

        let response = self
            .http
            .post(format!("{}/oauth2/tokenP", self.config.rest_base_url()))
            .json(&IssueRequest {
                grant_type: "client_credentials",
                appkey: app_key,
                appsecret: app_secret,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "KIS 토큰 발급 실패");
            return Err(classify_issue_failure(status.as_u16(), &body));
        }

        let issued: IssueResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("토큰 응답 파싱 실패: {}", e)))?;

        let expires_at = parse_kst(&issued.access_token_token_expired)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(issued.expires_in));

        info!(expires_at = %expires_at, "KIS 접근 토큰 발급");

        Ok(AccessToken {
            value: issued.access_token,
            token_type: issued.token_type,
            expires_at,
        })
    }

    /// 시세 조회 요청 공통 헤더.
    pub async fn build_headers(&self, tr_id: &str) -> Result<HeaderMap, ExchangeError> {
        let token = self.get_token().await?;

        let entries = [
            ("content-type", "application/json; charset=utf-8".to_string()),
            ("authorization", token.bearer()),
            ("appkey", self.config.app_key.clone()),
            ("appsecret", self.config.app_secret.clone()),
            ("tr_id", tr_id.to_string()),
            ("custtype", "P".to_string()),
        ];

        let mut headers = HeaderMap::with_capacity(entries.len());
        for (name, value) in entries {
            let value = HeaderValue::from_str(&value).map_err(|_| {
                ExchangeError::InvalidRequest(format!("{} 헤더 값에 허용되지 않는 문자", name))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

fn classify_issue_failure(status: u16, body: &str) -> ExchangeError {
    match serde_json::from_str::<IssueFailure>(body) {
        Ok(failure) if failure.error_code == ISSUE_THROTTLED_CODE => {
            ExchangeError::RateLimited(failure.error_description)
        }
        Ok(failure) => ExchangeError::Unauthorized(format!(
            "{} ({})",
            failure.error_description, failure.error_code
        )),
        Err(_) => ExchangeError::from_http_status(status, body),
    }
}

/// KST "YYYY-MM-DD HH:MM:SS" 문자열을 UTC로 변환.
fn parse_kst(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    Seoul
        .from_local_datetime(&naive)
        .single()
        .map(|kst| kst.with_timezone(&Utc))
}
