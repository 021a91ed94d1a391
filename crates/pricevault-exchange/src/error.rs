//! 커넥터 에러 타입.

use pricevault_core::ProviderError;
use thiserror::Error;

/// KIS 초당 거래건수 초과 메시지 코드.
pub const KIS_RATE_LIMIT_CODE: &str = "EGW00201";

/// 요청 한도 초과로 판단하는 응답 문구.
const RATE_LIMIT_MARKERS: [&str; 3] = ["RATE LIMIT EXCEEDED", "TOO_MANY_REQUESTS", "초당 거래건수"];

/// 거래소 연결 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 요청 파라미터
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl ExchangeError {
    /// HTTP 실패 응답을 분류합니다.
    ///
    /// 429, 503 및 한도 초과 문구가 포함된 응답은 `RateLimited`,
    /// 401/403은 `Unauthorized`, 나머지는 `ApiError`.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        if status == 429 || status == 503 || is_rate_limit_message(body) {
            return ExchangeError::RateLimited(format!("HTTP {}: {}", status, body));
        }
        match status {
            401 | 403 => ExchangeError::Unauthorized(body.to_string()),
            _ => ExchangeError::ApiError {
                code: status.to_string(),
                message: body.to_string(),
            },
        }
    }

    /// KIS 응답 본문의 `rt_cd != "0"` 에러를 분류합니다.
    pub fn from_kis_message(msg_cd: &str, msg1: &str) -> Self {
        if msg_cd == KIS_RATE_LIMIT_CODE || is_rate_limit_message(msg1) {
            return ExchangeError::RateLimited(format!("{}: {}", msg_cd, msg1));
        }
        match msg_cd {
            // 토큰 만료/무효
            "EGW00121" | "EGW00123" => ExchangeError::Unauthorized(format!("{}: {}", msg_cd, msg1)),
            _ => ExchangeError::ApiError {
                code: msg_cd.to_string(),
                message: msg1.to_string(),
            },
        }
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }
}

fn is_rate_limit_message(text: &str) -> bool {
    let upper = text.to_uppercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| upper.contains(marker))
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for ProviderError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::RateLimited(msg) => ProviderError::RateLimited(msg),
            ExchangeError::NetworkError(msg) | ExchangeError::Timeout(msg) => {
                ProviderError::Network(msg)
            }
            ExchangeError::Unauthorized(msg) => ProviderError::Authentication(msg),
            ExchangeError::ApiError { code, message } => ProviderError::Api { code, message },
            ExchangeError::ParseError(msg) => ProviderError::Parse(msg),
            ExchangeError::InvalidRequest(msg) => ProviderError::InvalidRequest(msg),
        }
    }
}
