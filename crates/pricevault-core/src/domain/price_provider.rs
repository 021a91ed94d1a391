//! 상위 시세 제공자 추상화.
//!
//! 과거 일봉/분봉을 조회하기 위한 제공자 중립적인 인터페이스와
//! 재시도 판단에 필요한 에러 분류를 제공합니다.

use async_trait::async_trait;
use thiserror::Error;

use super::{DailyBar, MinuteBar};
use crate::types::{DailyRange, MinuteRange};

// =============================================================================
// 에러 타입
// =============================================================================

/// PriceProvider 에러.
///
/// 파이프라인은 `RateLimited`만 재시도하고 나머지는 즉시 실패로 처리합니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 요청 한도 초과 (백오프 후 재시도 가능)
    #[error("요청 한도 초과: {0}")]
    RateLimited(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// API 에러
    #[error("API 에러 [{code}]: {message}")]
    Api { code: String, message: String },

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 잘못된 요청 (구간 한도 초과 등 호출자 버그)
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// 요청 한도 초과 에러인지 확인.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

// =============================================================================
// PriceProvider Trait
// =============================================================================

/// 과거 시세 제공자 trait.
///
/// 구현체는 한 번의 호출로 구간 전체를 반환해야 하며, 데이터가 없는 구간은
/// 에러가 아닌 빈 벡터로 응답합니다. 빈 응답은 파이프라인에서
/// "더 오래된 이력 없음" 신호로 쓰입니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct KisPriceProvider {
///     client: Arc<KisKrClient>,
/// }
///
/// #[async_trait]
/// impl PriceProvider for KisPriceProvider {
///     async fn fetch_daily(&self, symbol: &str, range: DailyRange)
///         -> Result<Vec<DailyBar>, ProviderError> {
///         // KIS API 호출 및 변환
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// 일봉 조회.
    ///
    /// 구간은 최대 100 거래일을 넘지 않아야 합니다.
    ///
    /// # Errors
    ///
    /// - `ProviderError::RateLimited`: 요청 한도 초과
    /// - `ProviderError::Network`: 네트워크 연결 실패
    /// - `ProviderError::Authentication`: 인증 실패
    /// - `ProviderError::Api`: 제공자 API 에러
    async fn fetch_daily(
        &self,
        symbol: &str,
        range: DailyRange,
    ) -> Result<Vec<DailyBar>, ProviderError>;

    /// 분봉 조회.
    ///
    /// 구간은 약 120분을 넘지 않아야 합니다.
    ///
    /// # Errors
    ///
    /// `fetch_daily`와 동일합니다.
    async fn fetch_minute(
        &self,
        symbol: &str,
        range: MinuteRange,
    ) -> Result<Vec<MinuteBar>, ProviderError>;

    /// 제공자 이름 반환 (로깅용).
    fn provider_name(&self) -> &str;
}

// =============================================================================
// 테스트
// =============================================================================
