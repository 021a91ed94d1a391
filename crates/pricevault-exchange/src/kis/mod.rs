//! 한국투자증권 (KIS) 시세 연동 모듈.
//!
//! 과거 시세 수집에 필요한 KIS Open API 일부만 다룹니다.
//!
//! # 기능
//!
//! - OAuth 2.0 인증 및 자동 토큰 갱신
//! - 국내주식 기간별 시세 (일봉, 최대 100건)
//! - 국내주식 일자별 분봉 (지정 시각 기준 최대 120건)
//!
//! # API 문서
//!
//! 공식 API 문서: <https://apiportal.koreainvestment.com/>
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use pricevault_exchange::kis::{KisConfig, KisKrClient, KisOAuth, KisPriceProvider};
//!
//! let config = KisConfig::from_env(KisEnvironment::Real)?;
//! let oauth = KisOAuth::new(config)?;
//! let provider = KisPriceProvider::new(KisKrClient::new(oauth)?);
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod provider;

pub use auth::{AccessToken, KisOAuth};
pub use client::{KisKrClient, KrDailyOhlcv, KrMinuteOhlcv};
pub use config::{KisConfig, KisEnvironment};
pub use provider::KisPriceProvider;

/// KIS 거래 ID (tr_id) 상수 모음.
///
/// 시세 조회 tr_id는 실전/모의 환경에서 동일합니다.
pub mod tr_id {
    /// 국내주식 기간별 시세 (일/주/월/년)
    pub const KR_DAILY_CHART: &str = "FHKST03010100";
    /// 국내주식 일자별 분봉 조회
    pub const KR_MINUTE_CHART_BY_DATE: &str = "FHKST03010230";
}
