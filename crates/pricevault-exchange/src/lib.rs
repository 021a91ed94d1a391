//! 상위 시세 제공자 연결.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 한국투자증권(KIS) REST 커넥터 (OAuth 토큰 관리, 기간별 일봉, 일자별 분봉)
//! - HTTP 상태/메시지 코드 기반 에러 분류 (요청 한도 초과 vs 기타)
//! - `PriceProvider` 구현체

pub mod error;
pub mod kis;

pub use error::*;
pub use kis::{KisConfig, KisEnvironment, KisKrClient, KisOAuth, KisPriceProvider};
