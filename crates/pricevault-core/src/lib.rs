//! # PriceVault Core
//!
//! 시세 아카이브 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉/분봉 레코드와 자연 키
//! - 조회 구간과 월별 파티션 키
//! - 상위 시세 제공자 추상화 및 에러 분류
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use logging::*;
pub use types::*;
