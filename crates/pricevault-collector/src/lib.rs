//! PriceVault 수집기.
//!
//! 이 crate는 파이프라인을 구동하는 바이너리를 제공합니다:
//! - 종목 단위 일봉/분봉 수집과 완결성 검사
//! - 저장된 시세 조회 (JSON 출력)
//! - 종목 목록 기반 일괄 수집
//! - 평일 거래일 달력 생성

pub mod context;
pub mod error;
pub mod modules;

pub use context::CollectorContext;
pub use error::{CollectorError, Result};
