//! 시세 수집 파이프라인의 도메인 모델.

mod price_provider;
mod price_record;

pub use price_provider::*;
pub use price_record::*;
