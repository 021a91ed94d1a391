//! 파이프라인 전반에서 사용되는 공통 타입.

mod decimal;
mod granularity;
mod period;
mod range;

pub use decimal::*;
pub use granularity::*;
pub use period::*;
pub use range::*;
