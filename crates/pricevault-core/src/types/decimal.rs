//! 가격/거래량 타입.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 거래량 타입 (주 단위).
pub type Volume = u64;
