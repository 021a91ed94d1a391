//! 수집기 명령 모듈.

pub mod bulk;
pub mod calendar;
pub mod daily;
pub mod minute;
pub mod output;

pub use bulk::{bulk_daily, bulk_minute, fetch_all_daily};
pub use calendar::generate_calendar;
pub use daily::{check, fetch_daily, load_daily};
pub use minute::{fetch_minute, load_minute};

use chrono::NaiveDate;

/// `YYYYMMDD` 또는 `YYYY-MM-DD` 날짜를 파싱합니다.
pub fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{}' (expected YYYYMMDD or YYYY-MM-DD)", value))
}
