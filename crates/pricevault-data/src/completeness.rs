//! 완결성 검사.
//!
//! 구간 안의 저장된 일봉 개수를 달력의 거래일 수와 비교합니다. 값의 내용은
//! 검사하지 않습니다.

use crate::calendar::TradingCalendar;
use crate::error::Result;
use crate::storage::Archive;
use chrono::NaiveDate;
use pricevault_core::DailyBar;
use serde::Serialize;

/// 완결성 검사 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completeness {
    /// 저장된 개수가 거래일 수와 같은지 여부
    pub is_complete: bool,
    /// 구간 안의 저장된 레코드 수
    pub record_count: usize,
    /// 구간 안의 거래일 수
    pub expected: usize,
}

impl Completeness {
    /// 레코드 목록으로 결과를 계산합니다.
    pub fn evaluate(
        records: &[DailyBar],
        calendar: &TradingCalendar,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        let record_count = records
            .iter()
            .filter(|r| from <= r.date && r.date <= to)
            .count();
        let expected = calendar.count_in_range(from, to);
        Self {
            is_complete: record_count == expected,
            record_count,
            expected,
        }
    }

    /// 누락된 거래일 수 (초과 저장이면 0).
    pub fn missing(&self) -> usize {
        self.expected.saturating_sub(self.record_count)
    }
}

/// 오늘 이후 날짜를 오늘로 자릅니다. 구간 전체가 미래면 `[today, today]`.
pub fn clamp_to_today(from: NaiveDate, to: NaiveDate, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (from.min(today), to.min(today))
}

/// 아카이브의 일봉이 `[from, to]` 구간을 모두 채우는지 검사합니다.
///
/// 아카이브 객체가 없으면 레코드 0개로 취급합니다.
pub async fn check_completeness(
    archive: &Archive,
    calendar: &TradingCalendar,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Completeness> {
    let records: Vec<DailyBar> = archive.load_records(symbol, None).await?;
    Ok(Completeness::evaluate(&records, calendar, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::generate_weekday_calendar;
    use crate::storage::MemoryArchive;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bars(days: &[NaiveDate]) -> Vec<DailyBar> {
        days.iter()
            .map(|day| DailyBar::new("005930", *day, dec!(1), dec!(1), dec!(1), dec!(1), 1))
            .collect()
    }

    #[test]
    fn test_counts_only_records_in_window() {
        let cal = generate_weekday_calendar(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let records = bars(cal.trading_days_in(d(2024, 1, 1), d(2024, 1, 31)));

        let result = Completeness::evaluate(&records, &cal, d(2024, 1, 8), d(2024, 1, 12));
        assert_eq!(result, Completeness { is_complete: true, record_count: 5, expected: 5 });

        let partial = Completeness::evaluate(&records[..3], &cal, d(2024, 1, 1), d(2024, 1, 5));
        assert!(!partial.is_complete);
        assert_eq!(partial.missing(), 2);
    }

    #[tokio::test]
    async fn test_missing_archive_is_incomplete() {
        let cal = generate_weekday_calendar(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let archive = Archive::new(Arc::new(MemoryArchive::new()));

        let result = check_completeness(&archive, &cal, "005930", d(2024, 1, 1), d(2024, 1, 5))
            .await
            .unwrap();
        assert_eq!(result.record_count, 0);
        assert_eq!(result.expected, 5);
        assert!(!result.is_complete);
    }

    #[test]
    fn test_clamp_to_today() {
        let today = d(2024, 6, 28);
        assert_eq!(clamp_to_today(d(2024, 6, 24), d(2024, 7, 31), today), (d(2024, 6, 24), today));
        assert_eq!(clamp_to_today(d(2024, 7, 10), d(2024, 7, 31), today), (today, today));
        assert_eq!(
            clamp_to_today(d(2024, 1, 2), d(2024, 1, 5), today),
            (d(2024, 1, 2), d(2024, 1, 5))
        );
    }

    #[tokio::test]
    async fn test_weekend_window_is_trivially_complete() {
        let cal = generate_weekday_calendar(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let archive = Archive::new(Arc::new(MemoryArchive::new()));

        let result = check_completeness(&archive, &cal, "005930", d(2024, 1, 6), d(2024, 1, 7))
            .await
            .unwrap();
        assert!(result.is_complete);
    }
}
