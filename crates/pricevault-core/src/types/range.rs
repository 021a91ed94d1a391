//! 조회 구간과 월별 파티션 키.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 상위 제공자에 한 번에 요청하는 양끝 포함 구간.
///
/// 생성 시 `end >= start`가 보장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRange<T> {
    start: T,
    end: T,
}

/// 일봉 조회 구간.
pub type DailyRange = FetchRange<NaiveDate>;

/// 분봉 조회 구간.
pub type MinuteRange = FetchRange<NaiveDateTime>;

impl<T: Ord + Copy> FetchRange<T> {
    /// 새 구간을 생성합니다. `end < start`이면 `None`.
    pub fn new(start: T, end: T) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    /// 한 시점만 포함하는 구간.
    pub fn single(at: T) -> Self {
        Self { start: at, end: at }
    }

    /// 구간 시작.
    pub fn start(&self) -> T {
        self.start
    }

    /// 구간 끝 (포함).
    pub fn end(&self) -> T {
        self.end
    }

    /// 주어진 시점이 구간 안에 있는지 확인합니다.
    pub fn contains(&self, at: &T) -> bool {
        self.start <= *at && *at <= self.end
    }
}

impl<T: fmt::Display> fmt::Display for FetchRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// 분봉 아카이브의 월별 파티션 키 (`YYYYMM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 연/월로 생성합니다. 월이 1..=12 범위를 벗어나면 `None`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// 날짜가 속한 파티션.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// 연도.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// 월 (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// 파티션의 첫날.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// `from..=to` 구간이 걸치는 모든 파티션 (오름차순).
    pub fn spanning(from: NaiveDate, to: NaiveDate) -> Vec<YearMonth> {
        let mut months = Vec::new();
        if from > to {
            return months;
        }
        let last = Self::of(to);
        let mut current = Self::of(from);
        while current <= last {
            months.push(current);
            current = current.next();
        }
        months
    }

    fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid year-month (expected YYYYMM): {}", s));
        }
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| format!("Invalid year: {}", s))?;
        let month: u32 = s[4..]
            .parse()
            .map_err(|_| format!("Invalid month: {}", s))?;
        Self::new(year, month).ok_or_else(|| format!("Invalid month: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fetch_range_rejects_inverted() {
        assert!(FetchRange::new(d(2024, 1, 2), d(2024, 1, 1)).is_none());
        let range = FetchRange::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(range, FetchRange::single(d(2024, 1, 1)));
    }

    #[test]
    fn test_fetch_range_contains() {
        let range = FetchRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert!(range.contains(&d(2024, 1, 15)));
        assert!(range.contains(&d(2024, 1, 31)));
        assert!(!range.contains(&d(2024, 2, 1)));
        assert_eq!(range.to_string(), "2024-01-01..=2024-01-31");
    }

    #[test]
    fn test_year_month_format() {
        let ym = YearMonth::of(d(2024, 3, 15));
        assert_eq!(ym.to_string(), "202403");
        assert_eq!("202403".parse::<YearMonth>().unwrap(), ym);
        assert!("202413".parse::<YearMonth>().is_err());
        assert!("2024-03".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_spanning() {
        let months = YearMonth::spanning(d(2023, 11, 20), d(2024, 2, 1));
        let labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["202311", "202312", "202401", "202402"]);
        assert!(YearMonth::spanning(d(2024, 2, 1), d(2024, 1, 1)).is_empty());
    }
}
