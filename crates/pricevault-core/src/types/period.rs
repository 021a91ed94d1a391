//! 일괄 수집용 기간 프리셋.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 기준일로부터 거슬러 올라가는 수집 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// 최근 1년 (분봉 일괄 수집 기본값)
    OneYear,
    /// 최근 5년 (일봉 일괄 수집 기본값)
    FiveYears,
    /// 최근 10년 (전 종목 일봉 수집)
    TenYears,
}

impl Period {
    /// 기간의 연 단위 길이.
    pub fn years(&self) -> u32 {
        match self {
            Period::OneYear => 1,
            Period::FiveYears => 5,
            Period::TenYears => 10,
        }
    }

    /// `to`로 끝나는 `[from, to]` 구간을 계산합니다.
    ///
    /// 2월 29일처럼 대상 연도에 없는 날짜는 해당 월 말일로 맞춰집니다.
    pub fn range_ending(&self, to: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = to
            .checked_sub_months(Months::new(self.years() * 12))
            .unwrap_or(NaiveDate::MIN);
        (from, to)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::OneYear => f.write_str("1year"),
            Period::FiveYears => f.write_str("5years"),
            Period::TenYears => f.write_str("10years"),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1year" | "1y" => Ok(Period::OneYear),
            "5years" | "5y" => Ok(Period::FiveYears),
            "10years" | "10y" => Ok(Period::TenYears),
            _ => Err(format!("Unsupported period: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_ending() {
        let to = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let (from, end) = Period::FiveYears.range_ending(to);
        assert_eq!(from, NaiveDate::from_ymd_opt(2019, 6, 14).unwrap());
        assert_eq!(end, to);
    }

    #[test]
    fn test_range_ending_leap_day() {
        let to = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (from, _) = Period::OneYear.range_ending(to);
        assert_eq!(from, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("5years".parse::<Period>().unwrap(), Period::FiveYears);
        assert_eq!("1year".parse::<Period>().unwrap(), Period::OneYear);
        assert_eq!(Period::TenYears.to_string(), "10years");
        assert!("3months".parse::<Period>().is_err());
    }
}
