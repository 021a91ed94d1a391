//! 거래일 달력 생성 명령.

use crate::{CollectorError, Result};
use chrono::NaiveDate;
use pricevault_data::calendar::generate_weekday_calendar;
use std::path::Path;

/// `[from, to]` 평일로 달력 CSV를 씁니다.
///
/// 공휴일은 빠지지 않으므로 필요하면 생성 후 직접 지워야 합니다.
pub fn generate_calendar(from: NaiveDate, to: NaiveDate, output: &Path) -> Result<usize> {
    if from > to {
        return Err(CollectorError::InvalidArgument(format!("{} > {}", from, to)));
    }

    let calendar = generate_weekday_calendar(from, to)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(output)?;
    calendar
        .write_csv(file)
        .map_err(|e| CollectorError::Io(std::io::Error::other(e)))?;

    tracing::info!(
        path = %output.display(),
        days = calendar.len(),
        first = %calendar.first_day(),
        last = %calendar.last_day(),
        "거래일 달력 생성 완료"
    );
    Ok(calendar.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricevault_data::TradingCalendar;

    #[test]
    fn test_generate_calendar_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/weekdays.csv");
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let days = generate_calendar(from, to, &path).unwrap();
        assert_eq!(days, 23);

        let loaded = TradingCalendar::from_csv_path(&path).unwrap();
        assert_eq!(loaded.len(), 23);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(generate_calendar(from, to, &dir.path().join("x.csv")).is_err());
    }
}
