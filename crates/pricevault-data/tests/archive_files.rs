//! 파일 기반 달력/아카이브 통합 테스트.

use async_trait::async_trait;
use chrono::NaiveDate;
use pricevault_core::{
    DailyBar, DailyRange, MinuteBar, MinuteRange, PipelineConfig, PriceProvider, ProviderError,
};
use pricevault_data::calendar::generate_weekday_calendar;
use pricevault_data::{
    load_symbols, Archive, CalendarError, HistoricalPipeline, LocalArchive, TradingCalendar,
};
use rust_decimal_macros::dec;
use std::io::Write;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct EveryDayProvider {
    calendar: Arc<TradingCalendar>,
}

#[async_trait]
impl PriceProvider for EveryDayProvider {
    async fn fetch_daily(
        &self,
        symbol: &str,
        range: DailyRange,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        Ok(self
            .calendar
            .trading_days_in(range.start(), range.end())
            .iter()
            .map(|day| {
                DailyBar::new(
                    symbol,
                    *day,
                    dec!(70100.5),
                    dec!(71000),
                    dec!(69900),
                    dec!(70500),
                    12_345,
                )
            })
            .collect())
    }

    async fn fetch_minute(
        &self,
        _symbol: &str,
        _range: MinuteRange,
    ) -> Result<Vec<MinuteBar>, ProviderError> {
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &str {
        "every-day"
    }
}

#[test]
fn test_calendar_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekdays.csv");

    let generated = generate_weekday_calendar(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
    generated.write_csv(std::fs::File::create(&path).unwrap()).unwrap();

    let loaded = TradingCalendar::from_csv_path(&path).unwrap();
    assert_eq!(loaded.len(), generated.len());
    assert_eq!(loaded.first_day(), d(2024, 1, 1));
    assert_eq!(loaded.last_day(), d(2024, 12, 31));
}

#[test]
fn test_calendar_file_unsorted_with_duplicates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Date\n20240105\n20240102\n20240105\n20240103").unwrap();

    let calendar = TradingCalendar::from_csv_path(file.path()).unwrap();
    assert_eq!(calendar.len(), 3);
    assert_eq!(calendar.add_trading_days(d(2024, 1, 2), 2).unwrap(), d(2024, 1, 5));
}

#[test]
fn test_header_only_calendar_is_empty() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Date").unwrap();
    assert!(matches!(
        TradingCalendar::from_csv_path(file.path()),
        Err(CalendarError::Empty)
    ));
}

#[test]
fn test_load_symbols_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "005930\n000660\n\n035720").unwrap();
    assert_eq!(load_symbols(file.path()).unwrap(), vec!["005930", "000660", "035720"]);
}

#[tokio::test]
async fn test_pipeline_on_local_archive() {
    let dir = tempfile::tempdir().unwrap();
    let calendar = Arc::new(generate_weekday_calendar(d(2024, 1, 1), d(2024, 12, 31)).unwrap());
    let provider = Arc::new(EveryDayProvider { calendar: calendar.clone() });
    let config = PipelineConfig {
        min_call_interval_ms: 0,
        ..PipelineConfig::default()
    };

    let pipeline = HistoricalPipeline::new(
        provider,
        Archive::new(Arc::new(LocalArchive::new(dir.path()))),
        calendar,
        config,
    )
    .unwrap()
    .with_clock(Arc::new(|| d(2024, 12, 31).and_hms_opt(20, 0, 0).unwrap()));

    let report = pipeline
        .fetch_and_store_daily("005930", d(2024, 3, 1), d(2024, 3, 31))
        .await
        .unwrap();
    assert_eq!(report.records_stored, 21);

    let text = std::fs::read_to_string(dir.path().join("daily/005930.csv")).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Date,Open,High,Low,Close,Volume,Duration"));
    assert_eq!(lines.next(), Some("20240301,70100.5,71000,69900,70500,12345,D"));

    let completeness = pipeline
        .check_completeness("005930", d(2024, 3, 1), d(2024, 3, 31))
        .await
        .unwrap();
    assert!(completeness.is_complete);
    assert_eq!(completeness.record_count, 21);
}
