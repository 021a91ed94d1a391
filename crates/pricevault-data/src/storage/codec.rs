//! 아카이브 CSV 행 코덱.
//!
//! 일봉: `Date,Open,High,Low,Close,Volume,Duration` (`Date` = `YYYYMMDD`, `Duration` = `D`)
//! 분봉: `DateTime,Open,High,Low,Close,Volume,Duration` (`DateTime` = `YYYYMMDDHHMMSS`, `Duration` = `M`)
//!
//! 종목 코드는 객체 키에 들어 있으므로 행에는 기록하지 않습니다.

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use pricevault_core::{DailyBar, MinuteBar, Price, PriceRecord, Volume};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y%m%d";
const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// CSV 한 행으로 저장 가능한 레코드.
pub trait ArchiveRecord: PriceRecord + Sized {
    /// 헤더 행.
    const HEADER: [&'static str; 7];

    /// 레코드를 행으로 변환합니다.
    fn to_row(&self) -> [String; 7];

    /// 행을 레코드로 변환합니다.
    fn from_row(symbol: &str, row: &StringRecord) -> Result<Self, String>;
}

impl ArchiveRecord for DailyBar {
    const HEADER: [&'static str; 7] = [
        "Date", "Open", "High", "Low", "Close", "Volume", "Duration",
    ];

    fn to_row(&self) -> [String; 7] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            Self::GRANULARITY.duration_code().to_string(),
        ]
    }

    fn from_row(symbol: &str, row: &StringRecord) -> Result<Self, String> {
        let fields = RowFields::parse::<Self>(row)?;
        let date = NaiveDate::parse_from_str(fields.key, DATE_FORMAT)
            .map_err(|e| format!("invalid date '{}': {}", fields.key, e))?;
        Ok(DailyBar::new(
            symbol,
            date,
            fields.open,
            fields.high,
            fields.low,
            fields.close,
            fields.volume,
        ))
    }
}

impl ArchiveRecord for MinuteBar {
    const HEADER: [&'static str; 7] = [
        "DateTime", "Open", "High", "Low", "Close", "Volume", "Duration",
    ];

    fn to_row(&self) -> [String; 7] {
        [
            self.timestamp.format(DATETIME_FORMAT).to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            Self::GRANULARITY.duration_code().to_string(),
        ]
    }

    fn from_row(symbol: &str, row: &StringRecord) -> Result<Self, String> {
        let fields = RowFields::parse::<Self>(row)?;
        let timestamp = NaiveDateTime::parse_from_str(fields.key, DATETIME_FORMAT)
            .map_err(|e| format!("invalid timestamp '{}': {}", fields.key, e))?;
        Ok(MinuteBar::new(
            symbol,
            timestamp,
            fields.open,
            fields.high,
            fields.low,
            fields.close,
            fields.volume,
        ))
    }
}

/// 키 컬럼을 제외한 공통 컬럼.
struct RowFields<'a> {
    key: &'a str,
    open: Price,
    high: Price,
    low: Price,
    close: Price,
    volume: Volume,
}

impl<'a> RowFields<'a> {
    fn parse<R: ArchiveRecord>(row: &'a StringRecord) -> Result<Self, String> {
        if row.len() != R::HEADER.len() {
            return Err(format!("expected {} columns, got {}", R::HEADER.len(), row.len()));
        }

        let duration = &row[6];
        let expected = R::GRANULARITY.duration_code();
        if duration != expected {
            return Err(format!("duration '{}' does not match '{}'", duration, expected));
        }

        Ok(Self {
            key: &row[0],
            open: parse_field(row, 1)?,
            high: parse_field(row, 2)?,
            low: parse_field(row, 3)?,
            close: parse_field(row, 4)?,
            volume: parse_field(row, 5)?,
        })
    }
}

fn parse_field<T>(row: &StringRecord, idx: usize) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = &row[idx];
    value
        .parse()
        .map_err(|e| format!("column {}: invalid value '{}': {}", idx, value, e))
}

/// 레코드를 헤더가 포함된 CSV 바이트로 인코딩합니다.
pub fn encode_records<R: ArchiveRecord>(records: &[R]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(R::HEADER)?;
    for record in records {
        wtr.write_record(record.to_row())?;
    }
    wtr.into_inner().map_err(|e| e.into_error().into())
}

/// CSV 바이트를 레코드로 디코딩합니다.
pub fn decode_records<R: ArchiveRecord>(symbol: &str, bytes: &[u8]) -> Result<Vec<R>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers().map_err(|e| e.to_string())?;
    if headers.iter().ne(R::HEADER.iter().copied()) {
        return Err(format!("unexpected header: {:?}", headers));
    }

    rdr.records()
        .enumerate()
        .map(|(idx, row)| {
            let row = row.map_err(|e| e.to_string())?;
            R::from_row(symbol, &row).map_err(|e| format!("row {}: {}", idx + 1, e))
        })
        .collect()
}
