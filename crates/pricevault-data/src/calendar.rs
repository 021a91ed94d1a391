//! 거래일 달력.
//!
//! 프로세스 시작 시 한 번 로드하고 이후에는 읽기 전용으로 공유합니다
//! (`Arc<TradingCalendar>`로 각 구성 요소에 주입).
//!
//! 멤버십은 `HashSet`으로 O(1), 개수/오프셋 조회는 정렬된 벡터에 대한
//! 이진 탐색으로 O(log n)입니다.

use crate::error::CalendarError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// 다음/이전 거래일 탐색 기본 한도 (달력일).
pub const DEFAULT_SCAN_HORIZON_DAYS: u32 = 100;

/// 달력 CSV의 헤더.
const CSV_HEADER: &str = "Date";

/// 불변 거래일 달력.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    /// 오름차순, 중복 없음
    days: Vec<NaiveDate>,
    index: HashSet<NaiveDate>,
    scan_horizon_days: u32,
}

impl TradingCalendar {
    /// 날짜 목록에서 달력을 생성합니다. 입력은 정렬되어 있지 않아도 됩니다.
    ///
    /// # Errors
    /// 날짜가 하나도 없으면 `CalendarError::Empty`.
    pub fn from_dates<I>(dates: I) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut days: Vec<NaiveDate> = dates.into_iter().collect();
        days.sort_unstable();
        days.dedup();

        if days.is_empty() {
            return Err(CalendarError::Empty);
        }

        let index = days.iter().copied().collect();
        Ok(Self {
            days,
            index,
            scan_horizon_days: DEFAULT_SCAN_HORIZON_DAYS,
        })
    }

    /// CSV 파일에서 달력을 로드합니다 (헤더 한 줄 + `YYYYMMDD` 행).
    ///
    /// # Errors
    /// 파일을 열 수 없으면 `CalendarError::Unavailable`, 날짜 형식이 잘못되면
    /// `CalendarError::Parse`.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| CalendarError::Unavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let calendar = Self::from_csv_reader(file)?;
        tracing::info!(
            path = %path.display(),
            days = calendar.len(),
            first = %calendar.first_day(),
            last = %calendar.last_day(),
            "거래일 달력 로드 완료"
        );
        Ok(calendar)
    }

    /// CSV 리더에서 달력을 로드합니다. 첫 번째 컬럼만 사용합니다.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CalendarError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut dates = Vec::new();
        for (idx, row) in csv_reader.records().enumerate() {
            // 헤더가 1행이므로 데이터는 2행부터
            let line = idx + 2;
            let row = row.map_err(|e| CalendarError::Parse {
                line,
                value: e.to_string(),
            })?;
            let Some(value) = row.get(0).filter(|v| !v.is_empty()) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| {
                CalendarError::Parse {
                    line,
                    value: value.to_string(),
                }
            })?;
            dates.push(date);
        }

        Self::from_dates(dates)
    }

    /// 다음/이전 거래일 탐색 한도를 설정합니다.
    pub fn with_scan_horizon(mut self, days: u32) -> Self {
        self.scan_horizon_days = days;
        self
    }

    /// 거래일 수.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// 비어 있는지 여부 (생성자가 빈 달력을 거부하므로 항상 false).
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// 첫 거래일.
    pub fn first_day(&self) -> NaiveDate {
        self.days[0]
    }

    /// 마지막 거래일.
    pub fn last_day(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    /// 거래일 여부.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.index.contains(&date)
    }

    /// `[from, to]` 구간의 거래일 수.
    ///
    /// `from > to`이거나 `from`이 마지막 거래일 이후면 0.
    pub fn count_in_range(&self, from: NaiveDate, to: NaiveDate) -> usize {
        if from > to {
            return 0;
        }
        let start = self.days.partition_point(|d| *d < from);
        let end = self.days.partition_point(|d| *d <= to);
        end.saturating_sub(start)
    }

    /// `[from, to]` 구간의 거래일 목록.
    pub fn trading_days_in(&self, from: NaiveDate, to: NaiveDate) -> &[NaiveDate] {
        if from > to {
            return &[];
        }
        let start = self.days.partition_point(|d| *d < from);
        let end = self.days.partition_point(|d| *d <= to);
        &self.days[start..end.max(start)]
    }

    /// `date`로부터 `n` 거래일 뒤의 거래일.
    ///
    /// `date`가 거래일이 아니면 그 이후 첫 거래일을 0번째로 셉니다.
    ///
    /// # Errors
    /// 결과가 달력 범위를 넘으면 `CalendarError::NotFound`.
    pub fn add_trading_days(&self, date: NaiveDate, n: usize) -> Result<NaiveDate, CalendarError> {
        let idx = self.days.partition_point(|d| *d < date);
        if idx == self.days.len() {
            return Err(CalendarError::NotFound(format!(
                "{} is after last calendar entry {}",
                date,
                self.last_day()
            )));
        }
        self.days
            .get(idx + n)
            .copied()
            .ok_or_else(|| {
                CalendarError::NotFound(format!("not enough trading days after {}", date))
            })
    }

    /// `date` 당일 또는 그 이후 첫 거래일.
    ///
    /// # Errors
    /// 탐색 한도 안에 거래일이 없으면 `CalendarError::NotFound`.
    pub fn next_trading_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date, 1)
            .ok_or_else(|| CalendarError::NotFound(format!("no trading day on or after {}", date)))
    }

    /// `date` 당일 또는 그 이전 마지막 거래일.
    ///
    /// # Errors
    /// 탐색 한도 안에 거래일이 없으면 `CalendarError::NotFound`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date, -1)
            .ok_or_else(|| CalendarError::NotFound(format!("no trading day on or before {}", date)))
    }

    fn scan(&self, date: NaiveDate, step: i64) -> Option<NaiveDate> {
        let mut day = date;
        for _ in 0..self.scan_horizon_days {
            if self.is_trading_day(day) {
                return Some(day);
            }
            day = day.checked_add_signed(Duration::days(step))?;
        }
        None
    }

    /// CSV로 기록합니다 (로드 형식과 동일).
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([CSV_HEADER])?;
        for day in &self.days {
            wtr.write_record([day.format("%Y%m%d").to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// `[from, to]` 구간의 평일(월-금)로 달력을 생성합니다.
///
/// 공휴일을 반영하지 않으므로 거래소 휴장일 목록이 없을 때의 근사값입니다.
pub fn generate_weekday_calendar(
    from: NaiveDate,
    to: NaiveDate,
) -> Result<TradingCalendar, CalendarError> {
    let weekdays = from
        .iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
    TradingCalendar::from_dates(weekdays)
}
