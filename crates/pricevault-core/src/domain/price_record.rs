//! 시세 레코드 타입.
//!
//! 이 모듈은 아카이브에 저장되는 레코드를 정의합니다:
//! - `DailyBar` - 일봉 (자연 키: 종목 + 일자)
//! - `MinuteBar` - 분봉 (자연 키: 종목 + 체결 시각)
//! - `PriceRecord` - 병합/저장 단계가 사용하는 공통 인터페이스

use crate::types::{Granularity, Price, Volume, YearMonth};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// 레코드 자연 키의 시간 성분.
pub trait RecordKey: Ord + Copy + Hash + Debug + Display + Send + Sync + 'static {
    /// 키가 속한 날짜.
    fn date(&self) -> NaiveDate;
}

impl RecordKey for NaiveDate {
    fn date(&self) -> NaiveDate {
        *self
    }
}

impl RecordKey for NaiveDateTime {
    fn date(&self) -> NaiveDate {
        NaiveDateTime::date(self)
    }
}

/// 아카이브 레코드 공통 인터페이스.
///
/// 아카이브는 종목별로 분리되어 있으므로 `key()`는 자연 키에서
/// 종목을 뺀 시간 성분만 반환합니다.
pub trait PriceRecord: Clone + Debug + Send + Sync + 'static {
    /// 자연 키의 시간 성분 (일자 또는 체결 시각).
    type Key: RecordKey;

    /// 레코드 해상도.
    const GRANULARITY: Granularity;

    /// 종목 코드.
    fn symbol(&self) -> &str;

    /// 자연 키.
    fn key(&self) -> Self::Key;

    /// 레코드가 속한 거래일.
    fn trading_date(&self) -> NaiveDate {
        self.key().date()
    }

    /// 레코드가 저장될 월별 파티션. 일봉은 파티션을 쓰지 않습니다.
    fn partition(&self) -> Option<YearMonth> {
        if Self::GRANULARITY.is_partitioned() {
            Some(YearMonth::of(self.trading_date()))
        } else {
            None
        }
    }
}

/// 일봉.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 종목 코드
    pub symbol: String,
    /// 영업일자
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl DailyBar {
    /// 새 일봉을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl PriceRecord for DailyBar {
    type Key = NaiveDate;

    const GRANULARITY: Granularity = Granularity::Daily;

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn key(&self) -> NaiveDate {
        self.date
    }
}

/// 분봉.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteBar {
    /// 종목 코드
    pub symbol: String,
    /// 체결 시각 (KST 벽시계 시간)
    pub timestamp: NaiveDateTime,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl MinuteBar {
    /// 새 분봉을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl PriceRecord for MinuteBar {
    type Key = NaiveDateTime;

    const GRANULARITY: Granularity = Granularity::Minute;

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn key(&self) -> NaiveDateTime {
        self.timestamp
    }
}
