//! 한국투자증권 국내 주식 PriceProvider 구현.

use super::client::{KisKrClient, KrDailyOhlcv, KrMinuteOhlcv};
use crate::ExchangeError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pricevault_core::{DailyBar, DailyRange, MinuteBar, MinuteRange, PriceProvider, ProviderError};
use std::sync::Arc;
use tracing::debug;

/// 한국투자증권 국내 주식 PriceProvider 구현.
///
/// KisKrClient를 래핑하여 제공자 중립적인 PriceProvider 인터페이스를 제공합니다.
pub struct KisPriceProvider {
    client: Arc<KisKrClient>,
}

impl KisPriceProvider {
    /// KisKrClient로부터 생성.
    pub fn new(client: KisKrClient) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// 공유된 클라이언트로 생성.
    pub fn from_shared(client: Arc<KisKrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceProvider for KisPriceProvider {
    async fn fetch_daily(
        &self,
        symbol: &str,
        range: DailyRange,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        let rows = self
            .client
            .get_daily_chart(symbol, range.start(), range.end())
            .await?;

        let mut bars = rows
            .into_iter()
            .map(|row| daily_bar(symbol, row))
            .collect::<Result<Vec<_>, _>>()?;
        bars.retain(|bar| range.contains(&bar.date));
        bars.sort_by_key(|bar| bar.date);

        debug!(symbol, range = %range, records = bars.len(), "KIS 일봉 조회");
        Ok(bars)
    }

    async fn fetch_minute(
        &self,
        symbol: &str,
        range: MinuteRange,
    ) -> Result<Vec<MinuteBar>, ProviderError> {
        let date = range.start().date();
        if range.end().date() != date {
            return Err(ExchangeError::InvalidRequest(format!(
                "분봉 조회 구간은 하루를 넘을 수 없습니다: {}",
                range
            ))
            .into());
        }

        let rows = self
            .client
            .get_minute_chart_by_date(symbol, date, range.end().time())
            .await?;

        let mut bars = rows
            .into_iter()
            .map(|row| minute_bar(symbol, row))
            .collect::<Result<Vec<_>, _>>()?;
        bars.retain(|bar| range.contains(&bar.timestamp));
        bars.sort_by_key(|bar| bar.timestamp);

        debug!(symbol, range = %range, records = bars.len(), "KIS 분봉 조회");
        Ok(bars)
    }

    fn provider_name(&self) -> &str {
        "KIS"
    }
}

fn daily_bar(symbol: &str, row: KrDailyOhlcv) -> Result<DailyBar, ExchangeError> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y%m%d")
        .map_err(|e| ExchangeError::ParseError(format!("영업일자 파싱 실패 '{}': {}", row.date, e)))?;
    Ok(DailyBar::new(symbol, date, row.open, row.high, row.low, row.close, row.volume))
}

fn minute_bar(symbol: &str, row: KrMinuteOhlcv) -> Result<MinuteBar, ExchangeError> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y%m%d")
        .map_err(|e| ExchangeError::ParseError(format!("영업일자 파싱 실패 '{}': {}", row.date, e)))?;
    let time = NaiveTime::parse_from_str(&row.time, "%H%M%S")
        .map_err(|e| ExchangeError::ParseError(format!("체결 시간 파싱 실패 '{}': {}", row.time, e)))?;
    Ok(MinuteBar::new(
        symbol,
        NaiveDateTime::new(date, time),
        row.open,
        row.high,
        row.low,
        row.close,
        row.volume,
    ))
}
