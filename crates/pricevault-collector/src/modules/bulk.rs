//! 일괄 수집 명령.

use crate::{CollectorContext, CollectorError, Result};
use chrono::NaiveDate;
use pricevault_core::Period;
use pricevault_data::listing::load_listings;
use pricevault_data::{load_symbols, CollectionStats};
use std::path::Path;

fn read_symbols(path: &Path) -> Result<Vec<String>> {
    let symbols = load_symbols(path)?;
    if symbols.is_empty() {
        return Err(CollectorError::InvalidArgument(format!(
            "no symbols in {}",
            path.display()
        )));
    }
    tracing::info!(count = symbols.len(), path = %path.display(), "종목 목록 로드");
    Ok(symbols)
}

/// 종목 목록의 일봉을 수집합니다.
///
/// 구간을 주지 않으면 최근 5년입니다.
pub async fn bulk_daily(
    ctx: &CollectorContext,
    symbols_path: &Path,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<CollectionStats> {
    let symbols = read_symbols(symbols_path)?;
    let pipeline = ctx.pipeline()?;
    let (from, to) = range.unwrap_or_else(|| pipeline.period_range(Period::FiveYears));

    tracing::info!(symbols = symbols.len(), from = %from, to = %to, "일봉 일괄 수집 시작");
    Ok(pipeline.bulk_fetch_daily(&symbols, from, to).await)
}

/// 종목 목록의 분봉을 수집합니다.
///
/// 구간을 주지 않으면 최근 1년입니다.
pub async fn bulk_minute(
    ctx: &CollectorContext,
    symbols_path: &Path,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<CollectionStats> {
    let symbols = read_symbols(symbols_path)?;
    let pipeline = ctx.pipeline()?;
    let (from, to) = range.unwrap_or_else(|| pipeline.period_range(Period::OneYear));

    tracing::info!(symbols = symbols.len(), from = %from, to = %to, "분봉 일괄 수집 시작");
    Ok(pipeline.bulk_fetch_minute(&symbols, from, to).await)
}

/// 상장 종목 전체의 최근 10년 일봉을 수집합니다.
///
/// 상장일이 있는 종목은 상장일 이전 구간을 요청하지 않습니다.
pub async fn fetch_all_daily(
    ctx: &CollectorContext,
    listings_path: &Path,
    to: Option<NaiveDate>,
) -> Result<CollectionStats> {
    let listings = load_listings(listings_path)?;
    let symbols: Vec<String> = listings.iter().map(|l| l.code.clone()).collect();
    if symbols.is_empty() {
        return Err(CollectorError::InvalidArgument(format!(
            "no listings in {}",
            listings_path.display()
        )));
    }

    let pipeline = ctx.pipeline_with_listings(&listings)?;
    let (from, to) = match to {
        Some(to) => Period::TenYears.range_ending(to),
        None => pipeline.period_range(Period::TenYears),
    };

    tracing::info!(symbols = symbols.len(), from = %from, to = %to, "전 종목 일봉 수집 시작");
    Ok(pipeline.bulk_fetch_daily(&symbols, from, to).await)
}
