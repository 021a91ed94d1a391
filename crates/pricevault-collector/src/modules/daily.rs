//! 단일 종목 일봉 명령.

use super::output::write_json;
use crate::{CollectorContext, Result};
use chrono::NaiveDate;
use pricevault_core::DailyBar;
use pricevault_data::pipeline::kst_now;
use pricevault_data::{check_completeness, clamp_to_today, Completeness, FetchReport};
use std::path::Path;

/// 일봉 구간을 채웁니다.
pub async fn fetch_daily(
    ctx: &CollectorContext,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<FetchReport> {
    let pipeline = ctx.pipeline()?;
    let report = pipeline.fetch_and_store_daily(symbol, from, to).await?;
    write_json(&report, None)?;
    Ok(report)
}

/// 완결성을 검사합니다. 제공자 연결 없이 아카이브만 읽습니다.
///
/// 파이프라인과 같이 오늘(KST) 이후 날짜는 잘라냅니다.
pub async fn check(
    ctx: &CollectorContext,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Completeness> {
    let (from, to) = clamp_to_today(from, to, kst_now().date());
    let completeness = check_completeness(&ctx.archive, &ctx.calendar, symbol, from, to).await?;
    tracing::info!(
        symbol,
        complete = completeness.is_complete,
        records = completeness.record_count,
        expected = completeness.expected,
        "완결성 검사"
    );
    write_json(&completeness, None)?;
    Ok(completeness)
}

/// 저장된 일봉을 출력합니다.
pub async fn load_daily(
    ctx: &CollectorContext,
    symbol: &str,
    output: Option<&Path>,
) -> Result<usize> {
    let bars: Vec<DailyBar> = ctx.archive.load_records(symbol, None).await?;
    if bars.is_empty() {
        tracing::warn!(symbol, "저장된 일봉 없음");
    }
    write_json(&bars, output)?;
    Ok(bars.len())
}
