//! 단일 종목 분봉 명령.

use super::output::write_json;
use crate::{CollectorContext, Result};
use chrono::NaiveDate;
use pricevault_core::{MinuteBar, YearMonth};
use pricevault_data::FetchReport;
use std::path::Path;

/// 분봉 구간을 수집합니다.
pub async fn fetch_minute(
    ctx: &CollectorContext,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<FetchReport> {
    let pipeline = ctx.pipeline()?;
    let report = pipeline.fetch_and_store_minute(symbol, from, to).await?;
    write_json(&report, None)?;
    Ok(report)
}

/// 저장된 분봉 월별 파티션을 출력합니다.
///
/// 파티션을 지정하지 않으면 저장된 모든 파티션을 순서대로 합칩니다.
pub async fn load_minute(
    ctx: &CollectorContext,
    symbol: &str,
    partition: Option<YearMonth>,
    output: Option<&Path>,
) -> Result<usize> {
    let partitions = match partition {
        Some(ym) => vec![ym],
        None => ctx.archive.list_partitions(symbol).await?,
    };

    let mut bars: Vec<MinuteBar> = Vec::new();
    for ym in partitions {
        let chunk: Vec<MinuteBar> = ctx.archive.load_records(symbol, Some(ym)).await?;
        bars.extend(chunk);
    }

    if bars.is_empty() {
        tracing::warn!(symbol, "저장된 분봉 없음");
    }
    write_json(&bars, output)?;
    Ok(bars.len())
}
