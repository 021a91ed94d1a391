//! 자연 키 기반 병합/저장.
//!
//! 기존 객체를 읽어 키별 맵으로 만든 뒤 새 레코드로 덮어쓰고, 키 오름차순으로
//! 객체 전체를 다시 씁니다. 같은 데이터로 여러 번 실행해도 결과가 같습니다.

use crate::error::StorageError;
use crate::storage::{Archive, ArchiveRecord};
use pricevault_core::{PriceRecord, YearMonth};
use std::collections::BTreeMap;

/// 기존 레코드와 새 레코드를 병합합니다.
///
/// 키가 겹치면 새 레코드가 이깁니다. 결과는 키 오름차순이며 키당 하나입니다.
pub fn merge_records<R: PriceRecord>(existing: Vec<R>, new: Vec<R>) -> Vec<R> {
    let mut by_key: BTreeMap<R::Key, R> = existing.into_iter().map(|r| (r.key(), r)).collect();
    for record in new {
        by_key.insert(record.key(), record);
    }
    by_key.into_values().collect()
}

/// 새 레코드를 아카이브에 병합 저장합니다.
///
/// 분봉은 월별 파티션으로 나눈 뒤 파티션마다 독립적으로 병합/저장합니다.
/// 새 레코드가 없으면 아무것도 쓰지 않습니다.
///
/// # Returns
/// 병합 후 기록된 객체들의 총 레코드 수
pub async fn merge_and_store<R: ArchiveRecord>(
    archive: &Archive,
    symbol: &str,
    new_records: Vec<R>,
) -> Result<usize, StorageError> {
    if new_records.is_empty() {
        return Ok(0);
    }

    let mut partitions: BTreeMap<Option<YearMonth>, Vec<R>> = BTreeMap::new();
    for record in new_records {
        partitions.entry(record.partition()).or_default().push(record);
    }

    let mut written = 0;
    for (partition, records) in partitions {
        let incoming = records.len();
        let existing = archive.load_records::<R>(symbol, partition).await?;
        let previous = existing.len();
        let merged = merge_records(existing, records);

        archive.store_records(symbol, partition, &merged).await?;
        tracing::debug!(
            symbol,
            partition = ?partition.map(|p| p.to_string()),
            previous,
            incoming,
            stored = merged.len(),
            "병합 저장 완료"
        );
        written += merged.len();
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryArchive;
    use chrono::NaiveDate;
    use pricevault_core::{DailyBar, MinuteBar};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(date: NaiveDate, close: Decimal) -> DailyBar {
        DailyBar::new("005930", date, close, close, close, close, 10)
    }

    #[test]
    fn test_merge_new_wins_and_sorted() {
        let existing = vec![daily(d(2024, 1, 3), dec!(100)), daily(d(2024, 1, 2), dec!(90))];
        let new = vec![daily(d(2024, 1, 3), dec!(101)), daily(d(2024, 1, 4), dec!(102))];

        let merged = merge_records(existing, new);
        let keys: Vec<NaiveDate> = merged.iter().map(|r| r.date).collect();
        assert_eq!(keys, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert_eq!(merged[1].close, dec!(101));
    }

    #[test]
    fn test_merge_dedups_within_new_batch() {
        let new = vec![daily(d(2024, 1, 3), dec!(1)), daily(d(2024, 1, 3), dec!(2))];
        let merged = merge_records(Vec::new(), new);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].close, dec!(2));
    }

    #[tokio::test]
    async fn test_merge_and_store_is_idempotent() {
        let archive = Archive::new(Arc::new(MemoryArchive::new()));
        let batch = vec![daily(d(2024, 1, 3), dec!(100)), daily(d(2024, 1, 2), dec!(99))];

        merge_and_store(&archive, "005930", batch.clone()).await.unwrap();
        let once: Vec<DailyBar> = archive.load_records("005930", None).await.unwrap();
        merge_and_store(&archive, "005930", batch).await.unwrap();
        let twice: Vec<DailyBar> = archive.load_records("005930", None).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[tokio::test]
    async fn test_minute_records_split_by_month() {
        let store = Arc::new(MemoryArchive::new());
        let archive = Archive::new(store.clone());
        let bar = |date: NaiveDate| {
            let ts = date.and_hms_opt(9, 0, 0).unwrap();
            MinuteBar::new("005930", ts, dec!(1), dec!(1), dec!(1), dec!(1), 1)
        };

        let bars = vec![bar(d(2024, 2, 29)), bar(d(2024, 3, 4))];
        let written = merge_and_store(&archive, "005930", bars).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.object_count().await, 2);
        let march: Vec<MinuteBar> = archive
            .load_records("005930", YearMonth::new(2024, 3))
            .await
            .unwrap();
        assert_eq!(march.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let store = Arc::new(MemoryArchive::new());
        let archive = Archive::new(store.clone());
        let written = merge_and_store::<DailyBar>(&archive, "005930", Vec::new()).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(store.object_count().await, 0);
    }
}
