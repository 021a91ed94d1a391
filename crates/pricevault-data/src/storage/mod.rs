//! 시세 아카이브 저장소.
//!
//! 객체 키 규칙:
//! - 일봉: `daily/{symbol}.csv`
//! - 분봉: `minute/{symbol}/{YYYYMM}.csv`
//!
//! `ArchiveStore`는 바이트 단위 백엔드이고, `Archive`는 그 위에서 레코드를
//! CSV로 인코딩/디코딩합니다.

mod codec;
mod local;
mod memory;

pub use codec::{decode_records, encode_records, ArchiveRecord};
pub use local::LocalArchive;
pub use memory::MemoryArchive;

use crate::error::StorageError;
use async_trait::async_trait;
use pricevault_core::{Granularity, YearMonth};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// 객체 키
// =============================================================================

/// 아카이브 객체 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey {
    symbol: String,
    granularity: Granularity,
    partition: Option<YearMonth>,
}

impl ArchiveKey {
    /// 일봉 객체 키.
    pub fn daily(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            granularity: Granularity::Daily,
            partition: None,
        }
    }

    /// 분봉 월별 파티션 객체 키.
    pub fn minute(symbol: impl Into<String>, partition: YearMonth) -> Self {
        Self {
            symbol: symbol.into(),
            granularity: Granularity::Minute,
            partition: Some(partition),
        }
    }

    /// 해상도와 파티션으로 키를 만듭니다.
    ///
    /// # Errors
    /// 분봉인데 파티션이 없으면 `StorageError::Backend`.
    pub fn for_granularity(
        symbol: &str,
        granularity: Granularity,
        partition: Option<YearMonth>,
    ) -> Result<Self, StorageError> {
        match (granularity, partition) {
            (Granularity::Daily, _) => Ok(Self::daily(symbol)),
            (Granularity::Minute, Some(ym)) => Ok(Self::minute(symbol, ym)),
            (Granularity::Minute, None) => Err(StorageError::Backend(format!(
                "minute archive for {} requires a year-month partition",
                symbol
            ))),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn partition(&self) -> Option<YearMonth> {
        self.partition
    }

    /// 백엔드 중립적인 객체 경로.
    pub fn object_path(&self) -> String {
        match self.partition {
            Some(ym) => format!("{}/{}/{}.csv", self.granularity, self.symbol, ym),
            None => format!("{}/{}.csv", self.granularity, self.symbol),
        }
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_path())
    }
}

// =============================================================================
// 백엔드 trait
// =============================================================================

/// 아카이브 백엔드.
///
/// 객체가 없으면 에러가 아니라 `Ok(None)`을 반환해야 합니다.
/// `store`는 객체 전체를 교체합니다.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// 객체를 읽습니다.
    async fn load(&self, key: &ArchiveKey) -> Result<Option<Vec<u8>>, StorageError>;

    /// 객체를 통째로 씁니다.
    async fn store(&self, key: &ArchiveKey, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// 종목의 분봉 파티션 목록 (오름차순).
    async fn list_partitions(&self, symbol: &str) -> Result<Vec<YearMonth>, StorageError>;

    /// 백엔드 이름 (로그용).
    fn backend_name(&self) -> &str;
}

// =============================================================================
// 레코드 단위 접근
// =============================================================================

/// 레코드 타입을 아는 아카이브 핸들.
#[derive(Clone)]
pub struct Archive {
    store: Arc<dyn ArchiveStore>,
}

impl Archive {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store }
    }

    /// 레코드를 읽습니다. 객체가 없으면 빈 벡터.
    ///
    /// # 인자
    /// * `partition` - 분봉 월별 파티션 (일봉은 `None`)
    pub async fn load_records<R: ArchiveRecord>(
        &self,
        symbol: &str,
        partition: Option<YearMonth>,
    ) -> Result<Vec<R>, StorageError> {
        let key = ArchiveKey::for_granularity(symbol, R::GRANULARITY, partition)?;
        match self.store.load(&key).await? {
            Some(bytes) => decode_records(symbol, &bytes).map_err(|reason| StorageError::Codec {
                object: key.object_path(),
                reason,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// 레코드로 객체를 교체합니다.
    pub async fn store_records<R: ArchiveRecord>(
        &self,
        symbol: &str,
        partition: Option<YearMonth>,
        records: &[R],
    ) -> Result<(), StorageError> {
        let key = ArchiveKey::for_granularity(symbol, R::GRANULARITY, partition)?;
        let bytes = encode_records(records).map_err(|e| StorageError::Codec {
            object: key.object_path(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            backend = self.store.backend_name(),
            object = %key,
            records = records.len(),
            "아카이브 저장"
        );
        self.store.store(&key, bytes).await
    }

    /// 종목의 분봉 파티션 목록.
    pub async fn list_partitions(&self, symbol: &str) -> Result<Vec<YearMonth>, StorageError> {
        self.store.list_partitions(symbol).await
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_paths() {
        assert_eq!(ArchiveKey::daily("005930").object_path(), "daily/005930.csv");

        let ym = YearMonth::new(2024, 3).unwrap();
        assert_eq!(
            ArchiveKey::minute("005930", ym).object_path(),
            "minute/005930/202403.csv"
        );
    }

    #[test]
    fn test_minute_key_requires_partition() {
        assert!(ArchiveKey::for_granularity("005930", Granularity::Minute, None).is_err());
        let key = ArchiveKey::for_granularity("005930", Granularity::Daily, None).unwrap();
        assert_eq!(key, ArchiveKey::daily("005930"));
    }
}
