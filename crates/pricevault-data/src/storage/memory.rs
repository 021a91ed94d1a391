//! 메모리 아카이브 (테스트 및 드라이런용).

use super::{ArchiveKey, ArchiveStore};
use crate::error::StorageError;
use async_trait::async_trait;
use pricevault_core::YearMonth;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 프로세스 내 아카이브.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    objects: RwLock<HashMap<ArchiveKey, Vec<u8>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 객체 수.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn load(&self, key: &ArchiveKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn store(&self, key: &ArchiveKey, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.objects.write().await.insert(key.clone(), bytes);
        Ok(())
    }

    async fn list_partitions(&self, symbol: &str) -> Result<Vec<YearMonth>, StorageError> {
        let objects = self.objects.read().await;
        let mut partitions: Vec<YearMonth> = objects
            .keys()
            .filter(|key| key.symbol() == symbol)
            .filter_map(|key| key.partition())
            .collect();
        partitions.sort();
        Ok(partitions)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
