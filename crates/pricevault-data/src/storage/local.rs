//! 로컬 파일시스템 아카이브.

use super::{ArchiveKey, ArchiveStore};
use crate::error::StorageError;
use async_trait::async_trait;
use pricevault_core::{Granularity, YearMonth};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 디렉토리 하나를 루트로 하는 아카이브.
///
/// 쓰기는 임시 파일에 기록한 뒤 이름을 바꾸므로 읽는 쪽이 절반만 쓰인
/// 객체를 보지 않습니다.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ArchiveKey) -> Result<PathBuf, StorageError> {
        validate_symbol(key.symbol())?;
        Ok(self.root.join(key.object_path()))
    }
}

fn validate_symbol(symbol: &str) -> Result<(), StorageError> {
    let valid = !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(StorageError::Backend(format!("invalid symbol for archive path: '{}'", symbol)))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ArchiveStore for LocalArchive {
    async fn load(&self, key: &ArchiveKey) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn store(&self, key: &ArchiveKey, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let tmp_path = path.with_extension("csv.tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| io_error(&tmp_path, e))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(&path, e));
        }
        Ok(())
    }

    async fn list_partitions(&self, symbol: &str) -> Result<Vec<YearMonth>, StorageError> {
        validate_symbol(symbol)?;
        let dir = self.root.join(Granularity::Minute.as_str()).join(symbol);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut partitions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }
            if let Some(ym) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<YearMonth>().ok())
            {
                partitions.push(ym);
            }
        }

        partitions.sort();
        Ok(partitions)
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
