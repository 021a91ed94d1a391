//! 데이터 모듈 오류 타입.

use pricevault_core::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// 거래일 달력 오류.
///
/// 달력을 불러오지 못하면 거래일 판단이 필요한 모든 작업은 실패해야 합니다.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// 달력 소스를 읽을 수 없음
    #[error("Trading calendar unavailable ({path}): {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// 날짜 파싱 실패
    #[error("Invalid calendar entry at line {line}: {value}")]
    Parse { line: usize, value: String },

    /// 거래일이 하나도 없음
    #[error("Trading calendar is empty")]
    Empty,

    /// 달력 범위를 벗어난 조회
    #[error("Trading day not found: {0}")]
    NotFound(String),
}

/// 아카이브 저장소 오류.
///
/// "없음"은 오류가 아니라 `Ok(None)`으로 표현됩니다.
#[derive(Debug, Error)]
pub enum StorageError {
    /// 파일 입출력 오류
    #[error("Archive I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 행 인코딩/디코딩 오류
    #[error("Archive codec error ({object}): {reason}")]
    Codec { object: String, reason: String },

    /// 백엔드 오류
    #[error("Archive backend error: {0}")]
    Backend(String),
}

/// 파이프라인 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 달력 오류
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// 저장소 오류
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 상위 제공자 실패 (재시도 소진 포함)
    #[error("Upstream failure for {symbol} [{range}] after {attempts} attempt(s): {source}")]
    Upstream {
        symbol: String,
        range: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// 잘못된 요청 구간
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// 파이프라인 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),

    /// 입력 파일 오류 (종목 목록 등)
    #[error("Input error: {0}")]
    Input(String),
}

impl DataError {
    /// 요청 한도 초과로 재시도를 소진한 경우인지 확인.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DataError::Upstream { source, .. } if source.is_rate_limited())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
