//! 에러 타입 정의.

use pricevault_data::{CalendarError, DataError, StorageError};
use pricevault_exchange::ExchangeError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 달력 에러
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// 파이프라인 에러
    #[error(transparent)]
    Data(#[from] DataError),

    /// 아카이브 에러
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 상위 제공자 연결 에러
    #[error("Provider setup error: {0}")]
    Exchange(#[from] ExchangeError),

    /// 출력 에러
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 잘못된 인자
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
