//! 과거 시세 수집 및 아카이브 정합.
//!
//! 이 crate는 다음을 제공합니다:
//! - 거래일 달력 (멤버십/개수/오프셋 조회)
//! - 상위 API 호출 간격 제한기
//! - 누락 구간 계획 (일봉 갭 탐지, 분봉 청크 분할)
//! - 재시도/백오프가 포함된 조회 실행기
//! - 아카이브 저장소 (로컬 파일시스템, 메모리) 및 CSV 코덱
//! - 자연 키 기반 병합/저장
//! - 완결성 검사
//! - 종목별 파이프라인과 일괄 수집

pub mod calendar;
pub mod completeness;
pub mod error;
pub mod executor;
pub mod listing;
pub mod merge;
pub mod pipeline;
pub mod planner;
pub mod rate_limiter;
pub mod stats;
pub mod storage;

pub use calendar::TradingCalendar;
pub use completeness::{check_completeness, clamp_to_today, Completeness};
pub use error::{CalendarError, DataError, Result, StorageError};
pub use executor::{ExecutionOptions, FetchExecutor, FetchOutcome, RetryPolicy};
pub use listing::{load_symbols, StockListing};
pub use merge::{merge_and_store, merge_records};
pub use pipeline::{FetchReport, HistoricalPipeline};
pub use planner::{DailyGapPlanner, MinuteChunkPlanner};
pub use rate_limiter::RateLimiter;
pub use stats::CollectionStats;
pub use storage::{Archive, ArchiveKey, ArchiveRecord, ArchiveStore, LocalArchive, MemoryArchive};
