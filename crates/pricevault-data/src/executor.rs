//! 조회 실행기.
//!
//! 계획된 구간을 최신 것부터 순서대로 요청합니다.
//! - 호출마다 공유 `RateLimiter`를 거칩니다
//! - 요청 한도 초과는 지수 백오프로 재시도하고, 그 외 에러는 즉시 중단합니다
//! - 빈 응답은 "더 오래된 이력 없음"으로 보고 나머지 구간을 건너뜁니다
//!
//! 결과는 모든 구간이 끝난 뒤 한 번에 반환됩니다. 중간 구간에서 실패하면
//! 아무것도 저장되지 않습니다.

use crate::error::{DataError, Result};
use crate::rate_limiter::RateLimiter;
use chrono::NaiveDate;
use pricevault_core::{FetchRange, PipelineConfig, PriceRecord, ProviderError, RecordKey};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 요청 한도 초과 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 호출을 포함한 최대 시도 횟수
    pub max_attempts: u32,
    /// 첫 재시도 전 대기
    pub base: Duration,
    /// 재시도 대기 상한
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(32),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: config.backoff_base(),
            cap: config.backoff_cap(),
        }
    }

    /// `attempt`번째(0부터) 실패 후 대기 시간: `min(base * 2^attempt, cap)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// 실행 옵션.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// 빈 응답에서 더 오래된 구간을 건너뛸지 여부
    pub stop_on_empty: bool,
    /// 알려진 상장일
    ///
    /// 있으면 상장일 이전에 끝나는 구간은 호출하지 않고, 빈 응답으로
    /// 조기 종료하지 않습니다.
    pub listed_on: Option<NaiveDate>,
}

/// 실행 결과.
#[derive(Debug, Clone)]
pub struct FetchOutcome<R: PriceRecord> {
    /// 모든 구간에서 받은 레코드
    pub records: Vec<R>,
    /// 실제 상위 호출 수 (재시도 포함)
    pub calls: u32,
    /// 응답을 받은 구간 수
    pub ranges_fetched: usize,
    /// 호출 없이 건너뛴 구간 수
    pub ranges_skipped: usize,
    /// 빈 응답으로 이력 끝을 확인한 구간
    pub exhausted_at: Option<FetchRange<R::Key>>,
}

impl<R: PriceRecord> FetchOutcome<R> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            calls: 0,
            ranges_fetched: 0,
            ranges_skipped: 0,
            exhausted_at: None,
        }
    }

    /// 이력 끝에 도달했는지 여부.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted_at.is_some()
    }
}

/// 조회 실행기.
#[derive(Debug, Clone)]
pub struct FetchExecutor {
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl FetchExecutor {
    pub fn new(limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self { limiter, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 구간 목록을 순서대로 조회합니다.
    ///
    /// # 인자
    /// * `symbol` - 로그와 에러에 쓰는 종목 코드
    /// * `ranges` - 최신 구간이 먼저인 조회 구간
    /// * `fetch` - 구간 하나를 상위 제공자에 요청하는 함수
    ///
    /// # Errors
    /// 요청 한도 초과 재시도를 소진했거나 그 외 제공자 에러가 나면
    /// `DataError::Upstream`. 이때 이미 받은 레코드는 버려집니다.
    pub async fn execute<R, F, Fut>(
        &self,
        symbol: &str,
        ranges: &[FetchRange<R::Key>],
        options: ExecutionOptions,
        mut fetch: F,
    ) -> Result<FetchOutcome<R>>
    where
        R: PriceRecord,
        F: FnMut(FetchRange<R::Key>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, ProviderError>>,
    {
        let mut outcome = FetchOutcome::empty();

        for (idx, range) in ranges.iter().copied().enumerate() {
            if let Some(listed_on) = options.listed_on {
                if range.end().date() < listed_on {
                    debug!(symbol, range = %range, listed_on = %listed_on, "상장일 이전 구간 건너뜀");
                    outcome.ranges_skipped += 1;
                    continue;
                }
            }

            let records = self
                .fetch_with_retry(symbol, range, &mut fetch, &mut outcome.calls)
                .await?;
            outcome.ranges_fetched += 1;

            if records.is_empty() {
                if !options.stop_on_empty {
                    debug!(symbol, range = %range, "빈 응답");
                    continue;
                }
                if options.listed_on.is_some() {
                    warn!(symbol, range = %range, "상장일 이후 구간에서 빈 응답, 계속 진행");
                    continue;
                }

                let remaining = ranges.len() - idx - 1;
                info!(symbol, range = %range, skipped = remaining, "이력 끝 도달, 이전 구간 건너뜀");
                outcome.ranges_skipped += remaining;
                outcome.exhausted_at = Some(range);
                break;
            }

            debug!(symbol, range = %range, records = records.len(), "구간 조회 완료");
            outcome.records.extend(records);
        }

        Ok(outcome)
    }

    async fn fetch_with_retry<R, F, Fut>(
        &self,
        symbol: &str,
        range: FetchRange<R::Key>,
        fetch: &mut F,
        calls: &mut u32,
    ) -> Result<Vec<R>>
    where
        R: PriceRecord,
        F: FnMut(FetchRange<R::Key>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            self.limiter.wait().await;
            *calls += 1;

            match fetch(range).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_rate_limited() && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        symbol,
                        range = %range,
                        attempt = attempt + 1,
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "요청 한도 초과, 백오프 후 재시도"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(DataError::Upstream {
                        symbol: symbol.to_string(),
                        range: range.to_string(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
            }
        }
    }
}
