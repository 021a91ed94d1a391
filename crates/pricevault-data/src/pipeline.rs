//! 종목별 과거 시세 파이프라인.
//!
//! 일봉 흐름:
//! 1. 완결성 사전 검사 (이미 완결이면 종료)
//! 2. 저장된 일자로 갭 계획 (최신 구간 먼저)
//! 3. 호출 간격 제한과 재시도를 거쳐 구간 조회
//! 4. 받은 레코드를 한 번에 병합 저장
//! 5. 완결성 사후 검사 (불완전하면 경고)
//!
//! 분봉은 세션 청크 계획을 쓰고 완결성 검사를 하지 않습니다.

use crate::calendar::TradingCalendar;
use crate::completeness::{check_completeness, clamp_to_today, Completeness};
use crate::error::{DataError, Result};
use crate::executor::{ExecutionOptions, FetchExecutor, RetryPolicy};
use crate::merge::merge_and_store;
use crate::planner::{DailyGapPlanner, MinuteChunkPlanner};
use crate::rate_limiter::RateLimiter;
use crate::stats::CollectionStats;
use crate::storage::Archive;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Asia::Seoul;
use pricevault_core::{
    DailyBar, Granularity, MinuteBar, Period, PipelineConfig, PriceProvider, YearMonth,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// 현재 시각 공급자 (KST 벽시계).
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// 한국 표준시 현재 시각.
pub fn kst_now() -> NaiveDateTime {
    Utc::now().with_timezone(&Seoul).naive_local()
}

/// 종목 하나의 수집 결과.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub symbol: String,
    pub granularity: Granularity,
    /// 계획된 조회 구간 수
    pub ranges_planned: usize,
    /// 상위 호출 수 (재시도 포함)
    pub calls: u32,
    /// 새로 받은 레코드 수
    pub records_fetched: usize,
    /// 병합 후 기록된 레코드 수
    pub records_stored: usize,
    /// 빈 응답으로 이력 끝에 도달했는지 여부
    pub exhausted: bool,
    /// 사전 검사에서 이미 완결이라 건너뛰었는지 여부
    pub already_complete: bool,
    /// 일봉 사후 완결성 검사 결과
    pub completeness: Option<Completeness>,
}

impl FetchReport {
    fn new(symbol: &str, granularity: Granularity) -> Self {
        Self {
            symbol: symbol.to_string(),
            granularity,
            ranges_planned: 0,
            calls: 0,
            records_fetched: 0,
            records_stored: 0,
            exhausted: false,
            already_complete: false,
            completeness: None,
        }
    }

    /// 사후 검사에서 불완전으로 판정되었는지 여부.
    pub fn is_incomplete(&self) -> bool {
        self.completeness.is_some_and(|c| !c.is_complete)
    }
}

/// 과거 시세 수집 파이프라인.
///
/// 같은 인스턴스(또는 `with_rate_limiter`로 제한기를 공유한 인스턴스)에서
/// 나가는 모든 상위 호출은 하나의 호출 간격 제한을 따릅니다.
pub struct HistoricalPipeline {
    provider: Arc<dyn PriceProvider>,
    archive: Archive,
    calendar: Arc<TradingCalendar>,
    limiter: Arc<RateLimiter>,
    executor: FetchExecutor,
    config: PipelineConfig,
    session_open: NaiveTime,
    session_close: NaiveTime,
    listing_dates: HashMap<String, NaiveDate>,
    clock: Clock,
}

impl HistoricalPipeline {
    /// 새 파이프라인 생성.
    ///
    /// # Errors
    /// 세션 시각 설정이 잘못되면 `DataError::Config`.
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        archive: Archive,
        calendar: Arc<TradingCalendar>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let (session_open, session_close) = config
            .session_bounds()
            .map_err(|e| DataError::Config(e.to_string()))?;
        let limiter = Arc::new(RateLimiter::new(config.min_call_interval()));
        let executor = FetchExecutor::new(limiter.clone(), RetryPolicy::from_config(&config));

        Ok(Self {
            provider,
            archive,
            calendar,
            limiter,
            executor,
            config,
            session_open,
            session_close,
            listing_dates: HashMap::new(),
            clock: Arc::new(kst_now),
        })
    }

    /// 다른 파이프라인과 호출 간격 제한기를 공유합니다.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        debug!(
            min_interval_ms = limiter.min_interval().as_millis() as u64,
            "호출 간격 제한기 공유"
        );
        self.executor = FetchExecutor::new(limiter.clone(), *self.executor.policy());
        self.limiter = limiter;
        self
    }

    /// 현재 시각 공급자를 교체합니다.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// 종목별 상장일을 설정합니다.
    pub fn with_listing_dates(mut self, listing_dates: HashMap<String, NaiveDate>) -> Self {
        self.listing_dates = listing_dates;
        self
    }

    /// 이 파이프라인의 호출 간격 제한기. `with_rate_limiter`로 다른 파이프라인에 넘겨 공유합니다.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// 기준일(오늘)로 끝나는 기간 프리셋 구간.
    pub fn period_range(&self, period: Period) -> (NaiveDate, NaiveDate) {
        period.range_ending(self.today())
    }

    fn today(&self) -> NaiveDate {
        (self.clock)().date()
    }

    fn execution_options(&self, symbol: &str, stop_on_empty: bool) -> ExecutionOptions {
        ExecutionOptions {
            stop_on_empty,
            listed_on: self.listing_dates.get(symbol).copied(),
        }
    }

    // =========================================================================
    // 일봉
    // =========================================================================

    /// 일봉 `[from, to]` 구간을 채웁니다.
    ///
    /// 오늘 이후 날짜는 오늘로 잘라냅니다. 구간 전체가 미래면 오늘 하루만 봅니다.
    ///
    /// # Errors
    /// 제공자 실패(재시도 소진 포함) 또는 저장소 오류. 이때 아무것도 저장되지 않습니다.
    #[instrument(skip(self), fields(provider = self.provider.provider_name()))]
    pub async fn fetch_and_store_daily(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FetchReport> {
        if from > to {
            return Err(DataError::InvalidRange(format!("{} > {}", from, to)));
        }

        let mut report = FetchReport::new(symbol, Granularity::Daily);
        let today = self.today();
        let (from, to) = clamp_to_today(from, to, today);

        let existing: Vec<DailyBar> = self.archive.load_records(symbol, None).await?;
        let before = Completeness::evaluate(&existing, &self.calendar, from, to);
        if before.is_complete {
            info!(records = before.record_count, "이미 완결, 건너뜀");
            report.already_complete = true;
            report.completeness = Some(before);
            return Ok(report);
        }

        let covered: HashSet<NaiveDate> = existing.iter().map(|bar| bar.date).collect();
        let plan = DailyGapPlanner::new(&self.calendar, self.config.daily_span_limit)
            .plan(&covered, from, to, today);
        report.ranges_planned = plan.len();
        info!(
            stored = before.record_count,
            expected = before.expected,
            ranges = plan.len(),
            "일봉 갭 계획 완료"
        );

        if !plan.is_empty() {
            let provider = self.provider.clone();
            let outcome = self
                .executor
                .execute::<DailyBar, _, _>(
                    symbol,
                    &plan,
                    self.execution_options(symbol, self.config.daily_stop_on_empty),
                    |range| {
                        let provider = provider.clone();
                        let symbol = symbol.to_string();
                        async move { provider.fetch_daily(&symbol, range).await }
                    },
                )
                .await?;

            report.calls = outcome.calls;
            report.exhausted = outcome.is_exhausted();
            report.records_fetched = outcome.records.len();
            report.records_stored = merge_and_store(&self.archive, symbol, outcome.records).await?;
        }

        let after = check_completeness(&self.archive, &self.calendar, symbol, from, to).await?;
        if !after.is_complete {
            warn!(
                records = after.record_count,
                expected = after.expected,
                missing = after.missing(),
                exhausted = report.exhausted,
                "수집 후에도 불완전"
            );
        }
        report.completeness = Some(after);

        info!(
            calls = report.calls,
            fetched = report.records_fetched,
            stored = report.records_stored,
            "일봉 수집 완료"
        );
        Ok(report)
    }

    // =========================================================================
    // 분봉
    // =========================================================================

    /// 분봉 `[from, to]` 거래일의 정규장 구간을 수집합니다.
    ///
    /// 분봉은 갭 탐지 없이 세션 전체를 청크로 요청하고, 중복은 병합 단계에서
    /// 제거됩니다.
    #[instrument(skip(self), fields(provider = self.provider.provider_name()))]
    pub async fn fetch_and_store_minute(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FetchReport> {
        if from > to {
            return Err(DataError::InvalidRange(format!("{} > {}", from, to)));
        }

        let mut report = FetchReport::new(symbol, Granularity::Minute);
        let planner = MinuteChunkPlanner::new(
            &self.calendar,
            self.config.minute_chunk_minutes,
            self.config.minute_overlap_minutes,
            self.session_open,
            self.session_close,
        );
        let plan = planner.plan(
            from.and_time(self.session_open),
            to.and_time(self.session_close),
            (self.clock)(),
        );
        report.ranges_planned = plan.len();
        if plan.is_empty() {
            info!("조회할 분봉 구간 없음");
            return Ok(report);
        }

        let provider = self.provider.clone();
        let outcome = self
            .executor
            .execute::<MinuteBar, _, _>(
                symbol,
                &plan,
                self.execution_options(symbol, self.config.minute_stop_on_empty),
                |range| {
                    let provider = provider.clone();
                    let symbol = symbol.to_string();
                    async move { provider.fetch_minute(&symbol, range).await }
                },
            )
            .await?;

        report.calls = outcome.calls;
        report.exhausted = outcome.is_exhausted();
        report.records_fetched = outcome.records.len();
        report.records_stored = merge_and_store(&self.archive, symbol, outcome.records).await?;

        info!(
            ranges = report.ranges_planned,
            calls = report.calls,
            fetched = report.records_fetched,
            stored = report.records_stored,
            "분봉 수집 완료"
        );
        Ok(report)
    }

    // =========================================================================
    // 조회
    // =========================================================================

    /// 저장된 일봉이 `[from, to]`를 모두 채우는지 검사합니다.
    ///
    /// 수집과 같은 기준으로 오늘 이후 날짜는 잘라냅니다.
    #[instrument(skip(self))]
    pub async fn check_completeness(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Completeness> {
        let (from, to) = clamp_to_today(from, to, self.today());
        check_completeness(&self.archive, &self.calendar, symbol, from, to).await
    }

    /// 저장된 일봉 전체 (일자 오름차순).
    pub async fn load_daily(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        Ok(self.archive.load_records(symbol, None).await?)
    }

    /// 저장된 분봉 월별 파티션 (시각 오름차순).
    pub async fn load_minute(&self, symbol: &str, partition: YearMonth) -> Result<Vec<MinuteBar>> {
        Ok(self.archive.load_records(symbol, Some(partition)).await?)
    }

    /// 저장된 분봉 파티션 목록.
    pub async fn minute_partitions(&self, symbol: &str) -> Result<Vec<YearMonth>> {
        Ok(self.archive.list_partitions(symbol).await?)
    }

    // =========================================================================
    // 일괄 수집
    // =========================================================================

    /// 여러 종목의 일봉을 순서대로 수집합니다.
    ///
    /// 한 종목의 실패는 기록만 하고 다음 종목으로 넘어갑니다.
    pub async fn bulk_fetch_daily(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> CollectionStats {
        let started = Instant::now();
        let mut stats = CollectionStats::new();

        for (idx, symbol) in symbols.iter().enumerate() {
            info!(
                symbol = %symbol,
                progress = %format!("{}/{}", idx + 1, symbols.len()),
                "일봉 수집 시작"
            );
            match self.fetch_and_store_daily(symbol, from, to).await {
                Ok(report) => {
                    stats.total += 1;
                    stats.total_records += report.records_fetched;
                    if report.already_complete {
                        stats.skipped += 1;
                    } else {
                        stats.success += 1;
                        if report.is_incomplete() {
                            stats.incomplete += 1;
                        }
                    }
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "일봉 수집 실패");
                    stats.record_failure(symbol);
                }
            }
        }

        stats.elapsed = started.elapsed();
        stats.log_summary("bulk_fetch_daily");
        stats
    }

    /// 여러 종목의 분봉을 순서대로 수집합니다.
    pub async fn bulk_fetch_minute(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> CollectionStats {
        let started = Instant::now();
        let mut stats = CollectionStats::new();

        for (idx, symbol) in symbols.iter().enumerate() {
            info!(
                symbol = %symbol,
                progress = %format!("{}/{}", idx + 1, symbols.len()),
                "분봉 수집 시작"
            );
            match self.fetch_and_store_minute(symbol, from, to).await {
                Ok(report) => {
                    stats.total += 1;
                    stats.success += 1;
                    stats.total_records += report.records_fetched;
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "분봉 수집 실패");
                    stats.record_failure(symbol);
                }
            }
        }

        stats.elapsed = started.elapsed();
        stats.log_summary("bulk_fetch_minute");
        stats
    }
}
