//! 누락 구간 계획.
//!
//! - `DailyGapPlanner` - 이미 저장된 일자와 달력을 비교해 갭 구간을 계산
//! - `MinuteChunkPlanner` - 거래일 세션을 겹침이 있는 고정 크기 창으로 분할
//!
//! 두 계획 모두 최신 구간이 먼저 오도록 정렬됩니다. 조회 실행기는 최신 구간부터
//! 요청하다가 빈 응답을 만나면 더 오래된 구간을 건너뜁니다.

use crate::calendar::TradingCalendar;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use pricevault_core::{DailyRange, FetchRange, MinuteRange};
use std::collections::HashSet;

/// 일봉 갭 계획기.
#[derive(Debug, Clone, Copy)]
pub struct DailyGapPlanner<'a> {
    calendar: &'a TradingCalendar,
    /// 한 번의 호출로 요청할 수 있는 최대 거래일 수
    span_limit: usize,
}

impl<'a> DailyGapPlanner<'a> {
    pub fn new(calendar: &'a TradingCalendar, span_limit: usize) -> Self {
        Self {
            calendar,
            span_limit: span_limit.max(1),
        }
    }

    /// `[from, to]` 구간에서 아직 저장되지 않은 거래일을 덮는 조회 구간 목록.
    ///
    /// # 인자
    /// * `covered` - 이미 저장된 일자
    /// * `today` - 미래 날짜를 잘라낼 기준일
    ///
    /// 갭은 연속된 누락 거래일로 시작하지만, 상한 안에서는 사이에 낀 저장된
    /// 날짜를 넘어 확장됩니다. 결과는 최신 구간이 먼저입니다.
    pub fn plan(
        &self,
        covered: &HashSet<NaiveDate>,
        from: NaiveDate,
        to: NaiveDate,
        today: NaiveDate,
    ) -> Vec<DailyRange> {
        let from = from.min(today);
        let to = to.min(today);
        if from > to {
            return Vec::new();
        }

        let mut ranges = Vec::new();
        let mut gap: Option<(NaiveDate, Option<NaiveDate>)> = None;

        for date in from.iter_days().take_while(|d| *d <= to) {
            if !self.calendar.is_trading_day(date) || covered.contains(&date) {
                continue;
            }

            match gap {
                None => gap = Some((date, None)),
                Some((start, _))
                    if self.calendar.count_in_range(start, date) <= self.span_limit =>
                {
                    gap = Some((start, Some(date)));
                }
                Some((start, end)) => {
                    ranges.push(close_gap(start, end));
                    gap = Some((date, None));
                }
            }
        }

        if let Some((start, end)) = gap {
            ranges.push(close_gap(start, end));
        }

        ranges.reverse();
        ranges
    }
}

fn close_gap(start: NaiveDate, end: Option<NaiveDate>) -> DailyRange {
    match end {
        Some(end) => FetchRange::new(start, end).unwrap_or_else(|| FetchRange::single(start)),
        None => FetchRange::single(start),
    }
}

/// 분봉 청크 계획기.
///
/// 분봉은 갭 탐지를 하지 않습니다. 중복은 병합 단계의 키 기반 중복 제거로
/// 정리됩니다.
#[derive(Debug, Clone, Copy)]
pub struct MinuteChunkPlanner<'a> {
    calendar: &'a TradingCalendar,
    chunk: Duration,
    step: Duration,
    session_open: NaiveTime,
    session_close: NaiveTime,
}

impl<'a> MinuteChunkPlanner<'a> {
    /// # 인자
    /// * `chunk_minutes` - 창 하나의 길이 (분)
    /// * `overlap_minutes` - 인접한 창이 겹치는 길이 (분)
    pub fn new(
        calendar: &'a TradingCalendar,
        chunk_minutes: u32,
        overlap_minutes: u32,
        session_open: NaiveTime,
        session_close: NaiveTime,
    ) -> Self {
        let chunk_minutes = chunk_minutes.max(1);
        let step_minutes = chunk_minutes.saturating_sub(overlap_minutes).max(1);
        Self {
            calendar,
            chunk: Duration::minutes(i64::from(chunk_minutes)),
            step: Duration::minutes(i64::from(step_minutes)),
            session_open,
            session_close,
        }
    }

    /// `[from, to]` 구간의 세션 창 목록 (최신 창이 먼저).
    ///
    /// `now` 이후는 잘라냅니다. 비거래일은 창을 만들지 않습니다.
    pub fn plan(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Vec<MinuteRange> {
        let from = from.min(now);
        let to = to.min(now);
        if from > to {
            return Vec::new();
        }

        let mut ranges = Vec::new();
        for day in self.calendar.trading_days_in(from.date(), to.date()) {
            let day_start = day.and_time(self.session_open).max(from);
            let day_end = day.and_time(self.session_close).min(to);
            if day_start > day_end {
                continue;
            }
            self.chunk_day(day_start, day_end, &mut ranges);
        }

        ranges.reverse();
        ranges
    }

    fn chunk_day(
        &self,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
        out: &mut Vec<MinuteRange>,
    ) {
        let last_minute = self.chunk - Duration::minutes(1);
        let mut start = day_start;
        loop {
            let end = (start + last_minute).min(day_end);
            if let Some(range) = FetchRange::new(start, end) {
                out.push(range);
            }
            if end >= day_end {
                break;
            }
            start += self.step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::generate_weekday_calendar;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn q1_2024() -> TradingCalendar {
        generate_weekday_calendar(d(2024, 1, 1), d(2024, 3, 31)).unwrap()
    }

    fn all_covered(cal: &TradingCalendar, from: NaiveDate, to: NaiveDate) -> HashSet<NaiveDate> {
        cal.trading_days_in(from, to).iter().copied().collect()
    }

    #[test]
    fn test_nothing_missing_yields_empty_plan() {
        let cal = q1_2024();
        let covered = all_covered(&cal, d(2024, 1, 1), d(2024, 3, 1));
        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &covered,
            d(2024, 1, 1),
            d(2024, 3, 1),
            d(2024, 6, 1),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_single_missing_day() {
        // 2024-02-10(토)을 임시 거래일로 포함한 달력
        let mut days: Vec<NaiveDate> = q1_2024()
            .trading_days_in(d(2024, 1, 1), d(2024, 3, 31))
            .to_vec();
        days.push(d(2024, 2, 10));
        let cal = TradingCalendar::from_dates(days).unwrap();

        let mut covered = all_covered(&cal, d(2024, 1, 1), d(2024, 3, 1));
        covered.remove(&d(2024, 2, 10));

        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &covered,
            d(2024, 1, 1),
            d(2024, 3, 1),
            d(2024, 6, 1),
        );
        assert_eq!(plan, vec![FetchRange::single(d(2024, 2, 10))]);
    }

    #[test]
    fn test_gap_extends_across_covered_days_within_limit() {
        let cal = q1_2024();
        let mut covered = all_covered(&cal, d(2024, 1, 1), d(2024, 1, 31));
        covered.remove(&d(2024, 1, 10));
        covered.remove(&d(2024, 1, 12));

        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &covered,
            d(2024, 1, 1),
            d(2024, 1, 31),
            d(2024, 6, 1),
        );
        assert_eq!(plan, vec![FetchRange::new(d(2024, 1, 10), d(2024, 1, 12)).unwrap()]);
    }

    #[test]
    fn test_span_limit_splits_newest_first() {
        let cal = q1_2024();
        let covered = HashSet::new();
        // 1월 거래일 23일, 상한 10 → 10 + 10 + 3
        let plan = DailyGapPlanner::new(&cal, 10).plan(
            &covered,
            d(2024, 1, 1),
            d(2024, 1, 31),
            d(2024, 6, 1),
        );
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0], FetchRange::new(d(2024, 1, 29), d(2024, 1, 31)).unwrap());
        assert_eq!(plan[2], FetchRange::new(d(2024, 1, 1), d(2024, 1, 12)).unwrap());
        for range in &plan {
            assert!(cal.count_in_range(range.start(), range.end()) <= 10);
        }
    }

    #[test]
    fn test_future_dates_are_clamped() {
        let cal = q1_2024();
        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &HashSet::new(),
            d(2024, 3, 1),
            d(2024, 3, 31),
            d(2024, 3, 5),
        );
        assert_eq!(plan, vec![FetchRange::new(d(2024, 3, 1), d(2024, 3, 5)).unwrap()]);

        // 구간 전체가 미래면 기준일 하루로 줄어든다
        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &HashSet::new(),
            d(2024, 3, 10),
            d(2024, 3, 31),
            d(2024, 3, 5),
        );
        assert_eq!(plan, vec![FetchRange::single(d(2024, 3, 5))]);

        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &HashSet::new(),
            d(2024, 3, 8),
            d(2024, 3, 4),
            d(2024, 3, 5),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_weekend_only_window_is_empty() {
        let cal = q1_2024();
        let plan = DailyGapPlanner::new(&cal, 100).plan(
            &HashSet::new(),
            d(2024, 1, 6),
            d(2024, 1, 7),
            d(2024, 6, 1),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_minute_chunks_cover_session() {
        let cal = q1_2024();
        let planner = MinuteChunkPlanner::new(&cal, 100, 10, t(9, 0), t(15, 30));
        let day = d(2024, 1, 5);
        let plan = planner.plan(
            day.and_time(t(0, 0)),
            day.and_time(t(23, 59)),
            d(2024, 6, 1).and_time(t(0, 0)),
        );

        // 09:00, 10:30, 12:00, 13:30, 15:00 시작
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].start(), day.and_time(t(15, 0)));
        assert_eq!(plan[0].end(), day.and_time(t(15, 30)));
        assert_eq!(plan[4].start(), day.and_time(t(9, 0)));
        assert_eq!(plan[4].end(), day.and_time(t(10, 39)));
        // 인접 창은 겹친다
        assert!(plan[3].end() >= plan[2].start());
    }

    #[test]
    fn test_minute_plan_skips_non_trading_days_and_future() {
        let cal = q1_2024();
        let planner = MinuteChunkPlanner::new(&cal, 100, 10, t(9, 0), t(15, 30));
        let now = d(2024, 1, 8).and_time(t(10, 0));
        let plan = planner.plan(
            d(2024, 1, 6).and_time(t(0, 0)),
            d(2024, 1, 9).and_time(t(23, 0)),
            now,
        );

        assert_eq!(plan, vec![FetchRange::new(d(2024, 1, 8).and_time(t(9, 0)), now).unwrap()]);
    }

    proptest! {
        #[test]
        fn prop_daily_plan_invariants(
            missing in proptest::collection::vec(0usize..60, 0..40),
            span_limit in 1usize..30,
        ) {
            let cal = q1_2024();
            let from = d(2024, 1, 1);
            let to = d(2024, 3, 29);
            let days = cal.trading_days_in(from, to);
            let mut covered: HashSet<NaiveDate> = days.iter().copied().collect();
            for idx in &missing {
                covered.remove(&days[*idx]);
            }

            let plan = DailyGapPlanner::new(&cal, span_limit).plan(
                &covered,
                from,
                to,
                d(2024, 12, 31),
            );

            // 최신 구간이 먼저, 서로 겹치지 않음
            for pair in plan.windows(2) {
                prop_assert!(pair[0].start() > pair[1].end());
            }
            // 구간당 거래일 수 상한
            for range in &plan {
                prop_assert!(cal.count_in_range(range.start(), range.end()) <= span_limit);
            }
            // 모든 누락 거래일이 어떤 구간에 포함됨
            for day in days.iter().filter(|d| !covered.contains(*d)) {
                prop_assert!(plan.iter().any(|r| r.contains(day)));
            }
        }
    }
}
