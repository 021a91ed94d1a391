//! 일괄 수집 통계.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 일괄 수집 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 처리한 종목 수
    pub total: usize,
    /// 성공한 종목 수
    pub success: usize,
    /// 실패한 종목 수
    pub errors: usize,
    /// 수집 후에도 완결되지 않은 종목 수 (일봉만)
    pub incomplete: usize,
    /// 이미 완결되어 건너뛴 종목 수
    pub skipped: usize,
    /// 새로 받은 총 레코드 수
    pub total_records: usize,
    /// 실패한 종목 코드
    pub failed_symbols: Vec<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 실패 기록
    pub fn record_failure(&mut self, symbol: &str) {
        self.total += 1;
        self.errors += 1;
        self.failed_symbols.push(symbol.to_string());
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            incomplete = self.incomplete,
            skipped = self.skipped,
            total_records = self.total_records,
            success_rate = %format!("{:.1}%", self.success_rate()),
            elapsed = %format!("{:.1}s", self.elapsed.as_secs_f64()),
            "일괄 수집 완료"
        );
        if !self.failed_symbols.is_empty() {
            tracing::warn!(operation = operation, symbols = ?self.failed_symbols, "실패 종목");
        }
    }
}
