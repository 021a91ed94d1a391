//! 상위 API 호출 간격 제한기.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 기본 최소 호출 간격 (초당 20회).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// 연속 호출 사이에 최소 간격을 강제합니다.
///
/// 같은 인증 정보를 쓰는 모든 파이프라인이 하나의 인스턴스를 `Arc`로 공유합니다.
/// 마지막 호출 시각의 확인과 갱신은 잠금 안에서 함께 이루어지므로 동시 호출자가
/// 같은 시각을 보고 동시에 통과할 수 없습니다.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 새 제한기 생성.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// 최소 간격.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 직전 호출로부터 최소 간격이 지날 때까지 대기합니다.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let ready_at = last + self.min_interval;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
