//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → `PRICEVAULT__` 접두사 환경 변수 순으로
//! 덮어씁니다. 예: `PRICEVAULT__PIPELINE__MAX_ATTEMPTS=5`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 거래일 CSV 경로를 지정하는 레거시 환경 변수.
pub const TRADING_DAYS_ENV: &str = "TRADING_DAYS_CSV";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 거래일 달력 설정
    pub calendar: CalendarConfig,
    /// 아카이브 저장소 설정
    pub archive: ArchiveConfig,
    /// 수집 파이프라인 설정
    pub pipeline: PipelineConfig,
    /// KIS 연결 설정
    pub kis: KisSettings,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 거래일 달력 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// 거래일 CSV 경로 (헤더 + YYYYMMDD 행)
    pub path: PathBuf,
    /// 다음/이전 거래일 탐색 한도 (달력일)
    pub scan_horizon_days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("weekdays.csv"),
            scan_horizon_days: 100,
        }
    }
}

/// 아카이브 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// 로컬 아카이브 루트 디렉토리
    pub root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./archive"),
        }
    }
}

/// 수집 파이프라인 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 상위 API 호출 간 최소 간격 (밀리초)
    pub min_call_interval_ms: u64,
    /// 일봉 1회 호출당 최대 거래일 수
    pub daily_span_limit: usize,
    /// 호출당 최대 시도 횟수 (첫 호출 포함)
    pub max_attempts: u32,
    /// 백오프 기본 대기 (밀리초)
    pub backoff_base_ms: u64,
    /// 백오프 최대 대기 (밀리초)
    pub backoff_cap_ms: u64,
    /// 분봉 청크 길이 (분)
    pub minute_chunk_minutes: u32,
    /// 분봉 청크 간 겹침 (분)
    pub minute_overlap_minutes: u32,
    /// 정규장 시작 (HH:MM)
    pub session_open: String,
    /// 정규장 종료 (HH:MM)
    pub session_close: String,
    /// 일봉 빈 응답 시 더 오래된 구간 건너뛰기
    pub daily_stop_on_empty: bool,
    /// 분봉 빈 응답 시 더 오래된 구간 건너뛰기
    pub minute_stop_on_empty: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_call_interval_ms: 50,
            daily_span_limit: 100,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 32_000,
            minute_chunk_minutes: 100,
            minute_overlap_minutes: 10,
            session_open: "09:00".to_string(),
            session_close: "15:30".to_string(),
            daily_stop_on_empty: true,
            minute_stop_on_empty: false,
        }
    }
}

impl PipelineConfig {
    /// 호출 간 최소 간격을 Duration으로 반환
    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }

    /// 백오프 기본 대기를 Duration으로 반환
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// 백오프 최대 대기를 Duration으로 반환
    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    /// 정규장 시작/종료 시각을 파싱합니다.
    pub fn session_bounds(&self) -> Result<(NaiveTime, NaiveTime), config::ConfigError> {
        let open = parse_hhmm("pipeline.session_open", &self.session_open)?;
        let close = parse_hhmm("pipeline.session_close", &self.session_close)?;
        if close <= open {
            return Err(config::ConfigError::Message(format!(
                "pipeline.session_close ({}) must be after session_open ({})",
                self.session_close, self.session_open
            )));
        }
        Ok((open, close))
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.max_attempts == 0 {
            return Err(config::ConfigError::Message(
                "pipeline.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.daily_span_limit == 0 {
            return Err(config::ConfigError::Message(
                "pipeline.daily_span_limit must be at least 1".to_string(),
            ));
        }
        if self.minute_overlap_minutes >= self.minute_chunk_minutes {
            return Err(config::ConfigError::Message(format!(
                "pipeline.minute_overlap_minutes ({}) must be smaller than \
                 minute_chunk_minutes ({})",
                self.minute_overlap_minutes, self.minute_chunk_minutes
            )));
        }
        self.session_bounds().map(|_| ())
    }
}

/// KIS 연결 설정 (인증 정보는 환경 변수 `KIS_APP_KEY`/`KIS_APP_SECRET`에서만 읽음).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KisSettings {
    /// 환경 (real, paper)
    pub environment: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for KisSettings {
    fn default() -> Self {
        Self {
            environment: "real".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// # Errors
    /// 파일 파싱 실패, 타입 불일치, 값 검증 실패 시 `config::ConfigError`.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::with_name("config/default").required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("PRICEVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("calendar.path", std::env::var(TRADING_DAYS_ENV).ok())?
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.pipeline.validate()?;
        Ok(app)
    }

    /// 기본 경로(`config/default.toml`, 없으면 무시)에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load(None)
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, config::ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| {
            config::ConfigError::Message(format!("{}: invalid time '{}': {}", field, value, e))
        })
}
