//! 로깅 초기화.
//!
//! 수집기가 시작할 때 한 번 호출합니다. `RUST_LOG`가 있으면 설정의 레벨보다
//! 우선하고, `LOG_FORMAT`은 설정 파일의 형식을 덮어씁니다.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 형식 덮어쓰기 환경 변수.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 여러 줄, 색상 (개발용)
    #[default]
    Pretty,
    /// 한 줄 JSON (로그 수집기용)
    Json,
    /// 한 줄 텍스트
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        })
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// 구독자 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info", "pricevault_data=debug,info")
    pub level: String,
    pub format: LogFormat,
    /// 파일명/줄 번호 출력
    pub with_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_file: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
            ..Self::default()
        }
    }

    /// `[logging]` 설정 섹션에서 생성합니다.
    ///
    /// 형식은 `LOG_FORMAT`, 설정 값, `Pretty` 순으로 결정됩니다.
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .or_else(|| settings.format.parse().ok())
            .unwrap_or_default();
        Self::new(settings.level.clone(), format)
    }
}

/// 전역 tracing 구독자를 설치합니다.
///
/// # Errors
/// 필터 지시문이 잘못되었거나 구독자가 이미 설치되어 있으면 실패.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let layer = fmt::layer()
        .with_file(config.with_file)
        .with_line_number(config.with_file);
    let layer = match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).try_init()?;
    tracing::debug!(level = %config.level, format = %config.format, "로깅 초기화");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_from_settings_keeps_level() {
        let settings = LoggingConfig {
            level: "pricevault_data=debug".to_string(),
            format: "pretty".to_string(),
        };
        let config = LogConfig::from_settings(&settings);
        assert_eq!(config.level, "pricevault_data=debug");
        assert!(!config.with_file);
    }
}
