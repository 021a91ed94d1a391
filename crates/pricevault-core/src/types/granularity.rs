//! 시세 레코드의 시간 해상도.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 시세 레코드 해상도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// 일봉
    Daily,
    /// 분봉
    Minute,
}

impl Granularity {
    /// 아카이브 키와 로그에 사용하는 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Minute => "minute",
        }
    }

    /// CSV `Duration` 컬럼에 기록되는 코드.
    pub fn duration_code(&self) -> &'static str {
        match self {
            Granularity::Daily => "D",
            Granularity::Minute => "M",
        }
    }

    /// 월별 파티션을 사용하는지 여부.
    pub fn is_partitioned(&self) -> bool {
        matches!(self, Granularity::Minute)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Granularity::Daily),
            "minute" | "m" | "1m" => Ok(Granularity::Minute),
            _ => Err(format!("Unknown granularity: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parse() {
        assert_eq!("daily".parse::<Granularity>().unwrap(), Granularity::Daily);
        assert_eq!("M".parse::<Granularity>().unwrap(), Granularity::Minute);
        assert!("weekly".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_duration_code() {
        assert_eq!(Granularity::Daily.duration_code(), "D");
        assert_eq!(Granularity::Minute.duration_code(), "M");
        assert!(Granularity::Minute.is_partitioned());
        assert!(!Granularity::Daily.is_partitioned());
    }
}
