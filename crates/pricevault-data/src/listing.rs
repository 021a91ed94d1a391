//! 종목 목록 파일.
//!
//! 두 가지 형식을 받습니다:
//! - 상장 종목 CSV: `Code,ISIN,Name,SecurityType[,ListedOn]`
//! - 종목 코드를 한 줄에 하나씩 적은 텍스트 (빈 줄 무시)

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// 상장 종목 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockListing {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "ISIN")]
    pub isin: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SecurityType")]
    pub security_type: String,
    /// 상장일 (`YYYYMMDD`)
    #[serde(rename = "ListedOn", default, deserialize_with = "deserialize_listed_on")]
    pub listed_on: Option<NaiveDate>,
}

fn deserialize_listed_on<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// 상장 종목 CSV를 읽습니다.
pub fn load_listings(path: impl AsRef<Path>) -> Result<Vec<StockListing>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| DataError::Input(format!("{}: {}", path.display(), e)))?;
    read_listings(file).map_err(|e| DataError::Input(format!("{}: {}", path.display(), e)))
}

fn read_listings<R: Read>(reader: R) -> std::result::Result<Vec<StockListing>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// 종목 목록 파일에서 종목 코드를 읽습니다.
///
/// 첫 줄이 `Code`로 시작하는 헤더면 상장 종목 CSV로, 아니면 한 줄에 하나인
/// 코드 목록으로 읽습니다. 중복은 처음 나온 것만 남깁니다.
pub fn load_symbols(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| DataError::Input(format!("{}: {}", path.display(), e)))?;
    parse_symbols(&content).map_err(|e| DataError::Input(format!("{}: {}", path.display(), e)))
}

fn parse_symbols(content: &str) -> std::result::Result<Vec<String>, csv::Error> {
    let is_listing = content
        .lines()
        .next()
        .map(|line| line.trim_start_matches('\u{feff}').trim().starts_with("Code,"))
        .unwrap_or(false);

    let codes: Vec<String> = if is_listing {
        read_listings(content.trim_start_matches('\u{feff}').as_bytes())?
            .into_iter()
            .map(|l| l.code)
            .collect()
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    };

    let mut seen = std::collections::HashSet::new();
    Ok(codes.into_iter().filter(|c| seen.insert(c.clone())).collect())
}

/// 종목 코드별 상장일.
pub fn listing_dates(listings: &[StockListing]) -> HashMap<String, NaiveDate> {
    listings
        .iter()
        .filter_map(|l| l.listed_on.map(|date| (l.code.clone(), date)))
        .collect()
}
