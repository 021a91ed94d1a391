//! KIS 국내 주식 시세 REST API 클라이언트.
//!
//! # 지원 기능
//!
//! - 기간별 시세 (일봉, `inquire-daily-itemchartprice`)
//! - 일자별 분봉 (`inquire-time-dailychartprice`)

use super::auth::KisOAuth;
use super::tr_id;
use crate::ExchangeError;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// 기간별 시세 API 경로.
const DAILY_CHART_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice";

/// 일자별 분봉 API 경로.
const MINUTE_CHART_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-time-dailychartprice";

/// KIS 국내 주식 시세 클라이언트.
///
/// 토큰 발급이 분당 1회로 제한되므로 같은 앱키를 쓰는 클라이언트는
/// `KisOAuth` 하나를 `Arc`로 나눠 씁니다.
pub struct KisKrClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisKrClient {
    /// 인증 관리자를 넘겨받아 생성.
    pub fn new(oauth: KisOAuth) -> Result<Self, ExchangeError> {
        Self::with_shared_oauth(Arc::new(oauth))
    }

    /// 다른 클라이언트와 인증 관리자를 공유하며 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`.
    pub fn with_shared_oauth(oauth: Arc<KisOAuth>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(oauth.config().timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { oauth, client })
    }

    /// 내부 OAuth 참조 반환.
    pub fn oauth(&self) -> &Arc<KisOAuth> {
        &self.oauth
    }

    /// 국내 주식 기간별 일봉 조회.
    ///
    /// 한 번에 최대 100건을 반환합니다. 응답은 최신 일자부터 정렬되어 있습니다.
    ///
    /// # 인자
    /// * `stock_code` - 6자리 종목코드
    /// * `start_date` - 시작일
    /// * `end_date` - 종료일
    pub async fn get_daily_chart(
        &self,
        stock_code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<KrDailyOhlcv>, ExchangeError> {
        let start = start_date.format("%Y%m%d").to_string();
        let end = end_date.format("%Y%m%d").to_string();

        let rows: Vec<KrDailyOhlcv> = self
            .get_chart(
                DAILY_CHART_PATH,
                tr_id::KR_DAILY_CHART,
                &[
                    ("FID_COND_MRKT_DIV_CODE", "J"),
                    ("FID_INPUT_ISCD", stock_code),
                    ("FID_INPUT_DATE_1", &start),
                    ("FID_INPUT_DATE_2", &end),
                    ("FID_PERIOD_DIV_CODE", "D"),
                    ("FID_ORG_ADJ_PRC", "0"), // 0=수정주가
                ],
            )
            .await?;

        // 데이터가 없으면 빈 객체 한 건이 내려오는 경우가 있음
        Ok(rows.into_iter().filter(|r| !r.date.is_empty()).collect())
    }

    /// 국내 주식 일자별 분봉 조회.
    ///
    /// `hour` 시각(포함)부터 과거 방향으로 최대 120개의 1분봉을 반환합니다.
    ///
    /// # 인자
    /// * `stock_code` - 종목코드
    /// * `date` - 조회 일자
    /// * `hour` - 기준 시각
    pub async fn get_minute_chart_by_date(
        &self,
        stock_code: &str,
        date: NaiveDate,
        hour: NaiveTime,
    ) -> Result<Vec<KrMinuteOhlcv>, ExchangeError> {
        let date_str = date.format("%Y%m%d").to_string();
        let hour_str = hour.format("%H%M%S").to_string();

        let rows: Vec<KrMinuteOhlcv> = self
            .get_chart(
                MINUTE_CHART_PATH,
                tr_id::KR_MINUTE_CHART_BY_DATE,
                &[
                    ("FID_COND_MRKT_DIV_CODE", "J"),
                    ("FID_INPUT_ISCD", stock_code),
                    ("FID_INPUT_HOUR_1", &hour_str),
                    ("FID_INPUT_DATE_1", &date_str),
                    ("FID_PW_DATA_INCU_YN", "Y"), // 과거 데이터 포함
                    ("FID_FAKE_TICK_INCU_YN", ""),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter(|r| !r.date.is_empty() && !r.time.is_empty())
            .collect())
    }

    /// 차트 조회 공통 처리: 헤더 구성, 상태 코드 확인, `rt_cd` 확인 후 `output2` 반환.
    async fn get_chart<T: DeserializeOwned>(
        &self,
        path: &str,
        tr_id: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ExchangeError> {
        let url = format!("{}{}", self.oauth.config().rest_base_url(), path);
        let headers = self.oauth.build_headers(tr_id).await?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(tr_id, status = status.as_u16(), body = %body, "KIS 시세 조회 실패");
            return Err(ExchangeError::from_http_status(status.as_u16(), &body));
        }

        debug!(tr_id, bytes = body.len(), "KIS 시세 응답 수신");

        let resp: KisChartResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("시세 응답 파싱 실패: {}", e)))?;

        if resp.rt_cd != "0" {
            return Err(ExchangeError::from_kis_message(&resp.msg_cd, &resp.msg1));
        }

        Ok(resp.output2)
    }
}

/// 국내 주식 일봉 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct KrDailyOhlcv {
    /// 영업일자 (YYYYMMDD)
    #[serde(rename = "stck_bsop_date", default)]
    pub date: String,
    /// 시가
    #[serde(rename = "stck_oprc", default, deserialize_with = "deserialize_decimal")]
    pub open: Decimal,
    /// 고가
    #[serde(rename = "stck_hgpr", default, deserialize_with = "deserialize_decimal")]
    pub high: Decimal,
    /// 저가
    #[serde(rename = "stck_lwpr", default, deserialize_with = "deserialize_decimal")]
    pub low: Decimal,
    /// 종가
    #[serde(rename = "stck_clpr", default, deserialize_with = "deserialize_decimal")]
    pub close: Decimal,
    /// 누적 거래량
    #[serde(rename = "acml_vol", default, deserialize_with = "deserialize_volume")]
    pub volume: u64,
}

/// 국내 주식 분봉 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct KrMinuteOhlcv {
    /// 영업일자 (YYYYMMDD)
    #[serde(rename = "stck_bsop_date", default)]
    pub date: String,
    /// 체결 시간 (HHMMSS)
    #[serde(rename = "stck_cntg_hour", default)]
    pub time: String,
    /// 시가
    #[serde(rename = "stck_oprc", default, deserialize_with = "deserialize_decimal")]
    pub open: Decimal,
    /// 고가
    #[serde(rename = "stck_hgpr", default, deserialize_with = "deserialize_decimal")]
    pub high: Decimal,
    /// 저가
    #[serde(rename = "stck_lwpr", default, deserialize_with = "deserialize_decimal")]
    pub low: Decimal,
    /// 현재가 (종가)
    #[serde(rename = "stck_prpr", default, deserialize_with = "deserialize_decimal")]
    pub close: Decimal,
    /// 체결 거래량
    #[serde(rename = "cntg_vol", default, deserialize_with = "deserialize_volume")]
    pub volume: u64,
}

#[derive(Debug, Deserialize)]
struct KisChartResponse<T> {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default = "Vec::new")]
    output2: Vec<T>,
}

/// 숫자 문자열 가격. 빈 값과 "-"는 0.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    if s.is_empty() || s == "-" {
        return Ok(Decimal::ZERO);
    }
    s.parse::<Decimal>()
        .map_err(|_| serde::de::Error::custom(format!("Invalid decimal: {}", s)))
}

/// 문자열 거래량을 u64로 역직렬화.
fn deserialize_volume<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u64>()
        .map_err(|_| serde::de::Error::custom(format!("Invalid volume: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_row_parsing() {
        let json = r#"{
            "stck_bsop_date": "20240105",
            "stck_oprc": "77000",
            "stck_hgpr": "77500",
            "stck_lwpr": "76400",
            "stck_clpr": "76600",
            "acml_vol": "11304316"
        }"#;
        let row: KrDailyOhlcv = serde_json::from_str(json).unwrap();
        assert_eq!(row.date, "20240105");
        assert_eq!(row.close, Decimal::new(76600, 0));
        assert_eq!(row.volume, 11_304_316);
    }

    #[test]
    fn test_empty_row_parsing() {
        let row: KrDailyOhlcv = serde_json::from_str("{}").unwrap();
        assert!(row.date.is_empty());
        assert_eq!(row.open, Decimal::ZERO);
        assert_eq!(row.volume, 0);
    }

    #[test]
    fn test_chart_response_without_output() {
        let json = r#"{"rt_cd": "1", "msg_cd": "EGW00201", "msg1": "초당 거래건수를 초과하였습니다."}"#;
        let resp: KisChartResponse<KrDailyOhlcv> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.rt_cd, "1");
        assert!(resp.output2.is_empty());
    }

    #[test]
    fn test_invalid_volume() {
        let json = r#"{"stck_bsop_date": "20240105", "acml_vol": "12.5"}"#;
        assert!(serde_json::from_str::<KrDailyOhlcv>(json).is_err());
    }
}
