//! KIS 커넥터 통합 테스트 (mockito HTTP 서버 사용).

use chrono::NaiveDate;
use mockito::Matcher;
use pricevault_core::{DailyRange, MinuteRange, PriceProvider, ProviderError};
use pricevault_exchange::kis::{KisConfig, KisEnvironment, KisKrClient, KisOAuth, KisPriceProvider};
use rust_decimal_macros::dec;

const DAILY_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice";
const MINUTE_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-time-dailychartprice";

fn provider_for(server: &mockito::Server) -> KisPriceProvider {
    let config = KisConfig::new(
        "test-app-key".to_string(),
        "test-app-secret".to_string(),
        KisEnvironment::Real,
    )
    .with_base_url(server.url());
    let oauth = KisOAuth::new(config).unwrap();
    KisPriceProvider::new(KisKrClient::new(oauth).unwrap())
}

async fn mock_token(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("POST", "/oauth2/tokenP")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "access_token": "issued-token",
                "token_type": "Bearer",
                "expires_in": 86400,
                "access_token_token_expired": "2099-12-31 23:59:59"
            }"#,
        )
        .expect(1)
        .create_async()
        .await
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[tokio::test]
async fn test_fetch_daily_parses_and_sorts() {
    let mut server = mockito::Server::new_async().await;
    let token = mock_token(&mut server).await;
    let daily = server
        .mock("GET", DAILY_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("FID_INPUT_ISCD".into(), "005930".into()),
            Matcher::UrlEncoded("FID_INPUT_DATE_1".into(), "20240102".into()),
            Matcher::UrlEncoded("FID_INPUT_DATE_2".into(), "20240105".into()),
            Matcher::UrlEncoded("FID_PERIOD_DIV_CODE".into(), "D".into()),
        ]))
        .match_header("tr_id", "FHKST03010100")
        .match_header("authorization", "Bearer issued-token")
        .with_status(200)
        .with_body(
            r#"{
                "rt_cd": "0", "msg_cd": "MCA00000", "msg1": "정상처리 되었습니다.",
                "output2": [
                    {"stck_bsop_date": "20240105", "stck_oprc": "77000", "stck_hgpr": "77500",
                     "stck_lwpr": "76400", "stck_clpr": "76600", "acml_vol": "11304316"},
                    {"stck_bsop_date": "20240104", "stck_oprc": "76100", "stck_hgpr": "77300",
                     "stck_lwpr": "76000", "stck_clpr": "77000", "acml_vol": "15324439"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let provider = provider_for(&server);
    let range = DailyRange::new(d(2024, 1, 2), d(2024, 1, 5)).unwrap();
    let bars = provider.fetch_daily("005930", range).await.unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, d(2024, 1, 4));
    assert_eq!(bars[1].date, d(2024, 1, 5));
    assert_eq!(bars[1].close, dec!(76600));
    assert_eq!(bars[1].volume, 11_304_316);
    assert_eq!(bars[0].symbol, "005930");

    token.assert_async().await;
    daily.assert_async().await;
}

#[tokio::test]
async fn test_fetch_daily_empty_output_is_ok() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _daily = server
        .mock("GET", DAILY_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"rt_cd": "0", "msg_cd": "MCA00000", "msg1": "", "output2": [{}]}"#)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let range = DailyRange::new(d(1990, 1, 2), d(1990, 3, 5)).unwrap();
    let bars = provider.fetch_daily("005930", range).await.unwrap();
    assert!(bars.is_empty());
}

#[tokio::test]
async fn test_rate_limit_message_is_classified() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _daily = server
        .mock("GET", DAILY_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"rt_cd": "1", "msg_cd": "EGW00201", "msg1": "초당 거래건수를 초과하였습니다."}"#)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let range = DailyRange::single(d(2024, 1, 5));
    let err = provider.fetch_daily("005930", range).await.unwrap_err();
    assert!(err.is_rate_limited(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_http_429_is_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _daily = server
        .mock("GET", DAILY_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let err = provider
        .fetch_daily("005930", DailyRange::single(d(2024, 1, 5)))
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_api_error_is_not_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _daily = server
        .mock("GET", DAILY_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"rt_cd": "7", "msg_cd": "OPSQ0002", "msg1": "없는 서비스 코드 입니다"}"#)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let err = provider
        .fetch_daily("005930", DailyRange::single(d(2024, 1, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Api { ref code, .. } if code == "OPSQ0002"));
}

#[tokio::test]
async fn test_fetch_minute_filters_to_window() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let minute = server
        .mock("GET", MINUTE_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("FID_INPUT_DATE_1".into(), "20240105".into()),
            Matcher::UrlEncoded("FID_INPUT_HOUR_1".into(), "090200".into()),
        ]))
        .match_header("tr_id", "FHKST03010230")
        .with_status(200)
        .with_body(
            r#"{
                "rt_cd": "0", "msg_cd": "MCA00000", "msg1": "",
                "output2": [
                    {"stck_bsop_date": "20240105", "stck_cntg_hour": "090200", "stck_prpr": "77050",
                     "stck_oprc": "77000", "stck_hgpr": "77100",
                     "stck_lwpr": "76950", "cntg_vol": "300"},
                    {"stck_bsop_date": "20240105", "stck_cntg_hour": "090100", "stck_prpr": "77000",
                     "stck_oprc": "76900", "stck_hgpr": "77000",
                     "stck_lwpr": "76900", "cntg_vol": "250"},
                    {"stck_bsop_date": "20240105", "stck_cntg_hour": "090000", "stck_prpr": "76900",
                     "stck_oprc": "76800", "stck_hgpr": "76900",
                     "stck_lwpr": "76800", "cntg_vol": "900"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let provider = provider_for(&server);
    let day = d(2024, 1, 5);
    let range = MinuteRange::new(
        day.and_hms_opt(9, 1, 0).unwrap(),
        day.and_hms_opt(9, 2, 0).unwrap(),
    )
    .unwrap();
    let bars = provider.fetch_minute("005930", range).await.unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].timestamp, day.and_hms_opt(9, 1, 0).unwrap());
    assert_eq!(bars[1].close, dec!(77050));
    minute.assert_async().await;
}

#[tokio::test]
async fn test_fetch_minute_rejects_multi_day_range() {
    let server = mockito::Server::new_async().await;
    let provider = provider_for(&server);
    let range = MinuteRange::new(
        d(2024, 1, 4).and_hms_opt(15, 0, 0).unwrap(),
        d(2024, 1, 5).and_hms_opt(9, 30, 0).unwrap(),
    )
    .unwrap();

    let err = provider.fetch_minute("005930", range).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_invalid_credentials_surface_as_authentication() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/tokenP")
        .with_status(403)
        .with_body(r#"{"error_code": "EGW00103", "error_description": "유효하지 않은 AppKey입니다."}"#)
        .create_async()
        .await;

    let provider = provider_for(&server);
    let err = provider
        .fetch_daily("005930", DailyRange::single(d(2024, 1, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Authentication(_)));
}
