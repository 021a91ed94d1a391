//! 설정으로부터 파이프라인 구성 요소를 조립합니다.
//!
//! 제공자 인증 정보가 필요 없는 명령(조회, 검사, 달력 생성)은 달력과
//! 아카이브만 엽니다.

use crate::{CollectorError, Result};
use pricevault_core::AppConfig;
use pricevault_data::listing::listing_dates;
use pricevault_data::{Archive, HistoricalPipeline, LocalArchive, StockListing, TradingCalendar};
use pricevault_exchange::{KisConfig, KisEnvironment, KisKrClient, KisOAuth, KisPriceProvider};
use std::sync::Arc;

/// 명령 실행에 필요한 공유 구성 요소.
pub struct CollectorContext {
    pub config: AppConfig,
    pub calendar: Arc<TradingCalendar>,
    pub archive: Archive,
}

impl CollectorContext {
    /// 달력과 로컬 아카이브를 엽니다.
    ///
    /// 달력을 읽지 못하면 실패합니다. 거래일 판단 없이 진행하지 않습니다.
    pub fn open(config: AppConfig) -> Result<Self> {
        let calendar = TradingCalendar::from_csv_path(&config.calendar.path)?
            .with_scan_horizon(config.calendar.scan_horizon_days);
        let archive = Archive::new(Arc::new(LocalArchive::new(&config.archive.root)));

        tracing::debug!(
            calendar = %config.calendar.path.display(),
            archive = %config.archive.root.display(),
            "수집기 컨텍스트 준비 완료"
        );

        Ok(Self {
            config,
            calendar: Arc::new(calendar),
            archive,
        })
    }

    /// KIS 제공자를 연결한 파이프라인을 만듭니다.
    ///
    /// # Errors
    /// KIS 인증 정보 환경 변수가 없거나 HTTP 클라이언트를 만들 수 없으면 실패.
    pub fn pipeline(&self) -> Result<HistoricalPipeline> {
        let environment: KisEnvironment = self
            .config
            .kis
            .environment
            .parse()
            .map_err(CollectorError::Config)?;
        let kis_config =
            KisConfig::from_env(environment)?.with_timeout_secs(self.config.kis.timeout_secs);
        let client = KisKrClient::new(KisOAuth::new(kis_config)?)?;
        let provider = Arc::new(KisPriceProvider::new(client));

        tracing::info!(environment = ?environment, "KIS 제공자 연결");

        Ok(HistoricalPipeline::new(
            provider,
            self.archive.clone(),
            self.calendar.clone(),
            self.config.pipeline.clone(),
        )?)
    }

    /// 상장일을 반영한 파이프라인을 만듭니다.
    pub fn pipeline_with_listings(&self, listings: &[StockListing]) -> Result<HistoricalPipeline> {
        let dates = listing_dates(listings);
        tracing::info!(listings = listings.len(), with_listing_date = dates.len(), "상장 종목 로드");
        Ok(self.pipeline()?.with_listing_dates(dates))
    }
}
