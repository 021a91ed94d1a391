//! PriceVault 수집기 CLI.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricevault_collector::modules::{self, parse_date};
use pricevault_collector::CollectorContext;
use pricevault_core::{init_logging, AppConfig, LogConfig, LogFormat, YearMonth};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pricevault-collector")]
#[command(about = "PriceVault historical price collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (기본: config/default.toml, 없으면 무시)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 한 종목의 일봉 구간을 채움
    FetchDaily {
        symbol: String,
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },

    /// 한 종목의 분봉 구간을 수집
    FetchMinute {
        symbol: String,
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },

    /// 저장된 일봉의 완결성 검사
    Check {
        symbol: String,
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },

    /// 저장된 일봉 출력 (JSON)
    LoadDaily {
        symbol: String,
        /// 출력 파일 (기본: 표준 출력)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 저장된 분봉 출력 (JSON)
    LoadMinute {
        symbol: String,
        /// 월별 파티션 (YYYYMM, 기본: 전체)
        #[arg(long)]
        month: Option<YearMonth>,
        /// 출력 파일 (기본: 표준 출력)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 종목 목록의 일봉 일괄 수집 (기본: 최근 5년)
    BulkDaily {
        /// 종목 목록 파일 (상장 종목 CSV 또는 한 줄에 하나)
        #[arg(long)]
        symbols: PathBuf,
        #[arg(long, value_parser = parse_date, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// 종목 목록의 분봉 일괄 수집 (기본: 최근 1년)
    BulkMinute {
        /// 종목 목록 파일 (상장 종목 CSV 또는 한 줄에 하나)
        #[arg(long)]
        symbols: PathBuf,
        #[arg(long, value_parser = parse_date, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// 상장 종목 전체의 최근 10년 일봉 수집
    FetchAllDaily {
        /// 상장 종목 CSV (Code,ISIN,Name,SecurityType[,ListedOn])
        #[arg(long)]
        listings: PathBuf,
        /// 기준일 (기본: 오늘)
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },

    /// 평일 거래일 달력 CSV 생성
    GenerateCalendar {
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
        /// 출력 파일 (기본: 설정의 calendar.path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format.to_string();
    }
    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("PriceVault Collector 시작");

    if let Commands::GenerateCalendar { from, to, output } = &cli.command {
        let output = output.clone().unwrap_or_else(|| config.calendar.path.clone());
        modules::generate_calendar(*from, *to, &output)?;
        return Ok(());
    }

    let ctx = CollectorContext::open(config).context("거래일 달력 또는 아카이브를 열 수 없음")?;

    match cli.command {
        Commands::FetchDaily { symbol, from, to } => {
            let report = modules::fetch_daily(&ctx, &symbol, from, to).await?;
            if report.is_incomplete() {
                tracing::warn!(symbol = %symbol, "수집 후에도 불완전 (상위 이력 부족 가능)");
            }
        }
        Commands::FetchMinute { symbol, from, to } => {
            modules::fetch_minute(&ctx, &symbol, from, to).await?;
        }
        Commands::Check { symbol, from, to } => {
            modules::check(&ctx, &symbol, from, to).await?;
        }
        Commands::LoadDaily { symbol, output } => {
            modules::load_daily(&ctx, &symbol, output.as_deref()).await?;
        }
        Commands::LoadMinute { symbol, month, output } => {
            modules::load_minute(&ctx, &symbol, month, output.as_deref()).await?;
        }
        Commands::BulkDaily { symbols, from, to } => {
            modules::bulk_daily(&ctx, &symbols, from.zip(to)).await?;
        }
        Commands::BulkMinute { symbols, from, to } => {
            modules::bulk_minute(&ctx, &symbols, from.zip(to)).await?;
        }
        Commands::FetchAllDaily { listings, to } => {
            modules::fetch_all_daily(&ctx, &listings, to).await?;
        }
        Commands::GenerateCalendar { .. } => {}
    }

    tracing::info!("PriceVault Collector 종료");
    Ok(())
}
