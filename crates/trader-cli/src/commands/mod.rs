//! CLI 서브커맨드.
//!
//! - `analyze`: 지표 계산 및 표/차트 출력
//! - `simulate`: 단일 포지션 신호 시뮬레이션
//! - `sweep`: 이동평균 윈도우 조합 병렬 탐색
//! - `ticker`: 24시간 시세 API 확인

pub mod analyze;
pub mod simulate;
pub mod sweep;
pub mod ticker;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};
use trader_analytics::{
    CrossoverConfig, IndicatorParams, SeriesSource, SimulationConfig, StrategyKind,
};
use trader_core::{Interval, PriceQuery, PriceSeries, TradingCalendar};
use trader_exchange::{create_provider, DataSource, ProviderOptions};

use crate::config::{load_simulation_config, DashboardConfig};

/// 데이터 조회 옵션 (모든 서브커맨드 공통)
#[derive(Debug, Clone, Default, Args)]
pub struct DataArgs {
    /// 데이터 소스 (binance, coinbase, yahoo, file)
    #[arg(long, global = true)]
    pub source: Option<DataSource>,

    /// 심볼 (예: BTCUSDT, BTC-USD, SPY)
    #[arg(short, long, global = true)]
    pub symbol: Option<String>,

    /// 캔들 간격 (1m, 5m, 15m, 1h, 1d)
    #[arg(short, long, global = true)]
    pub interval: Option<Interval>,

    /// 최근 몇 개의 포인트를 조회할지
    #[arg(short, long, global = true)]
    pub limit: Option<usize>,

    /// 로컬 시세 파일 (.csv, .json), `--source file`에서 사용
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// 변동성 연율화 기준 (continuous, exchange)
    #[arg(long, global = true)]
    pub calendar: Option<TradingCalendar>,
}

/// 지표 파라미터 재정의
#[derive(Debug, Clone, Default, Args)]
pub struct IndicatorArgs {
    /// 단기 이동평균 윈도우
    #[arg(long)]
    pub short_window: Option<usize>,

    /// 장기 이동평균 윈도우
    #[arg(long)]
    pub long_window: Option<usize>,

    /// 볼린저 밴드 윈도우
    #[arg(long)]
    pub band_window: Option<usize>,

    /// 볼린저 밴드 표준편차 배수
    #[arg(long)]
    pub band_width: Option<f64>,

    /// 변동성 윈도우
    #[arg(long)]
    pub volatility_window: Option<usize>,

    /// 연율화 계수 (기본: 간격과 거래 시간 체계에서 계산)
    #[arg(long)]
    pub periods_per_year: Option<f64>,
}

impl IndicatorArgs {
    /// 플래그로 지정된 값만 덮어쓰기
    pub fn apply(&self, params: IndicatorParams, default_periods: f64) -> IndicatorParams {
        let short = self.short_window.unwrap_or(params.short_window);
        let long = self.long_window.unwrap_or(params.long_window);
        let band_window = self.band_window.unwrap_or(params.band_window);
        let band_width = self.band_width.unwrap_or(params.band_width);
        let volatility_window = self.volatility_window.unwrap_or(params.volatility_window);
        let periods = self.periods_per_year.unwrap_or(default_periods);

        params
            .with_sma_windows(short, long)
            .with_bands(band_window, band_width)
            .with_volatility(volatility_window, periods)
    }
}

/// 시뮬레이션 설정 재정의
#[derive(Debug, Clone, Default, Args)]
pub struct SimulationArgs {
    /// 전략 (momentum, crossover)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// 초기 자본
    #[arg(long)]
    pub capital: Option<f64>,

    /// 매도 수수료 (%)
    #[arg(long)]
    pub fee: Option<f64>,

    /// 매수 시 투자 비율 (%)
    #[arg(long)]
    pub fraction: Option<f64>,

    /// 매수 차단 변동성 임계값 (연율화, 0.8 = 80%)
    #[arg(long)]
    pub risk_threshold: Option<f64>,

    /// 교차 전략의 빠른 시계열 (price, short_sma, long_sma)
    #[arg(long)]
    pub fast: Option<SeriesSource>,

    /// 교차 전략의 느린 시계열
    #[arg(long)]
    pub slow: Option<SeriesSource>,
}

impl SimulationArgs {
    /// 플래그로 지정된 값만 덮어쓰기
    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(capital) = self.capital {
            config.starting_capital = capital;
        }
        if let Some(fee) = self.fee {
            config = config.with_fee_percent(fee);
        }
        if let Some(fraction) = self.fraction {
            config = config.with_investable_fraction(fraction);
        }
        if let Some(threshold) = self.risk_threshold {
            config = config.with_risk_threshold(threshold);
        }
        if self.fast.is_some() || self.slow.is_some() {
            let crossover = CrossoverConfig::new(
                self.fast.unwrap_or(config.crossover.fast),
                self.slow.unwrap_or(config.crossover.slow),
            );
            config = config.with_crossover(crossover);
        }
        config
    }
}

/// 서브커맨드 실행 컨텍스트
#[derive(Debug, Clone)]
pub struct Context {
    pub dashboard: DashboardConfig,
    pub source: DataSource,
    pub symbol: String,
    pub query: PriceQuery,
    pub calendar: TradingCalendar,
    pub provider_options: ProviderOptions,
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// 환경 설정과 CLI 플래그를 합쳐 컨텍스트 생성
    pub fn resolve(dashboard: DashboardConfig, data: &DataArgs, config_path: Option<PathBuf>) -> Self {
        let source = data.source.unwrap_or(dashboard.source);
        let symbol = data
            .symbol
            .clone()
            .unwrap_or_else(|| dashboard.symbol_for(source));
        let query = PriceQuery::new(
            data.interval.unwrap_or(dashboard.interval),
            data.limit.unwrap_or(dashboard.limit),
        );
        let calendar = data
            .calendar
            .unwrap_or_else(|| dashboard.calendar_for(source));
        let provider_options = ProviderOptions {
            binance_url: dashboard.binance_url.clone(),
            coinbase_url: dashboard.coinbase_url.clone(),
            input: data.input.clone(),
        };

        Self {
            dashboard,
            source,
            symbol,
            query,
            calendar,
            provider_options,
            config_path,
        }
    }

    /// 조회 간격 기준 연율화 계수
    pub fn periods_per_year(&self) -> f64 {
        self.query.interval.periods_per_year(self.calendar)
    }

    /// 설정 파일 또는 환경 기본값에서 시뮬레이션 설정 로드
    pub fn base_simulation_config(&self) -> Result<SimulationConfig> {
        match &self.config_path {
            Some(path) => load_simulation_config(path),
            None => Ok(self.dashboard.simulation_defaults()),
        }
    }

    /// 가격 시계열 조회
    pub async fn fetch_series(&self) -> Result<PriceSeries> {
        let provider = create_provider(self.source, &self.provider_options)?;

        info!(
            provider = provider.provider_name(),
            symbol = %self.symbol,
            interval = %self.query.interval,
            limit = self.query.limit,
            "시세 조회 시작"
        );

        match provider.fetch_price_series(&self.symbol, &self.query).await {
            Ok(series) => Ok(series),
            Err(e) => {
                warn!(
                    provider = provider.provider_name(),
                    symbol = %self.symbol,
                    error = %e,
                    "시세 조회 실패"
                );
                Err(e).with_context(|| format!("{} 시세를 가져오지 못했습니다", self.symbol))
            }
        }
    }
}

/// 결과를 JSON 파일로 저장
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "결과 저장 완료");
    Ok(())
}
