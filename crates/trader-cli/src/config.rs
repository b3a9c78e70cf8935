//! 환경변수 기반 대시보드 설정 및 시뮬레이션 설정 파일 로더.
//!
//! 우선순위: CLI 플래그 > 설정 파일(`--config`) > `DASHBOARD_*` 환경변수 > 기본값

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use trader_analytics::SimulationConfig;
use trader_core::{Interval, TradingCalendar};
use trader_exchange::DataSource;

/// 대시보드 기본 설정
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// 데이터 소스
    pub source: DataSource,
    /// 심볼 (없으면 소스별 기본 심볼)
    pub symbol: Option<String>,
    /// 캔들 간격
    pub interval: Interval,
    /// 조회 개수
    pub limit: usize,
    /// 변동성 연율화 기준 (없으면 소스에 따라 결정)
    pub calendar: Option<TradingCalendar>,
    /// Binance base URL 재정의
    pub binance_url: Option<String>,
    /// Coinbase base URL 재정의
    pub coinbase_url: Option<String>,
    /// 초기 자본
    pub starting_capital: f64,
    /// 거래 수수료 (%)
    pub fee_percent: f64,
    /// 매수 시 투자 비율 (%)
    pub investable_fraction: f64,
    /// 표에 출력할 최근 행 수
    pub table_rows: usize,
    /// 차트 너비 (픽셀)
    pub chart_width: u32,
    /// 차트 높이 (픽셀)
    pub chart_height: u32,
    /// JSON 로그 출력
    pub log_json: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Binance,
            symbol: None,
            interval: Interval::Minute1,
            limit: 1440,
            calendar: None,
            binance_url: None,
            coinbase_url: None,
            starting_capital: 10_000.0,
            fee_percent: 0.1,
            investable_fraction: 100.0,
            table_rows: 20,
            chart_width: 1600,
            chart_height: 1000,
            log_json: false,
        }
    }
}

impl DashboardConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            source: env_var_parse("DASHBOARD_SOURCE", defaults.source),
            symbol: std::env::var("DASHBOARD_SYMBOL").ok(),
            interval: env_var_parse("DASHBOARD_INTERVAL", defaults.interval),
            limit: env_var_parse("DASHBOARD_LIMIT", defaults.limit),
            calendar: std::env::var("DASHBOARD_CALENDAR")
                .ok()
                .and_then(|v| v.parse().ok()),
            binance_url: std::env::var("BINANCE_BASE_URL").ok(),
            coinbase_url: std::env::var("COINBASE_BASE_URL").ok(),
            starting_capital: env_var_parse(
                "DASHBOARD_STARTING_CAPITAL",
                defaults.starting_capital,
            ),
            fee_percent: env_var_parse("DASHBOARD_FEE_PERCENT", defaults.fee_percent),
            investable_fraction: env_var_parse(
                "DASHBOARD_INVESTABLE_FRACTION",
                defaults.investable_fraction,
            ),
            table_rows: env_var_parse("DASHBOARD_TABLE_ROWS", defaults.table_rows),
            chart_width: env_var_parse("DASHBOARD_CHART_WIDTH", defaults.chart_width),
            chart_height: env_var_parse("DASHBOARD_CHART_HEIGHT", defaults.chart_height),
            log_json: env_var_bool("DASHBOARD_LOG_JSON", false)
                || std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// 연율화 기준 결정. 주식 시세(Yahoo)는 정규장, 나머지는 24시간 시장.
    pub fn calendar_for(&self, source: DataSource) -> TradingCalendar {
        self.calendar.unwrap_or(match source {
            DataSource::Yahoo => TradingCalendar::Exchange,
            _ => TradingCalendar::Continuous,
        })
    }

    /// 소스별 기본 심볼
    pub fn symbol_for(&self, source: DataSource) -> String {
        self.symbol.clone().unwrap_or_else(|| {
            match source {
                DataSource::Binance => "BTCUSDT",
                DataSource::Coinbase => "BTC-USD",
                DataSource::Yahoo => "SPY",
                DataSource::File => "LOCAL",
            }
            .to_string()
        })
    }

    /// 설정 파일이 없을 때 사용할 시뮬레이션 기본값
    pub fn simulation_defaults(&self) -> SimulationConfig {
        SimulationConfig::new(self.starting_capital)
            .with_fee_percent(self.fee_percent)
            .with_investable_fraction(self.investable_fraction)
    }
}

/// 시뮬레이션 설정 파일 로드 (.toml 또는 .json).
///
/// 누락된 필드는 기본값으로 채워지며, 로드 직후 검증합니다.
pub fn load_simulation_config(path: &Path) -> Result<SimulationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path.display()))?;

    let config: SimulationConfig = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)?
    } else if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)?
    } else {
        return Err(anyhow!(
            "지원하지 않는 설정 형식입니다. .toml 또는 .json 사용: {}",
            path.display()
        ));
    };

    config.validate()?;
    Ok(config)
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use trader_analytics::StrategyKind;

    use super::*;

    #[test]
    fn test_env_var_parse_fallback() {
        std::env::set_var("DASHBOARD_TEST_ROWS", "42");
        std::env::set_var("DASHBOARD_TEST_BAD", "many");
        assert_eq!(env_var_parse("DASHBOARD_TEST_ROWS", 20usize), 42);
        assert_eq!(env_var_parse("DASHBOARD_TEST_BAD", 20usize), 20);
        assert_eq!(env_var_parse("DASHBOARD_TEST_MISSING", 1.5f64), 1.5);
        assert!(!env_var_bool("DASHBOARD_TEST_MISSING", false));
    }

    #[test]
    fn test_calendar_for_source() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.calendar_for(DataSource::Yahoo),
            TradingCalendar::Exchange
        );
        assert_eq!(
            config.calendar_for(DataSource::Binance),
            TradingCalendar::Continuous
        );

        let forced = DashboardConfig {
            calendar: Some(TradingCalendar::Exchange),
            ..Default::default()
        };
        assert_eq!(
            forced.calendar_for(DataSource::Coinbase),
            TradingCalendar::Exchange
        );
    }

    #[test]
    fn test_symbol_for_source() {
        let config = DashboardConfig::default();
        assert_eq!(config.symbol_for(DataSource::Coinbase), "BTC-USD");
        assert_eq!(config.symbol_for(DataSource::Binance), "BTCUSDT");

        let pinned = DashboardConfig {
            symbol: Some("ETHUSDT".to_string()),
            ..Default::default()
        };
        assert_eq!(pinned.symbol_for(DataSource::Coinbase), "ETHUSDT");
    }

    #[test]
    fn test_load_toml_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "starting_capital = 500.0\nstrategy = \"crossover\"\n\n[indicators]\nshort_window = 5\nlong_window = 30"
        )
        .unwrap();

        let config = load_simulation_config(file.path()).unwrap();
        assert_eq!(config.starting_capital, 500.0);
        assert_eq!(config.strategy, StrategyKind::Crossover);
        assert_eq!(config.indicators.short_window, 5);
        assert_eq!(config.indicators.band_window, 120);
        assert_eq!(config.investable_fraction, 100.0);
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"fee_percent": 150.0}}"#).unwrap();
        assert!(load_simulation_config(file.path()).is_err());

        let yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(load_simulation_config(yaml.path()).is_err());
    }
}
