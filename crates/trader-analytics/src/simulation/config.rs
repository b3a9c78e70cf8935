//! 시뮬레이션 설정.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trader_core::{CoreError, CoreResult};

use super::strategy::{CrossoverRule, MomentumRule, SeriesSource, SignalRule};
use crate::indicators::IndicatorParams;

/// 전략 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// 직전 가격 대비 상승 시 매수, 하락 시 매도
    #[default]
    Momentum,
    /// 빠른 시계열이 느린 시계열을 상향/하향 돌파할 때 매수/매도
    Crossover,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::Crossover => "crossover",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momentum" | "price_change" => Ok(StrategyKind::Momentum),
            "crossover" | "sma_crossover" | "ma_cross" => Ok(StrategyKind::Crossover),
            other => Err(CoreError::invalid(format!(
                "알 수 없는 전략: {} (지원: momentum, crossover)",
                other
            ))),
        }
    }
}

/// 교차 전략 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverConfig {
    /// 빠른 시계열
    #[serde(default = "default_fast")]
    pub fast: SeriesSource,
    /// 느린 시계열
    #[serde(default = "default_slow")]
    pub slow: SeriesSource,
}

fn default_fast() -> SeriesSource {
    SeriesSource::ShortSma
}
fn default_slow() -> SeriesSource {
    SeriesSource::LongSma
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            slow: default_slow(),
        }
    }
}

impl CrossoverConfig {
    pub fn new(fast: SeriesSource, slow: SeriesSource) -> Self {
        Self { fast, slow }
    }

    /// 단기 이동평균과 가격의 교차
    pub fn sma_vs_price() -> Self {
        Self::new(SeriesSource::ShortSma, SeriesSource::Price)
    }
}

/// 시뮬레이션 설정.
///
/// 코어는 환경 변수나 전역 상태를 읽지 않으며, 모든 파라미터는 이 값으로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 초기 자본
    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,

    /// 매수 시 투입할 현금 비율 (%, 0~100)
    #[serde(default = "default_investable_fraction")]
    pub investable_fraction: f64,

    /// 매도 수수료 (%, 0~100)
    #[serde(default = "default_fee_percent")]
    pub fee_percent: f64,

    /// 전략 종류
    #[serde(default)]
    pub strategy: StrategyKind,

    /// 교차 전략 설정
    #[serde(default)]
    pub crossover: CrossoverConfig,

    /// 매수 차단 변동성 임계값 (연율화, 0.8 = 80%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_threshold: Option<f64>,

    /// 지표 파라미터
    #[serde(default)]
    pub indicators: IndicatorParams,
}

fn default_starting_capital() -> f64 {
    10_000.0
}
fn default_investable_fraction() -> f64 {
    100.0
}
fn default_fee_percent() -> f64 {
    0.1
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_capital: default_starting_capital(),
            investable_fraction: default_investable_fraction(),
            fee_percent: default_fee_percent(),
            strategy: StrategyKind::default(),
            crossover: CrossoverConfig::default(),
            risk_threshold: None,
            indicators: IndicatorParams::default(),
        }
    }
}

impl SimulationConfig {
    /// 초기 자본으로 설정 생성
    pub fn new(starting_capital: f64) -> Self {
        Self {
            starting_capital,
            ..Default::default()
        }
    }

    /// 투자 비율 설정 (%)
    pub fn with_investable_fraction(mut self, pct: f64) -> Self {
        self.investable_fraction = pct;
        self
    }

    /// 매도 수수료 설정 (%)
    pub fn with_fee_percent(mut self, pct: f64) -> Self {
        self.fee_percent = pct;
        self
    }

    /// 전략 설정
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// 교차 전략 시계열 설정
    pub fn with_crossover(mut self, crossover: CrossoverConfig) -> Self {
        self.crossover = crossover;
        self
    }

    /// 변동성 임계값 설정
    pub fn with_risk_threshold(mut self, threshold: f64) -> Self {
        self.risk_threshold = Some(threshold);
        self
    }

    /// 지표 파라미터 설정
    pub fn with_indicators(mut self, indicators: IndicatorParams) -> Self {
        self.indicators = indicators;
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> CoreResult<()> {
        if !self.starting_capital.is_finite() || self.starting_capital <= 0.0 {
            return Err(CoreError::invalid(format!(
                "초기 자본은 0보다 커야 합니다: {}",
                self.starting_capital
            )));
        }
        if !(0.0..=100.0).contains(&self.investable_fraction) {
            return Err(CoreError::invalid(format!(
                "투자 비율은 0~100 사이여야 합니다: {}",
                self.investable_fraction
            )));
        }
        if !(0.0..=100.0).contains(&self.fee_percent) {
            return Err(CoreError::invalid(format!(
                "수수료는 0~100 사이여야 합니다: {}",
                self.fee_percent
            )));
        }
        if let Some(threshold) = self.risk_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(CoreError::invalid(format!(
                    "변동성 임계값은 0 이상이어야 합니다: {}",
                    threshold
                )));
            }
        }
        if self.strategy == StrategyKind::Crossover && self.crossover.fast == self.crossover.slow {
            return Err(CoreError::invalid(format!(
                "교차 전략의 두 시계열이 같습니다: {}",
                self.crossover.fast
            )));
        }
        self.indicators.validate()
    }

    /// 설정된 전략의 신호 규칙 생성
    pub fn build_rule(&self) -> Box<dyn SignalRule> {
        match self.strategy {
            StrategyKind::Momentum => Box::new(MomentumRule),
            StrategyKind::Crossover => {
                Box::new(CrossoverRule::new(self.crossover.fast, self.crossover.slow))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.starting_capital, 10_000.0);
        assert_eq!(config.investable_fraction, 100.0);
        assert_eq!(config.fee_percent, 0.1);
        assert_eq!(config.strategy, StrategyKind::Momentum);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        assert!(SimulationConfig::new(0.0).validate().is_err());
        assert!(SimulationConfig::new(f64::NAN).validate().is_err());
        assert!(SimulationConfig::default()
            .with_fee_percent(150.0)
            .validate()
            .is_err());
        assert!(SimulationConfig::default()
            .with_investable_fraction(-1.0)
            .validate()
            .is_err());
        assert!(SimulationConfig::default()
            .with_risk_threshold(-0.1)
            .validate()
            .is_err());
        assert!(SimulationConfig::default()
            .with_strategy(StrategyKind::Crossover)
            .with_crossover(CrossoverConfig::new(SeriesSource::Price, SeriesSource::Price))
            .validate()
            .is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "Momentum".parse::<StrategyKind>().unwrap(),
            StrategyKind::Momentum
        );
        assert_eq!(
            "sma_crossover".parse::<StrategyKind>().unwrap(),
            StrategyKind::Crossover
        );
        assert!("grid".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_toml_config_with_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            starting_capital = 500.0
            strategy = "crossover"

            [crossover]
            slow = "price"

            [indicators]
            short_window = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.starting_capital, 500.0);
        assert_eq!(config.fee_percent, 0.1);
        assert_eq!(config.strategy, StrategyKind::Crossover);
        assert_eq!(config.crossover, CrossoverConfig::sma_vs_price());
        assert_eq!(config.indicators.short_window, 5);
        assert_eq!(config.indicators.long_window, 50);
        assert_eq!(config.build_rule().name(), "crossover");
    }
}
