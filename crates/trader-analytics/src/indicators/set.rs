//! 지표 묶음.
//!
//! 한 번의 분석/시뮬레이션에 필요한 지표를 한 번에 계산하여
//! 표시 계층과 시뮬레이터가 같은 계산 결과를 공유하도록 합니다.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trader_core::{CoreError, CoreResult, PriceSeries, RollingSeries, MINUTES_PER_YEAR};

use super::moving_average::{
    bollinger_bands, simple_moving_average, BollingerBands, DEFAULT_BAND_WIDTH,
};
use super::volatility::{annualized_volatility, realized_volatility};

/// 지표 파라미터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// 단기 이동평균 윈도우
    #[serde(default = "default_short_window")]
    pub short_window: usize,

    /// 장기 이동평균 윈도우
    #[serde(default = "default_long_window")]
    pub long_window: usize,

    /// 볼린저 밴드 윈도우
    #[serde(default = "default_band_window")]
    pub band_window: usize,

    /// 볼린저 밴드 표준편차 배수
    #[serde(default = "default_band_width")]
    pub band_width: f64,

    /// 변동성 윈도우 (수익률 개수)
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    /// 연율화 계수 (1분봉 암호화폐 = 525,600)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
}

fn default_short_window() -> usize {
    20
}
fn default_long_window() -> usize {
    50
}
fn default_band_window() -> usize {
    120
}
fn default_band_width() -> f64 {
    DEFAULT_BAND_WIDTH
}
fn default_volatility_window() -> usize {
    60
}
fn default_periods_per_year() -> f64 {
    MINUTES_PER_YEAR
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
            band_window: default_band_window(),
            band_width: default_band_width(),
            volatility_window: default_volatility_window(),
            periods_per_year: default_periods_per_year(),
        }
    }
}

impl IndicatorParams {
    /// 이동평균 윈도우 설정
    pub fn with_sma_windows(mut self, short: usize, long: usize) -> Self {
        self.short_window = short;
        self.long_window = long;
        self
    }

    /// 볼린저 밴드 설정
    pub fn with_bands(mut self, window: usize, width: f64) -> Self {
        self.band_window = window;
        self.band_width = width;
        self
    }

    /// 변동성 설정
    pub fn with_volatility(mut self, window: usize, periods_per_year: f64) -> Self {
        self.volatility_window = window;
        self.periods_per_year = periods_per_year;
        self
    }

    /// 파라미터 검증
    pub fn validate(&self) -> CoreResult<()> {
        for (name, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("band_window", self.band_window),
            ("volatility_window", self.volatility_window),
        ] {
            if window == 0 {
                return Err(CoreError::invalid(format!("{}은 1 이상이어야 합니다", name)));
            }
        }
        if !self.band_width.is_finite() || self.band_width < 0.0 {
            return Err(CoreError::invalid(format!(
                "band_width는 0 이상이어야 합니다: {}",
                self.band_width
            )));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(CoreError::invalid(format!(
                "periods_per_year는 양수여야 합니다: {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}

/// 한 시계열에 대한 지표 계산 결과.
///
/// 모든 `RollingSeries`는 입력 시계열과 길이가 같습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// 계산에 사용한 파라미터
    pub params: IndicatorParams,
    /// 단기 이동평균
    pub short_sma: RollingSeries,
    /// 장기 이동평균
    pub long_sma: RollingSeries,
    /// 볼린저 밴드
    pub bands: BollingerBands,
    /// 롤링 연율화 변동성
    pub volatility: RollingSeries,
    /// 전체 구간 실현 변동성
    pub realized_volatility: Option<f64>,
}

impl IndicatorSet {
    /// 지표 일괄 계산.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> CoreResult<Self> {
        params.validate()?;
        let prices = series.prices();

        let set = Self {
            params: params.clone(),
            short_sma: simple_moving_average(&prices, params.short_window)?,
            long_sma: simple_moving_average(&prices, params.long_window)?,
            bands: bollinger_bands(&prices, params.band_window, params.band_width)?,
            volatility: annualized_volatility(
                &prices,
                params.volatility_window,
                params.periods_per_year,
            )?,
            realized_volatility: realized_volatility(&prices, params.periods_per_year),
        };

        debug!(
            symbol = series.symbol(),
            points = prices.len(),
            short_defined = set.short_sma.defined_count(),
            long_defined = set.long_sma.defined_count(),
            "지표 계산 완료"
        );
        Ok(set)
    }

    /// 지표 길이 (입력 시계열 길이)
    pub fn len(&self) -> usize {
        self.short_sma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short_sma.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = IndicatorParams::default();
        assert_eq!(params.short_window, 20);
        assert_eq!(params.long_window, 50);
        assert_eq!(params.band_window, 120);
        assert_eq!(params.band_width, 2.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_partial_deserialize() {
        let params: IndicatorParams = serde_json::from_str(r#"{"short_window": 5}"#).unwrap();
        assert_eq!(params.short_window, 5);
        assert_eq!(params.long_window, 50);
        assert_eq!(params.periods_per_year, 525_600.0);
    }

    #[test]
    fn test_params_validation() {
        assert!(IndicatorParams::default()
            .with_sma_windows(0, 10)
            .validate()
            .is_err());
        assert!(IndicatorParams::default()
            .with_bands(10, -0.5)
            .validate()
            .is_err());
        assert!(IndicatorParams::default()
            .with_volatility(10, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_compute_aligned_lengths() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.5).sin()).collect();
        let series = PriceSeries::from_prices("TEST", &prices).unwrap();
        let params = IndicatorParams::default()
            .with_sma_windows(3, 5)
            .with_bands(10, 2.0)
            .with_volatility(5, 252.0);

        let set = IndicatorSet::compute(&series, &params).unwrap();
        assert_eq!(set.len(), 40);
        assert_eq!(set.long_sma.len(), 40);
        assert_eq!(set.bands.len(), 40);
        assert_eq!(set.volatility.len(), 40);
        assert_eq!(set.short_sma.first_defined_index(), Some(2));
        assert_eq!(set.long_sma.first_defined_index(), Some(4));
        assert_eq!(set.volatility.first_defined_index(), Some(5));
        assert!(set.realized_volatility.is_some());
    }
}
