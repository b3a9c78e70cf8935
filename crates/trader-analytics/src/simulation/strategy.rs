//! 신호 규칙.
//!
//! 각 규칙은 인덱스 `i`에서 매수/매도/관망 신호만 판단하며, 포지션 상태에 따른
//! 실제 체결 여부는 시뮬레이터가 결정합니다.
//!
//! ```text
//! Momentum : price[i] > price[i-1] → Buy,  price[i] < price[i-1] → Sell
//! Crossover: (fast - slow) ≤ 0 → > 0 → Buy,  ≥ 0 → < 0 → Sell
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trader_core::CoreError;

use crate::indicators::IndicatorSet;

/// 규칙 판단 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

/// 규칙 판단에 필요한 데이터.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    /// 현재 인덱스 (항상 1 이상)
    pub index: usize,
    /// 전체 가격 배열
    pub prices: &'a [f64],
    /// 미리 계산된 지표
    pub indicators: &'a IndicatorSet,
}

impl<'a> SignalContext<'a> {
    /// 현재 가격
    pub fn price(&self) -> f64 {
        self.prices[self.index]
    }

    /// 직전 가격
    pub fn previous_price(&self) -> f64 {
        self.prices[self.index - 1]
    }
}

/// 교차 전략에서 비교할 시계열.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    /// 가격
    Price,
    /// 단기 이동평균
    ShortSma,
    /// 장기 이동평균
    LongSma,
}

impl SeriesSource {
    /// 인덱스의 값 (정의되지 않으면 None)
    pub fn value_at(&self, ctx: &SignalContext<'_>, index: usize) -> Option<f64> {
        match self {
            SeriesSource::Price => ctx.prices.get(index).copied(),
            SeriesSource::ShortSma => ctx.indicators.short_sma.get(index),
            SeriesSource::LongSma => ctx.indicators.long_sma.get(index),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesSource::Price => "price",
            SeriesSource::ShortSma => "short_sma",
            SeriesSource::LongSma => "long_sma",
        }
    }
}

impl std::fmt::Display for SeriesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "price" | "close" => Ok(SeriesSource::Price),
            "short_sma" | "short" => Ok(SeriesSource::ShortSma),
            "long_sma" | "long" => Ok(SeriesSource::LongSma),
            other => Err(CoreError::invalid(format!(
                "알 수 없는 시계열: {} (지원: price, short_sma, long_sma)",
                other
            ))),
        }
    }
}

/// 신호 규칙 trait.
pub trait SignalRule: Send + Sync {
    /// 규칙 이름
    fn name(&self) -> &str;

    /// 인덱스 `ctx.index`에서의 신호 판단
    fn evaluate(&self, ctx: &SignalContext<'_>) -> Decision;
}

/// 가격 모멘텀 규칙.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumRule;

impl SignalRule for MomentumRule {
    fn name(&self) -> &str {
        "momentum"
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> Decision {
        let (prev, curr) = (ctx.previous_price(), ctx.price());
        if curr > prev {
            Decision::Buy
        } else if curr < prev {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

/// 두 시계열 교차 규칙.
#[derive(Debug, Clone, Copy)]
pub struct CrossoverRule {
    fast: SeriesSource,
    slow: SeriesSource,
}

impl CrossoverRule {
    pub fn new(fast: SeriesSource, slow: SeriesSource) -> Self {
        Self { fast, slow }
    }

    fn spread(&self, ctx: &SignalContext<'_>, index: usize) -> Option<f64> {
        Some(self.fast.value_at(ctx, index)? - self.slow.value_at(ctx, index)?)
    }
}

impl SignalRule for CrossoverRule {
    fn name(&self) -> &str {
        "crossover"
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> Decision {
        let (Some(prev), Some(curr)) = (
            self.spread(ctx, ctx.index - 1),
            self.spread(ctx, ctx.index),
        ) else {
            return Decision::Hold;
        };

        if prev <= 0.0 && curr > 0.0 {
            Decision::Buy
        } else if prev >= 0.0 && curr < 0.0 {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorParams;
    use trader_core::PriceSeries;

    fn indicators(prices: &[f64], short: usize, long: usize) -> IndicatorSet {
        let series = PriceSeries::from_prices("TEST", prices).unwrap();
        let params = IndicatorParams::default()
            .with_sma_windows(short, long)
            .with_bands(2, 2.0)
            .with_volatility(2, 252.0);
        IndicatorSet::compute(&series, &params).unwrap()
    }

    fn decisions(rule: &dyn SignalRule, prices: &[f64], set: &IndicatorSet) -> Vec<Decision> {
        (1..prices.len())
            .map(|index| {
                rule.evaluate(&SignalContext {
                    index,
                    prices,
                    indicators: set,
                })
            })
            .collect()
    }

    #[test]
    fn test_momentum() {
        let prices = [100.0, 101.0, 101.0, 99.0];
        let set = indicators(&prices, 1, 2);
        assert_eq!(
            decisions(&MomentumRule, &prices, &set),
            vec![Decision::Buy, Decision::Hold, Decision::Sell]
        );
    }

    #[test]
    fn test_crossover_sma_vs_price() {
        let prices = [10.0, 10.0, 12.0, 8.0, 8.0];
        let set = indicators(&prices, 2, 3);
        let rule = CrossoverRule::new(SeriesSource::ShortSma, SeriesSource::Price);

        // spread: [-, 0, -1, 2, 0]
        assert_eq!(
            decisions(&rule, &prices, &set),
            vec![
                Decision::Hold,
                Decision::Sell,
                Decision::Buy,
                Decision::Hold
            ]
        );
    }

    #[test]
    fn test_crossover_requires_both_values() {
        let prices = [1.0, 2.0, 3.0, 2.0, 1.0];
        let set = indicators(&prices, 2, 4);
        let rule = CrossoverRule::new(SeriesSource::ShortSma, SeriesSource::LongSma);
        let result = decisions(&rule, &prices, &set);

        // 장기 SMA는 index 3부터 정의되므로 index 3까지는 판단하지 않음
        assert_eq!(result[0], Decision::Hold);
        assert_eq!(result[1], Decision::Hold);
        assert_eq!(result[2], Decision::Hold);
    }

    #[test]
    fn test_series_source_parse() {
        assert_eq!(
            "short-sma".parse::<SeriesSource>().unwrap(),
            SeriesSource::ShortSma
        );
        assert_eq!("PRICE".parse::<SeriesSource>().unwrap(), SeriesSource::Price);
        assert!("ema".parse::<SeriesSource>().is_err());
    }
}
