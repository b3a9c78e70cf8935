//! 단일 포지션 신호 시뮬레이터.
//!
//! # 상태 전이
//!
//! ```text
//!            buy(i): invested = fraction × cash
//!   ┌──────┐ ──────────────────────────────────► ┌──────┐
//!   │ Flat │                                     │ Long │
//!   └──────┘ ◄────────────────────────────────── └──────┘
//!            sell(i): cash += units × price × (1 - fee)
//! ```
//!
//! - 인덱스 0에서는 거래하지 않습니다.
//! - 수수료는 매도 시에만 부과합니다.
//! - 마지막 포지션은 자동 청산하지 않습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use trader_analytics::simulation::{SignalSimulator, SimulationConfig, StrategyKind};
//!
//! let config = SimulationConfig::new(10_000.0)
//!     .with_fee_percent(0.1)
//!     .with_strategy(StrategyKind::Crossover);
//!
//! let report = SignalSimulator::new(config).run(&series)?;
//! println!("{}", report.summary());
//! ```

use tracing::{debug, info};
use trader_core::{
    CoreError, CoreResult, EquityPoint, Position, PriceSeries, SimulationState, TradeEvent,
    TradeKind,
};

use super::config::SimulationConfig;
use super::report::SimulationReport;
use super::strategy::{Decision, SignalContext, SignalRule};
use crate::indicators::IndicatorSet;

/// 시뮬레이션에 필요한 최소 데이터 포인트 수
pub const MIN_DATA_POINTS: usize = 2;

/// 한 번의 실행 동안만 존재하는 장부.
struct Ledger {
    state: SimulationState,
    trades: Vec<TradeEvent>,
    total_fees: f64,
    suppressed_buys: usize,
}

impl Ledger {
    fn new(starting_capital: f64) -> Self {
        Self {
            state: SimulationState::initial(starting_capital),
            trades: Vec::new(),
            total_fees: 0.0,
            suppressed_buys: 0,
        }
    }

    fn buy(&mut self, series: &PriceSeries, index: usize, price: f64, fraction_pct: f64) {
        let invested = fraction_pct / 100.0 * self.state.cash;
        if invested <= 0.0 {
            debug!(index, cash = self.state.cash, "투자 금액이 0이므로 매수 생략");
            return;
        }

        let units = invested / price;
        self.state.cash -= invested;
        self.state.units_held = units;
        self.state.position = Position::Long;

        debug!(index, price, units, invested, "매수");
        self.record(series, index, TradeKind::Buy, price, units, invested, 0.0);
    }

    fn sell(&mut self, series: &PriceSeries, index: usize, price: f64, fee_pct: f64) {
        let units = self.state.units_held;
        let proceeds = units * price;
        let fee = fee_pct / 100.0 * proceeds;
        let net = proceeds - fee;

        self.state.cash += net;
        self.state.units_held = 0.0;
        self.state.position = Position::Flat;
        self.total_fees += fee;

        debug!(index, price, units, net, fee, "매도");
        self.record(series, index, TradeKind::Sell, price, units, net, fee);
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        series: &PriceSeries,
        index: usize,
        kind: TradeKind,
        price: f64,
        units: f64,
        amount: f64,
        fee_paid: f64,
    ) {
        let Some(point) = series.get(index) else {
            return;
        };
        self.trades.push(TradeEvent {
            index,
            timestamp: point.timestamp,
            kind,
            price,
            units,
            amount,
            fee_paid,
        });
    }
}

/// 단일 포지션 신호 시뮬레이터.
///
/// 실행 간 상태를 공유하지 않으므로 같은 입력에 대해 항상 같은 결과를 반환합니다.
pub struct SignalSimulator {
    config: SimulationConfig,
    rule: Box<dyn SignalRule>,
}

impl SignalSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        let rule = config.build_rule();
        Self { config, rule }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 규칙 이름
    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }

    /// 지표를 계산한 뒤 시뮬레이션 실행.
    ///
    /// # 에러
    ///
    /// - 설정 검증 실패 시 `InvalidParameter`
    /// - 데이터 포인트가 2개 미만이면 `EmptySeries`
    pub fn run(&self, series: &PriceSeries) -> CoreResult<SimulationReport> {
        self.config.validate()?;
        check_length(series)?;
        let indicators = IndicatorSet::compute(series, &self.config.indicators)?;
        self.simulate(series, &indicators)
    }

    /// 미리 계산된 지표로 시뮬레이션 실행.
    ///
    /// 지표 길이가 시계열 길이와 다르면 `InvalidParameter`입니다.
    pub fn run_with_indicators(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
    ) -> CoreResult<SimulationReport> {
        self.config.validate()?;
        check_length(series)?;

        let len = series.len();
        for (name, actual) in [
            ("short_sma", indicators.short_sma.len()),
            ("long_sma", indicators.long_sma.len()),
            ("volatility", indicators.volatility.len()),
        ] {
            if actual != len {
                return Err(CoreError::invalid(format!(
                    "지표 길이가 시계열과 다릅니다: {} {} != {}",
                    name, actual, len
                )));
            }
        }

        self.simulate(series, indicators)
    }

    fn simulate(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
    ) -> CoreResult<SimulationReport> {
        let prices = series.prices();
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(CoreError::EmptySeries {
                required: MIN_DATA_POINTS,
                provided: 0,
            });
        };
        let last_price = last.price;

        let mut ledger = Ledger::new(self.config.starting_capital);
        let mut equity_curve = Vec::with_capacity(prices.len());
        equity_curve.push(EquityPoint::mark(
            0,
            first.timestamp,
            ledger.state,
            first.price,
        ));

        for (index, point) in series.iter().enumerate().skip(1) {
            let ctx = SignalContext {
                index,
                prices: &prices,
                indicators,
            };

            match (self.rule.evaluate(&ctx), ledger.state.position) {
                (Decision::Buy, Position::Flat) => {
                    if self.is_too_volatile(indicators, index) {
                        ledger.suppressed_buys += 1;
                        debug!(
                            index,
                            volatility = indicators.volatility.get(index),
                            "변동성 임계값 초과로 매수 차단"
                        );
                    } else {
                        ledger.buy(series, index, point.price, self.config.investable_fraction);
                    }
                }
                (Decision::Sell, Position::Long) => {
                    ledger.sell(series, index, point.price, self.config.fee_percent);
                }
                _ => {}
            }

            equity_curve.push(EquityPoint::mark(
                index,
                point.timestamp,
                ledger.state,
                point.price,
            ));
        }

        let final_portfolio_value = ledger.state.mark_to_market(last_price);
        let return_pct = (final_portfolio_value - self.config.starting_capital)
            / self.config.starting_capital
            * 100.0;

        info!(
            symbol = series.symbol(),
            strategy = self.rule.name(),
            trades = ledger.trades.len(),
            final_value = final_portfolio_value,
            return_pct,
            "시뮬레이션 완료"
        );

        Ok(SimulationReport {
            config: self.config.clone(),
            symbol: series.symbol().to_string(),
            trades: ledger.trades,
            final_state: ledger.state,
            last_price,
            final_portfolio_value,
            total_fees: ledger.total_fees,
            return_pct,
            equity_curve,
            suppressed_buys: ledger.suppressed_buys,
            data_points: series.len(),
            start_time: first.timestamp,
            end_time: last.timestamp,
        })
    }

    fn is_too_volatile(&self, indicators: &IndicatorSet, index: usize) -> bool {
        match (self.config.risk_threshold, indicators.volatility.get(index)) {
            (Some(threshold), Some(vol)) => vol > threshold,
            _ => false,
        }
    }
}

fn check_length(series: &PriceSeries) -> CoreResult<()> {
    if series.len() < MIN_DATA_POINTS {
        return Err(CoreError::EmptySeries {
            required: MIN_DATA_POINTS,
            provided: series.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorParams;
    use crate::simulation::StrategyKind;

    fn small_params() -> IndicatorParams {
        IndicatorParams::default()
            .with_sma_windows(2, 3)
            .with_bands(2, 2.0)
            .with_volatility(2, 252.0)
    }

    fn series(prices: &[f64]) -> PriceSeries {
        PriceSeries::from_prices("TEST", prices).unwrap()
    }

    #[test]
    fn test_momentum_example() {
        let config = SimulationConfig::new(100.0)
            .with_fee_percent(0.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config)
            .run(&series(&[100.0, 101.0, 99.0, 102.0]))
            .unwrap();

        let kinds: Vec<(usize, TradeKind)> =
            report.trades.iter().map(|t| (t.index, t.kind)).collect();
        assert_eq!(
            kinds,
            vec![(1, TradeKind::Buy), (2, TradeKind::Sell), (3, TradeKind::Buy)]
        );

        assert!((report.trades[0].units - 100.0 / 101.0).abs() < 1e-12);
        let cash_after_sell = 100.0 / 101.0 * 99.0;
        assert!((report.trades[1].amount - cash_after_sell).abs() < 1e-9);
        assert!((report.trades[2].units - cash_after_sell / 102.0).abs() < 1e-9);

        assert!(report.final_state.is_long());
        assert_eq!(report.final_state.cash, 0.0);
        assert!((report.final_portfolio_value - cash_after_sell).abs() < 1e-9);
        assert_eq!(report.equity_curve.len(), 4);
    }

    #[test]
    fn test_equity_curve_records_state_per_index() {
        let config = SimulationConfig::new(100.0)
            .with_fee_percent(0.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config)
            .run(&series(&[100.0, 101.0, 99.0, 102.0]))
            .unwrap();

        let positions: Vec<Position> =
            report.equity_curve.iter().map(|p| p.state.position).collect();
        assert_eq!(
            positions,
            vec![Position::Flat, Position::Long, Position::Flat, Position::Long]
        );
        for (i, point) in report.equity_curve.iter().enumerate() {
            assert_eq!(point.index, i);
            assert!(point.state.cash == 0.0 || point.state.units_held == 0.0);
        }
        assert_eq!(report.equity_curve[0].state.cash, 100.0);
        assert_eq!(report.equity_curve.last().unwrap().state, report.final_state);
    }

    #[test]
    fn test_single_point_is_empty_series() {
        let result = SignalSimulator::new(SimulationConfig::default()).run(&series(&[100.0]));
        assert_eq!(
            result.unwrap_err(),
            CoreError::EmptySeries {
                required: 2,
                provided: 1
            }
        );
    }

    #[test]
    fn test_invalid_fee_rejected() {
        let config = SimulationConfig::default().with_fee_percent(150.0);
        let result = SignalSimulator::new(config).run(&series(&[100.0, 101.0]));
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_fee_charged_on_sell_only() {
        let config = SimulationConfig::new(1000.0)
            .with_fee_percent(1.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config)
            .run(&series(&[10.0, 20.0, 10.0]))
            .unwrap();

        assert_eq!(report.trades[0].fee_paid, 0.0);
        // 매수 50 units @ 20, 매도 @ 10 → 500, 수수료 5
        assert!((report.trades[1].fee_paid - 5.0).abs() < 1e-9);
        assert!((report.final_state.cash - 495.0).abs() < 1e-9);
        assert!((report.total_fees - 5.0).abs() < 1e-9);
        assert!(report.final_state.is_flat());
    }

    #[test]
    fn test_zero_fraction_skips_buy() {
        let config = SimulationConfig::new(1000.0)
            .with_investable_fraction(0.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config)
            .run(&series(&[10.0, 11.0, 12.0]))
            .unwrap();

        assert!(report.trades.is_empty());
        assert!(report.final_state.is_flat());
        assert_eq!(report.final_portfolio_value, 1000.0);
    }

    #[test]
    fn test_partial_fraction_keeps_idle_cash() {
        let config = SimulationConfig::new(1000.0)
            .with_investable_fraction(50.0)
            .with_fee_percent(0.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config)
            .run(&series(&[10.0, 20.0, 40.0]))
            .unwrap();

        assert_eq!(report.buy_count(), 1);
        assert_eq!(report.final_state.cash, 500.0);
        assert_eq!(report.final_state.units_held, 25.0);
        assert_eq!(report.final_portfolio_value, 1500.0);
    }

    #[test]
    fn test_risk_threshold_suppresses_buys_only() {
        let prices = [100.0, 150.0, 80.0, 160.0, 90.0];
        let config = SimulationConfig::new(1000.0)
            .with_risk_threshold(0.0)
            .with_indicators(small_params());
        let report = SignalSimulator::new(config).run(&series(&prices)).unwrap();

        // index 1은 변동성 미정의 → 매수 허용, 이후 매수는 모두 차단
        assert_eq!(report.buy_count(), 1);
        assert_eq!(report.trades[0].index, 1);
        assert_eq!(report.sell_count(), 1);
        assert_eq!(report.suppressed_buys, 1);
    }

    #[test]
    fn test_run_with_mismatched_indicators() {
        let config = SimulationConfig::default().with_indicators(small_params());
        let long = series(&[1.0, 2.0, 3.0, 4.0]);
        let short = series(&[1.0, 2.0, 3.0]);
        let indicators = IndicatorSet::compute(&short, &small_params()).unwrap();

        let result = SignalSimulator::new(config).run_with_indicators(&long, &indicators);
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_run_is_idempotent() {
        let prices: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.01)
            .collect();
        let simulator = SignalSimulator::new(
            SimulationConfig::default()
                .with_strategy(StrategyKind::Crossover)
                .with_indicators(IndicatorParams::default().with_sma_windows(5, 20)),
        );
        let data = series(&prices);

        let first = simulator.run(&data).unwrap();
        let second = simulator.run(&data).unwrap();
        assert_eq!(first, second);
        assert!(!first.trades.is_empty());
    }
}
