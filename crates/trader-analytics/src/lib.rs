//! 롤링 통계 엔진과 단일 포지션 신호 시뮬레이터.
//!
//! 이 crate는 다음을 제공합니다:
//! - 이동평균, 볼린저 밴드, 수익률, 연율화 변동성 (`indicators`)
//! - 모멘텀/교차 전략 기반 매수·매도 시뮬레이션 (`simulation`)
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_analytics::{IndicatorParams, IndicatorSet, SignalSimulator, SimulationConfig};
//!
//! let indicators = IndicatorSet::compute(&series, &IndicatorParams::default())?;
//! let report = SignalSimulator::new(SimulationConfig::default())
//!     .run_with_indicators(&series, &indicators)?;
//! ```

pub mod indicators;
pub mod simulation;

// 주요 타입 재내보내기
pub use indicators::{
    annualized_volatility, bollinger_bands, percent_returns, realized_volatility, rolling_std,
    simple_moving_average, BandValue, BollingerBands, IndicatorParams, IndicatorSet,
    DEFAULT_BAND_WIDTH,
};
pub use simulation::{
    CrossoverConfig, SeriesSource, SignalRule, SignalSimulator, SimulationConfig,
    SimulationReport, StrategyKind,
};
