//! 도메인 타입.
//!
//! - `series` - 가격 시계열, 롤링 파생 시계열
//! - `trade` - 거래 이벤트, 시뮬레이션 상태
//! - `market_data` - 시장 데이터 제공자 인터페이스

pub mod market_data;
pub mod series;
pub mod trade;

pub use market_data::{
    Interval, PriceQuery, PriceSeriesProvider, TradingCalendar, EXCHANGE_MINUTES_PER_DAY,
    MINUTES_PER_YEAR, TRADING_DAYS_PER_YEAR,
};
pub use series::{is_usable_price, PricePoint, PriceSample, PriceSeries, RollingSeries};
pub use trade::{EquityPoint, Position, SimulationState, TradeEvent, TradeKind};
