//! 롤링 통계 엔진.
//!
//! 가격 배열에서 이동평균, 볼린저 밴드, 수익률, 연율화 변동성을 계산합니다.
//! 모든 함수는 순수 함수이며 같은 입력에 대해 항상 같은 결과를 반환합니다.
//!
//! ```text
//! prices ──┬─► simple_moving_average ─► RollingSeries
//!          ├─► bollinger_bands ────────► BollingerBands { middle, upper, lower }
//!          └─► percent_returns ─► annualized_volatility ─► RollingSeries
//! ```
//!
//! 결과는 입력과 인덱스 단위로 정렬되며, 데이터가 부족한 앞부분은 `None`입니다.

mod moving_average;
mod set;
mod volatility;
mod window;

pub use moving_average::{
    bollinger_bands, rolling_std, simple_moving_average, BandValue, BollingerBands,
    DEFAULT_BAND_WIDTH,
};
pub use set::{IndicatorParams, IndicatorSet};
pub use volatility::{annualized_volatility, percent_returns, realized_volatility};
pub use window::RollingWindow;
