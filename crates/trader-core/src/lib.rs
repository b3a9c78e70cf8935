//! 가격 시계열 분석 및 시그널 시뮬레이션의 코어 도메인 타입.
//!
//! 이 crate는 다음을 제공합니다:
//! - 가격 시계열 (`PriceSeries`) 및 롤링 파생 시계열 (`RollingSeries`)
//! - 거래 이벤트 및 시뮬레이션 상태
//! - 에러 분류 (`CoreError`)
//! - 시장 데이터 제공자 trait (`PriceSeriesProvider`)

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{CoreError, CoreResult};
