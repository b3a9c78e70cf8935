//! 시뮬레이션 거래 기록 및 상태.
//!
//! - `Position` - 포지션 상태 (무포지션/보유)
//! - `TradeKind` - 거래 유형 (매수/매도)
//! - `TradeEvent` - 불변 거래 이벤트
//! - `SimulationState` - 시뮬레이션 종료 시점 상태
//! - `EquityPoint` - 평가 자산 곡선 포인트 (단계별 상태 포함)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 포지션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// 전액 현금 보유
    Flat,
    /// 자산 보유
    Long,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Flat => write!(f, "FLAT"),
            Position::Long => write!(f, "LONG"),
        }
    }
}

/// 거래 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "BUY"),
            TradeKind::Sell => write!(f, "SELL"),
        }
    }
}

/// 거래 이벤트.
///
/// 한 번의 시뮬레이션 실행 동안 로그에 추가만 되며, 다음 실행 시 새 로그로 교체됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// 가격 시계열 인덱스
    pub index: usize,
    /// 거래 시각
    pub timestamp: DateTime<Utc>,
    /// 거래 유형
    pub kind: TradeKind,
    /// 체결 가격
    pub price: f64,
    /// 거래 수량
    pub units: f64,
    /// 매수: 투자 금액, 매도: 수수료 차감 후 수령액
    pub amount: f64,
    /// 지불 수수료 (매수 시 0)
    pub fee_paid: f64,
}

impl TradeEvent {
    pub fn is_buy(&self) -> bool {
        self.kind == TradeKind::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.kind == TradeKind::Sell
    }
}

/// 시뮬레이션 상태.
///
/// 최초 진입 이후 현금과 보유 수량 중 최대 하나만 양수입니다
/// (투자 비율이 100% 미만이면 남은 현금은 계속 유휴 상태로 남습니다).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// 포지션
    pub position: Position,
    /// 현금 잔고
    pub cash: f64,
    /// 보유 수량
    pub units_held: f64,
}

impl SimulationState {
    /// 초기 상태 (무포지션, 전액 현금)
    pub fn initial(starting_capital: f64) -> Self {
        Self {
            position: Position::Flat,
            cash: starting_capital,
            units_held: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position == Position::Flat
    }

    pub fn is_long(&self) -> bool {
        self.position == Position::Long
    }

    /// 평가 금액 (보유 수량은 변경하지 않음)
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.cash + self.units_held * price
    }
}

/// 평가 자산 곡선 포인트.
///
/// 해당 인덱스의 신호를 처리한 직후 상태를 함께 기록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 가격 시계열 인덱스
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// 평가 금액
    pub equity: f64,
    /// 처리 직후 상태
    pub state: SimulationState,
}

impl EquityPoint {
    /// 상태를 `price`로 평가해 생성
    pub fn mark(index: usize, timestamp: DateTime<Utc>, state: SimulationState, price: f64) -> Self {
        Self {
            index,
            timestamp,
            equity: state.mark_to_market(price),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SimulationState::initial(1000.0);
        assert!(state.is_flat());
        assert_eq!(state.cash, 1000.0);
        assert_eq!(state.units_held, 0.0);
        assert_eq!(state.mark_to_market(50.0), 1000.0);
    }

    #[test]
    fn test_mark_to_market_long() {
        let state = SimulationState {
            position: Position::Long,
            cash: 10.0,
            units_held: 2.0,
        };
        assert!(state.is_long());
        assert_eq!(state.mark_to_market(45.0), 100.0);
    }

    #[test]
    fn test_equity_point_mark() {
        let state = SimulationState {
            position: Position::Long,
            cash: 0.0,
            units_held: 2.0,
        };
        let epoch = chrono::TimeZone::timestamp_opt(&Utc, 0, 0).unwrap();
        let point = EquityPoint::mark(3, epoch, state, 50.0);
        assert_eq!(point.index, 3);
        assert_eq!(point.equity, 100.0);
        assert!(point.state.is_long());
    }

    #[test]
    fn test_display() {
        assert_eq!(TradeKind::Buy.to_string(), "BUY");
        assert_eq!(Position::Long.to_string(), "LONG");
        assert_eq!(serde_json::to_string(&TradeKind::Sell).unwrap(), "\"sell\"");
    }
}
