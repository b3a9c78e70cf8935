//! 시뮬레이션 결과 리포트.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trader_core::{EquityPoint, SimulationState, TradeEvent};

use super::config::SimulationConfig;

/// 시뮬레이션 실행 리포트.
///
/// 마지막 포지션은 자동 청산하지 않으며, `final_portfolio_value`는
/// 상태를 변경하지 않은 평가 금액입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// 설정 정보
    pub config: SimulationConfig,

    /// 심볼
    #[serde(default)]
    pub symbol: String,

    /// 거래 기록 (시간순)
    pub trades: Vec<TradeEvent>,

    /// 종료 시점 상태
    pub final_state: SimulationState,

    /// 마지막 가격
    pub last_price: f64,

    /// 최종 평가 금액 (현금 + 보유 수량 × 마지막 가격)
    pub final_portfolio_value: f64,

    /// 총 수수료
    pub total_fees: f64,

    /// 총 수익률 (%)
    pub return_pct: f64,

    /// 평가 자산 곡선
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equity_curve: Vec<EquityPoint>,

    /// 매수 차단 횟수 (변동성 임계값)
    #[serde(default)]
    pub suppressed_buys: usize,

    /// 데이터 포인트 수
    pub data_points: usize,

    /// 기간 시작
    pub start_time: DateTime<Utc>,

    /// 기간 종료
    pub end_time: DateTime<Utc>,
}

impl SimulationReport {
    /// 매수 횟수
    pub fn buy_count(&self) -> usize {
        self.trades.iter().filter(|t| t.is_buy()).count()
    }

    /// 매도 횟수
    pub fn sell_count(&self) -> usize {
        self.trades.iter().filter(|t| t.is_sell()).count()
    }

    /// 순손익
    pub fn net_profit(&self) -> f64 {
        self.final_portfolio_value - self.config.starting_capital
    }

    /// 평가 자산 곡선 기준 최대 낙폭 (%)
    pub fn max_drawdown_pct(&self) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd: f64 = 0.0;
        for point in &self.equity_curve {
            peak = peak.max(point.equity);
            if peak > 0.0 {
                max_dd = max_dd.max((peak - point.equity) / peak * 100.0);
            }
        }
        max_dd
    }

    /// 요약 문자열 반환
    pub fn summary(&self) -> String {
        format!(
            "시뮬레이션 결과 요약\n\
             ═══════════════════════════════════════\n\
             심볼: {} ({})\n\
             기간: {} → {}\n\
             데이터 포인트: {}\n\
             ───────────────────────────────────────\n\
             초기 자본: {:.2}\n\
             최종 평가 금액: {:.2}\n\
             순손익: {:.2}\n\
             총 수익률: {:.2}%\n\
             최대 낙폭: {:.2}%\n\
             ───────────────────────────────────────\n\
             최종 포지션: {}\n\
             현금: {:.2}\n\
             보유 수량: {:.8}\n\
             마지막 가격: {:.2}\n\
             ───────────────────────────────────────\n\
             매수: {} / 매도: {} / 매수 차단: {}\n\
             총 수수료: {:.2}\n\
             ═══════════════════════════════════════",
            self.symbol,
            self.config.strategy,
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.end_time.format("%Y-%m-%d %H:%M"),
            self.data_points,
            self.config.starting_capital,
            self.final_portfolio_value,
            self.net_profit(),
            self.return_pct,
            self.max_drawdown_pct(),
            self.final_state.position,
            self.final_state.cash,
            self.final_state.units_held,
            self.last_price,
            self.buy_count(),
            self.sell_count(),
            self.suppressed_buys,
            self.total_fees,
        )
    }
}
