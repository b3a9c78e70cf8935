//! 단일 포지션 신호 시뮬레이터.
//!
//! 가격 시계열을 한 번 순회하며 신호 규칙에 따라 전액(또는 설정 비율) 매수와
//! 전량 매도를 반복하고, 거래 기록과 최종 상태를 리포트로 반환합니다.

mod config;
mod engine;
mod report;
mod strategy;

pub use config::{CrossoverConfig, SimulationConfig, StrategyKind};
pub use engine::{SignalSimulator, MIN_DATA_POINTS};
pub use report::SimulationReport;
pub use strategy::{
    CrossoverRule, Decision, MomentumRule, SeriesSource, SignalContext, SignalRule,
};
