//! 터미널 표 출력.

use std::fmt::Write as _;

use trader_analytics::IndicatorSet;
use trader_core::{PriceSeries, TradeEvent};

use crate::commands::sweep::SweepResult;

const RULE: &str =
    "─────────────────────────────────────────────────────────────────────────────────────────────────────";

/// 값이 없으면 "-"로 표시
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// 비율을 백분율 문자열로 표시 (0.35 → "35.00%")
pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "-".to_string(),
    }
}

/// 최근 `rows`개 지표 표
pub fn indicator_table(series: &PriceSeries, set: &IndicatorSet, rows: usize) -> String {
    let params = &set.params;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:<16} | {:>12} | {:>14} | {:>12} | {:>12} | {:>12} | {:>12} | {:>12} | {:>9}",
        "시각",
        "가격",
        "거래량",
        format!("SMA({})", params.short_window),
        format!("SMA({})", params.long_window),
        "상단 밴드",
        "중심선",
        "하단 밴드",
        "변동성",
    );
    let _ = writeln!(out, "  {}", RULE);

    let start = series.len().saturating_sub(rows);
    for (i, point) in series.iter().enumerate().skip(start) {
        let _ = writeln!(
            out,
            "  {:<16} | {:>12.4} | {:>14} | {:>12} | {:>12} | {:>12} | {:>12} | {:>12} | {:>9}",
            point.timestamp.format("%Y-%m-%d %H:%M"),
            point.price,
            fmt_opt(point.volume, 4),
            fmt_opt(set.short_sma.get(i), 4),
            fmt_opt(set.long_sma.get(i), 4),
            fmt_opt(set.bands.upper.get(i), 4),
            fmt_opt(set.bands.middle.get(i), 4),
            fmt_opt(set.bands.lower.get(i), 4),
            fmt_pct(set.volatility.get(i)),
        );
    }
    out
}

/// 거래 로그 표. `max_rows`가 있으면 최근 거래만 출력합니다.
pub fn trade_table(trades: &[TradeEvent], max_rows: Option<usize>) -> String {
    let mut out = String::new();

    if trades.is_empty() {
        out.push_str("  (거래 없음)\n");
        return out;
    }

    let _ = writeln!(
        out,
        "  {:>6} | {:<16} | {:<4} | {:>12} | {:>14} | {:>14} | {:>10}",
        "index", "시각", "구분", "가격", "수량", "금액", "수수료"
    );
    let _ = writeln!(out, "  {}", RULE);

    let start = max_rows.map_or(0, |n| trades.len().saturating_sub(n));
    if start > 0 {
        let _ = writeln!(out, "  ... 이전 거래 {}건 생략", start);
    }
    for trade in &trades[start..] {
        let _ = writeln!(
            out,
            "  {:>6} | {:<16} | {:<4} | {:>12.4} | {:>14.8} | {:>14.4} | {:>10.4}",
            trade.index,
            trade.timestamp.format("%Y-%m-%d %H:%M"),
            trade.kind.to_string(),
            trade.price,
            trade.units,
            trade.amount,
            trade.fee_paid,
        );
    }
    out
}

/// 파라미터 탐색 순위 표
pub fn sweep_table(results: &[SweepResult], top: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:>4} | {:>6} | {:>6} | {:>14} | {:>9} | {:>9} | {:>6}",
        "순위", "단기", "장기", "최종 평가 금액", "수익률", "최대 낙폭", "거래"
    );
    let _ = writeln!(out, "  {}", RULE);

    for (rank, result) in results.iter().take(top).enumerate() {
        let _ = writeln!(
            out,
            "  {:>4} | {:>6} | {:>6} | {:>14.2} | {:>8.2}% | {:>8.2}% | {:>6}",
            rank + 1,
            result.short_window,
            result.long_window,
            result.final_value,
            result.return_pct,
            result.max_drawdown_pct,
            result.trades,
        );
    }
    out
}
