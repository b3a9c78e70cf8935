//! 수익률 및 변동성.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use trader_analytics::indicators::{annualized_volatility, percent_returns};
//! use trader_core::MINUTES_PER_YEAR;
//!
//! let returns = percent_returns(&prices);
//! let vol = annualized_volatility(&prices, 60, MINUTES_PER_YEAR)?;
//! ```

use trader_core::{CoreError, CoreResult, RollingSeries};

use super::moving_average::{rolling_apply, validate_window};
use super::window::RollingWindow;

/// 단순 수익률 시계열.
///
/// `r[0]`은 항상 `None`이고, `r[i] = (p[i] - p[i-1]) / p[i-1]`입니다.
/// 직전 가격이 0이거나 유한하지 않으면 0으로 나누는 대신 `None`을 반환합니다.
pub fn percent_returns(prices: &[f64]) -> RollingSeries {
    let mut returns = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return RollingSeries::new(returns);
    }

    returns.push(None);
    returns.extend(prices.windows(2).map(|pair| {
        let (prev, curr) = (pair[0], pair[1]);
        if prev == 0.0 || !prev.is_finite() || !curr.is_finite() {
            return None;
        }
        Some((curr - prev) / prev)
    }));
    RollingSeries::new(returns)
}

fn validate_periods(periods_per_year: f64) -> CoreResult<()> {
    if !periods_per_year.is_finite() || periods_per_year <= 0.0 {
        return Err(CoreError::invalid(format!(
            "연율화 계수는 양수여야 합니다: {}",
            periods_per_year
        )));
    }
    Ok(())
}

/// 롤링 연율화 변동성.
///
/// 수익률의 `window` 구간 표본 표준편차에 `sqrt(periods_per_year)`를 곱합니다.
/// 수익률은 가격보다 한 칸 늦게 시작하므로 첫 정의 인덱스는 `window`입니다.
/// 윈도우 안에 `None` 수익률이 있으면 해당 인덱스도 `None`입니다.
///
/// # 에러
///
/// - `window == 0`
/// - `periods_per_year`가 0 이하이거나 유한하지 않은 경우
pub fn annualized_volatility(
    prices: &[f64],
    window: usize,
    periods_per_year: f64,
) -> CoreResult<RollingSeries> {
    validate_window(window, "변동성")?;
    validate_periods(periods_per_year)?;

    let scale = periods_per_year.sqrt();
    let returns = percent_returns(prices);
    Ok(rolling_apply(returns.iter(), window, |acc: &RollingWindow| {
        acc.sample_std().map(|std| std * scale)
    }))
}

/// 전체 구간 실현 변동성.
///
/// 정의된 모든 수익률의 표본 표준편차 × `sqrt(periods_per_year)`.
/// 수익률이 2개 미만이거나 연율화 계수가 잘못되면 `None`입니다.
pub fn realized_volatility(prices: &[f64], periods_per_year: f64) -> Option<f64> {
    if validate_periods(periods_per_year).is_err() {
        return None;
    }

    let returns: Vec<f64> = percent_returns(prices).iter().flatten().collect();
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.max(0.0).sqrt() * periods_per_year.sqrt())
}
