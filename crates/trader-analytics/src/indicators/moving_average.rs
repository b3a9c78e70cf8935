//! 이동평균, 롤링 표준편차, 볼린저 밴드.
//!
//! 모든 함수는 입력 가격 배열과 인덱스 단위로 정렬된 `RollingSeries`를 반환합니다.
//! 윈도우가 채워지기 전(`i < window - 1`)의 값은 `None`입니다.

use serde::{Deserialize, Serialize};
use trader_core::{CoreError, CoreResult, RollingSeries};

use super::window::RollingWindow;

/// 볼린저 밴드 기본 표준편차 배수.
pub const DEFAULT_BAND_WIDTH: f64 = 2.0;

/// 윈도우 크기 검증.
///
/// 0은 에러입니다. 시계열 길이보다 큰 윈도우는 에러가 아니라 전부 `None`인 결과가 됩니다.
pub(crate) fn validate_window(window: usize, name: &str) -> CoreResult<()> {
    if window == 0 {
        return Err(CoreError::invalid(format!(
            "{} 윈도우는 1 이상이어야 합니다",
            name
        )));
    }
    Ok(())
}

/// 값 시퀀스에 슬라이딩 윈도우 통계를 적용.
pub(crate) fn rolling_apply<I, F>(values: I, window: usize, stat: F) -> RollingSeries
where
    I: IntoIterator<Item = Option<f64>>,
    F: Fn(&RollingWindow) -> Option<f64>,
{
    let mut acc = RollingWindow::new(window);
    values
        .into_iter()
        .map(|v| {
            acc.push(v);
            stat(&acc)
        })
        .collect()
}

/// 단순 이동평균 (SMA).
///
/// 각 인덱스에서 끝나는 최근 `window`개 값의 산술 평균입니다.
///
/// # 에러
///
/// - `window == 0`
pub fn simple_moving_average(prices: &[f64], window: usize) -> CoreResult<RollingSeries> {
    validate_window(window, "SMA")?;
    Ok(rolling_apply(
        prices.iter().map(|&p| Some(p)),
        window,
        RollingWindow::mean,
    ))
}

/// 롤링 표본 표준편차 (n-1).
///
/// `window == 1`이면 표본 표준편차가 정의되지 않으므로 전부 `None`입니다.
pub fn rolling_std(prices: &[f64], window: usize) -> CoreResult<RollingSeries> {
    validate_window(window, "표준편차")?;
    Ok(rolling_apply(
        prices.iter().map(|&p| Some(p)),
        window,
        RollingWindow::sample_std,
    ))
}

/// 한 인덱스의 볼린저 밴드 값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandValue {
    /// 밴드 폭 (상단 - 하단)
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// 밴드 내 가격 위치 (%B, 0=하단, 1=상단). 폭이 0이면 None.
    pub fn percent_b(&self, price: f64) -> Option<f64> {
        let width = self.width();
        if width > 0.0 {
            Some((price - self.lower) / width)
        } else {
            None
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BollingerBands {
    /// 중심선 (SMA)
    pub middle: RollingSeries,
    /// 상단 밴드 (SMA + k·std)
    pub upper: RollingSeries,
    /// 하단 밴드 (SMA - k·std)
    pub lower: RollingSeries,
}

impl BollingerBands {
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    /// 인덱스의 밴드 값 (세 값이 모두 정의된 경우)
    pub fn at(&self, index: usize) -> Option<BandValue> {
        Some(BandValue {
            upper: self.upper.get(index)?,
            middle: self.middle.get(index)?,
            lower: self.lower.get(index)?,
        })
    }

    /// 마지막 인덱스의 밴드 값
    pub fn last(&self) -> Option<BandValue> {
        self.len().checked_sub(1).and_then(|i| self.at(i))
    }
}

/// 볼린저 밴드.
///
/// 같은 후행 윈도우의 평균과 표본 표준편차로 `mean ± k·std`를 계산합니다.
/// 밴드는 평균과 표준편차가 모두 정의된 인덱스에서만 정의됩니다.
///
/// # 에러
///
/// - `window == 0`
/// - `k`가 음수이거나 유한하지 않은 경우
pub fn bollinger_bands(prices: &[f64], window: usize, k: f64) -> CoreResult<BollingerBands> {
    validate_window(window, "볼린저 밴드")?;
    if !k.is_finite() || k < 0.0 {
        return Err(CoreError::invalid(format!(
            "볼린저 밴드 배수는 0 이상의 유한한 값이어야 합니다: {}",
            k
        )));
    }

    let mut acc = RollingWindow::new(window);
    let mut middle = Vec::with_capacity(prices.len());
    let mut upper = Vec::with_capacity(prices.len());
    let mut lower = Vec::with_capacity(prices.len());

    for &price in prices {
        acc.push(Some(price));
        match (acc.mean(), acc.sample_std()) {
            (Some(mean), Some(std)) => {
                middle.push(Some(mean));
                upper.push(Some(mean + k * std));
                lower.push(Some(mean - k * std));
            }
            _ => {
                middle.push(None);
                upper.push(None);
                lower.push(None);
            }
        }
    }

    Ok(BollingerBands {
        middle: RollingSeries::new(middle),
        upper: RollingSeries::new(upper),
        lower: RollingSeries::new(lower),
    })
}
