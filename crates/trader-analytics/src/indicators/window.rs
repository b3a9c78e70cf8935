//! 슬라이딩 윈도우 누산기.
//!
//! 윈도우에 들어오고 나가는 값만 반영하여 평균/분산을 O(1)로 갱신합니다.
//! 값은 윈도우 안의 한 값을 기준점(shift)으로 빼서 누적하므로, 가격 수준이 큰 경우에도
//! 상쇄 오차가 작습니다.
//!
//! 기준점 값이 윈도우를 벗어나면 가장 최근 값을 새 기준점으로 삼아 버퍼로부터 합계를
//! 다시 계산합니다. 재계산은 최대 `window`번 밀어낼 때마다 한 번이며, 윈도우가 같은 값으로
//! 채워지면 모든 편차가 정확히 0이 되어 분산도 0입니다.

use std::collections::VecDeque;

/// 슬라이딩 윈도우 누산기.
///
/// `None`(값 없음)이 윈도우 안에 하나라도 있으면 통계값도 `None`입니다.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: usize,
    buffer: VecDeque<Option<f64>>,
    shift: Option<f64>,
    /// 기준점 값의 누적 위치
    shift_pos: usize,
    sum: f64,
    sum_sq: f64,
    missing: usize,
    /// 지금까지 추가된 값 수
    pushed: usize,
}

impl RollingWindow {
    /// 새 누산기 생성. `window`는 1 이상이어야 합니다 (호출 측에서 검증).
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buffer: VecDeque::with_capacity(window + 1),
            shift: None,
            shift_pos: 0,
            sum: 0.0,
            sum_sq: 0.0,
            missing: 0,
            pushed: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// 값 추가. 윈도우가 가득 차 있으면 가장 오래된 값을 밀어냅니다.
    pub fn push(&mut self, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        let pos = self.pushed;
        self.pushed += 1;

        match value {
            Some(v) => {
                if self.shift.is_none() {
                    self.shift = Some(v);
                    self.shift_pos = pos;
                }
                let d = v - self.shift.unwrap_or(v);
                self.sum += d;
                self.sum_sq += d * d;
            }
            None => self.missing += 1,
        }
        self.buffer.push_back(value);

        if self.buffer.len() > self.window {
            let evicted_pos = self.pushed - self.buffer.len();
            match self.buffer.pop_front().flatten() {
                Some(old) => {
                    let d = old - self.shift.unwrap_or(old);
                    self.sum -= d;
                    self.sum_sq -= d * d;
                }
                None => self.missing -= 1,
            }

            if self.shift.is_some() && evicted_pos == self.shift_pos {
                self.recalibrate();
            }
        }
    }

    /// 윈도우가 가득 찼는지 여부
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.window
    }

    /// 윈도우가 가득 차 있고 값 없음이 없는지 여부
    pub fn is_complete(&self) -> bool {
        self.is_full() && self.missing == 0
    }

    /// 윈도우 평균
    pub fn mean(&self) -> Option<f64> {
        if !self.is_complete() {
            return None;
        }
        let shift = self.shift?;
        Some(shift + self.sum / self.window as f64)
    }

    /// 윈도우 표본 분산 (n-1). 윈도우 크기 1이면 정의되지 않습니다.
    pub fn sample_variance(&self) -> Option<f64> {
        if !self.is_complete() || self.window < 2 {
            return None;
        }
        let n = self.window as f64;
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        Some(variance.max(0.0))
    }

    /// 윈도우 표본 표준편차
    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    /// 가장 최근 값을 기준점으로 버퍼로부터 합계 재계산.
    fn recalibrate(&mut self) {
        let front_pos = self.pushed - self.buffer.len();
        let newest = self
            .buffer
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| v.map(|v| (front_pos + i, v)));

        let Some((pos, shift)) = newest else {
            self.shift = None;
            self.sum = 0.0;
            self.sum_sq = 0.0;
            return;
        };
        self.shift = Some(shift);
        self.shift_pos = pos;

        let (sum, sum_sq) = self
            .buffer
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(s, sq), v| {
                let d = v - shift;
                (s + d, sq + d * d)
            });
        self.sum = sum;
        self.sum_sq = sum_sq;
    }
}
