//! 가격 시계열 및 롤링 파생 시계열.
//!
//! - `PricePoint` - (시각, 가격, 거래량) 한 묶음
//! - `PriceSample` - 검증 전 원시 샘플 (가격/거래량 누락 가능)
//! - `PriceSeries` - 시간순으로 정렬된 불변 가격 시계열
//! - `RollingSeries` - 가격 시계열과 인덱스 단위로 정렬된 파생 시계열 (값 없음 = `None`)

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// 가격 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 가격 (유한한 양수)
    pub price: f64,
    /// 거래량 (제공자가 주지 않으면 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price,
            volume: None,
        }
    }

    /// 거래량 지정. 음수나 NaN은 버립니다.
    pub fn with_volume(mut self, volume: Option<f64>) -> Self {
        self.volume = volume.filter(|v| is_usable_volume(*v));
        self
    }
}

/// 가격으로 사용할 수 있는 값인지 확인 (유한한 양수).
pub fn is_usable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

fn is_usable_volume(volume: f64) -> bool {
    volume.is_finite() && volume >= 0.0
}

/// 제공자 응답에서 읽은 원시 샘플.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: Option<f64>, volume: Option<f64>) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }
}

impl From<(DateTime<Utc>, Option<f64>)> for PriceSample {
    fn from((timestamp, price): (DateTime<Utc>, Option<f64>)) -> Self {
        Self::new(timestamp, price, None)
    }
}

impl From<(DateTime<Utc>, Option<f64>, Option<f64>)> for PriceSample {
    fn from((timestamp, price, volume): (DateTime<Utc>, Option<f64>, Option<f64>)) -> Self {
        Self::new(timestamp, price, volume)
    }
}

#[derive(Deserialize)]
struct RawPriceSeries {
    #[serde(default)]
    symbol: String,
    points: Vec<PricePoint>,
}

/// 가격 시계열.
///
/// 시각은 엄격하게 증가하고 모든 가격은 유한한 양수입니다.
/// 한 번 생성되면 변경되지 않으며, 한 번의 계산 동안 호출 측이 소유합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    /// 심볼 (예: "BTCUSDT", "BTC-USD")
    symbol: String,
    /// 가격 포인트
    points: Vec<PricePoint>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = CoreError;

    fn try_from(raw: RawPriceSeries) -> CoreResult<Self> {
        Self::new(raw.symbol, raw.points)
    }
}

impl PriceSeries {
    /// 검증된 포인트 목록으로 시계열 생성.
    ///
    /// # 에러
    ///
    /// - 사용할 수 없는 가격 (0 이하, NaN, 무한대)
    /// - 엄격하게 증가하지 않는 시각
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> CoreResult<Self> {
        if let Some((idx, p)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !is_usable_price(p.price))
        {
            return Err(CoreError::invalid(format!(
                "index {}의 가격이 유효하지 않습니다: {}",
                idx, p.price
            )));
        }
        validate_ordering(&points)?;

        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// 원시 샘플로부터 시계열 생성.
    ///
    /// 가격이 없거나 (`None`) 사용할 수 없는 샘플은 0으로 채우지 않고 갭으로 제외합니다.
    /// 샘플은 `(시각, 가격)` 또는 `(시각, 가격, 거래량)` 튜플로도 받습니다.
    pub fn from_samples<I, S>(symbol: impl Into<String>, samples: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PriceSample>,
    {
        let symbol = symbol.into();
        let mut dropped = 0usize;
        let points: Vec<PricePoint> = samples
            .into_iter()
            .map(Into::<PriceSample>::into)
            .filter_map(|sample: PriceSample| match sample.price {
                Some(p) if is_usable_price(p) => {
                    Some(PricePoint::new(sample.timestamp, p).with_volume(sample.volume))
                }
                _ => {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if dropped > 0 {
            warn!(
                symbol = %symbol,
                dropped = dropped,
                kept = points.len(),
                "가격이 없는 샘플을 갭으로 제외"
            );
        }

        validate_ordering(&points)?;
        Ok(Self { symbol, points })
    }

    /// 가격 배열로 시계열 생성 (1분 간격 합성 시각).
    ///
    /// 테스트와 파라미터 탐색용입니다.
    pub fn from_prices(symbol: impl Into<String>, prices: &[f64]) -> CoreResult<Self> {
        let base = Utc
            .timestamp_opt(0, 0)
            .single()
            .ok_or_else(|| CoreError::invalid("기준 시각 생성 실패"))?;
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(base + Duration::minutes(i as i64), p))
            .collect();
        Self::new(symbol, points)
    }

    /// 빈 시계열
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// 마지막 가격
    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    /// 가격 배열 복사본
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// 시점별 거래량 (인덱스 정렬)
    pub fn volumes(&self) -> RollingSeries {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// 거래량이 하나라도 있는지
    pub fn has_volume(&self) -> bool {
        self.points.iter().any(|p| p.volume.is_some())
    }

    /// 첫 시각과 마지막 시각
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.points.first()?.timestamp, self.points.last()?.timestamp))
    }

    /// 시각 배열 복사본
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    /// 가장 최근 `count`개 포인트만 남긴 시계열
    pub fn tail(&self, count: usize) -> Self {
        let skip = self.points.len().saturating_sub(count);
        Self {
            symbol: self.symbol.clone(),
            points: self.points[skip..].to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn validate_ordering(points: &[PricePoint]) -> CoreResult<()> {
    for (idx, pair) in points.windows(2).enumerate() {
        if pair[0].timestamp >= pair[1].timestamp {
            return Err(CoreError::invalid(format!(
                "시각이 엄격하게 증가하지 않습니다 (index {} → {})",
                idx,
                idx + 1
            )));
        }
    }
    Ok(())
}

/// 롤링 파생 시계열.
///
/// 입력 가격 시계열과 인덱스 단위로 정렬됩니다.
/// 계산에 필요한 데이터가 부족한 인덱스는 기본 숫자가 아닌 `None`으로 표현합니다.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollingSeries(Vec<Option<f64>>);

impl RollingSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    /// 모든 값이 없는 시계열
    pub fn undefined(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 인덱스의 값 (범위 밖이거나 정의되지 않으면 None)
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().copied()
    }

    /// 마지막 인덱스의 값
    pub fn last_value(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }

    /// 정의된 값의 개수
    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// 처음으로 값이 정의된 인덱스
    pub fn first_defined_index(&self) -> Option<usize> {
        self.0.iter().position(|v| v.is_some())
    }

    /// 정의된 값에만 함수를 적용
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self(self.0.iter().map(|v| v.map(&f)).collect())
    }
}

impl FromIterator<Option<f64>> for RollingSeries {
    fn from_iter<T: IntoIterator<Item = Option<f64>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap()
    }

    #[test]
    fn test_from_samples_drops_gaps() {
        let samples = vec![
            (ts(0), Some(100.0)),
            (ts(1), None),
            (ts(2), Some(0.0)),
            (ts(3), Some(f64::NAN)),
            (ts(4), Some(101.5)),
        ];

        let series = PriceSeries::from_samples("BTCUSDT", samples).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.prices(), vec![100.0, 101.5]);
        assert_eq!(series.timestamps(), vec![ts(0), ts(4)]);
    }

    #[test]
    fn test_from_samples_keeps_volume() {
        let samples = vec![
            (ts(0), Some(100.0), Some(12.5)),
            (ts(1), None, Some(3.0)),
            (ts(2), Some(101.0), Some(-1.0)),
            (ts(3), Some(102.0), None),
        ];

        let series = PriceSeries::from_samples("BTCUSDT", samples).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.volumes().values(), &[Some(12.5), None, None]);
        assert!(series.has_volume());
        assert!(!PriceSeries::from_prices("X", &[1.0, 2.0]).unwrap().has_volume());
    }

    #[test]
    fn test_time_range() {
        let series = PriceSeries::from_samples(
            "BTCUSDT",
            vec![(ts(0), Some(1.0)), (ts(5), Some(2.0)), (ts(9), Some(3.0))],
        )
        .unwrap();
        assert_eq!(series.time_range(), Some((ts(0), ts(9))));
        assert_eq!(PriceSeries::empty("X").time_range(), None);
    }

    #[test]
    fn test_new_rejects_unsorted_timestamps() {
        let points = vec![PricePoint::new(ts(1), 100.0), PricePoint::new(ts(0), 101.0)];
        let result = PriceSeries::new("BTCUSDT", points);
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));

        let dup = vec![PricePoint::new(ts(0), 100.0), PricePoint::new(ts(0), 101.0)];
        assert!(PriceSeries::new("BTCUSDT", dup).is_err());
    }

    #[test]
    fn test_new_rejects_non_positive_price() {
        let points = vec![PricePoint::new(ts(0), 100.0), PricePoint::new(ts(1), -1.0)];
        assert!(PriceSeries::new("BTCUSDT", points).is_err());
    }

    #[test]
    fn test_from_prices_and_accessors() {
        let series = PriceSeries::from_prices("TEST", &[100.0, 101.0, 99.0]).unwrap();
        assert_eq!(series.symbol(), "TEST");
        assert_eq!(series.last_price(), Some(99.0));
        assert_eq!(series.tail(2).prices(), vec![101.0, 99.0]);
        assert_eq!(series.tail(10).len(), 3);
        assert!(PriceSeries::empty("X").is_empty());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"symbol":"BTC","points":[
            {"timestamp":"2024-01-01T00:00:00Z","price":100.0},
            {"timestamp":"2024-01-01T00:01:00Z","price":101.0}]}"#;
        let series: PriceSeries = serde_json::from_str(ok).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(0).unwrap().volume, None);

        let bad = r#"{"symbol":"BTC","points":[
            {"timestamp":"2024-01-01T00:01:00Z","price":100.0},
            {"timestamp":"2024-01-01T00:00:00Z","price":101.0}]}"#;
        assert!(serde_json::from_str::<PriceSeries>(bad).is_err());
    }

    #[test]
    fn test_rolling_series_accessors() {
        let rs = RollingSeries::new(vec![None, None, Some(2.0), Some(3.0)]);
        assert_eq!(rs.len(), 4);
        assert_eq!(rs.get(0), None);
        assert_eq!(rs.get(2), Some(2.0));
        assert_eq!(rs.get(10), None);
        assert_eq!(rs.defined_count(), 2);
        assert_eq!(rs.first_defined_index(), Some(2));
        assert_eq!(rs.last_value(), Some(3.0));
        assert_eq!(rs.map(|v| v * 2.0).get(3), Some(6.0));
        assert_eq!(RollingSeries::undefined(3).defined_count(), 0);
    }
}
