//! 시장 데이터 제공자 인터페이스.
//!
//! 코어는 가격 시계열만 소비합니다. 실제 HTTP 조회는 `trader-exchange`의 구현체가
//! 담당하며, 모든 실패(HTTP 에러, 잘못된 응답, 빈 응답)는
//! `CoreError::UpstreamUnavailable`로 통일하여 전달합니다.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::{CoreError, CoreResult};

/// 연간 거래일 수 (주식 시장)
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// 정규장 하루 거래 시간 (분, 6.5시간)
pub const EXCHANGE_MINUTES_PER_DAY: f64 = 390.0;

/// 연간 분 수 (24/7 시장)
pub const MINUTES_PER_YEAR: f64 = 525_600.0;

/// 캔들 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    Day1,
}

/// 거래 시간 체계 (연율화 계수 계산용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingCalendar {
    /// 24시간 365일 거래 (암호화폐)
    #[default]
    Continuous,
    /// 정규장 기반 거래 (연 252일, 하루 6.5시간)
    Exchange,
}

impl Interval {
    /// 문자열 표현 (예: "1m", "1d")
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
        }
    }

    /// 간격 길이 (분)
    pub fn minutes(&self) -> u32 {
        match self {
            Interval::Minute1 => 1,
            Interval::Minute5 => 5,
            Interval::Minute15 => 15,
            Interval::Hour1 => 60,
            Interval::Day1 => 1440,
        }
    }

    /// 간격 길이 (초)
    pub fn seconds(&self) -> u32 {
        self.minutes() * 60
    }

    /// 연간 기간 수 (변동성 연율화 계수).
    pub fn periods_per_year(&self, calendar: TradingCalendar) -> f64 {
        match (calendar, self) {
            (TradingCalendar::Continuous, _) => MINUTES_PER_YEAR / self.minutes() as f64,
            (TradingCalendar::Exchange, Interval::Day1) => TRADING_DAYS_PER_YEAR,
            (TradingCalendar::Exchange, _) => {
                TRADING_DAYS_PER_YEAR * EXCHANGE_MINUTES_PER_DAY / self.minutes() as f64
            }
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Ok(Interval::Minute1),
            "5m" | "5min" => Ok(Interval::Minute5),
            "15m" | "15min" => Ok(Interval::Minute15),
            "1h" | "60m" => Ok(Interval::Hour1),
            "1d" | "d" | "day" => Ok(Interval::Day1),
            other => Err(CoreError::invalid(format!(
                "지원하지 않는 간격: {} (지원: 1m, 5m, 15m, 1h, 1d)",
                other
            ))),
        }
    }
}

impl FromStr for TradingCalendar {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continuous" | "24x7" | "crypto" => Ok(TradingCalendar::Continuous),
            "exchange" | "stock" => Ok(TradingCalendar::Exchange),
            other => Err(CoreError::invalid(format!(
                "알 수 없는 거래 시간 체계: {} (지원: continuous, exchange)",
                other
            ))),
        }
    }
}

/// 가격 시계열 조회 조건.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    /// 캔들 간격
    pub interval: Interval,
    /// 최근 몇 개의 포인트를 조회할지
    pub limit: usize,
}

impl Default for PriceQuery {
    fn default() -> Self {
        Self {
            interval: Interval::Minute1,
            limit: 1440,
        }
    }
}

impl PriceQuery {
    pub fn new(interval: Interval, limit: usize) -> Self {
        Self { interval, limit }
    }
}

/// 가격 시계열 제공자 trait.
///
/// 각 데이터 소스(Binance, Coinbase, Yahoo, 로컬 파일)가 이 trait를 구현합니다.
///
/// # Errors
///
/// 조회 실패는 재시도 없이 `CoreError::UpstreamUnavailable`로 반환합니다.
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    /// 시간순 종가 시계열 조회.
    async fn fetch_price_series(&self, symbol: &str, query: &PriceQuery)
        -> CoreResult<PriceSeries>;

    /// 데이터 제공자 이름 (로깅용)
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse() {
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::Minute1);
        assert_eq!("1H".parse::<Interval>().unwrap(), Interval::Hour1);
        assert_eq!(" 1d ".parse::<Interval>().unwrap(), Interval::Day1);
        assert!("3w".parse::<Interval>().is_err());
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(
            Interval::Minute1.periods_per_year(TradingCalendar::Continuous),
            525_600.0
        );
        assert_eq!(
            Interval::Hour1.periods_per_year(TradingCalendar::Continuous),
            8_760.0
        );
        assert_eq!(
            Interval::Day1.periods_per_year(TradingCalendar::Exchange),
            252.0
        );
        assert_eq!(
            Interval::Minute1.periods_per_year(TradingCalendar::Exchange),
            252.0 * 390.0
        );
    }

    #[test]
    fn test_calendar_parse() {
        assert_eq!(
            "crypto".parse::<TradingCalendar>().unwrap(),
            TradingCalendar::Continuous
        );
        assert_eq!(
            "Exchange".parse::<TradingCalendar>().unwrap(),
            TradingCalendar::Exchange
        );
        assert!("lunar".parse::<TradingCalendar>().is_err());
    }

    #[test]
    fn test_interval_serde() {
        assert_eq!(serde_json::to_string(&Interval::Minute15).unwrap(), "\"15m\"");
        let parsed: Interval = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(parsed, Interval::Day1);
    }

    struct StaticProvider;

    #[async_trait]
    impl PriceSeriesProvider for StaticProvider {
        async fn fetch_price_series(
            &self,
            symbol: &str,
            _query: &PriceQuery,
        ) -> CoreResult<PriceSeries> {
            PriceSeries::from_prices(symbol, &[1.0, 2.0])
        }

        fn provider_name(&self) -> &str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_provider_trait_object() {
        let provider: Box<dyn PriceSeriesProvider> = Box::new(StaticProvider);
        let series = provider
            .fetch_price_series("X", &PriceQuery::default())
            .await
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(provider.provider_name(), "static");
    }
}
