//! Yahoo Finance 시세 조회.
//!
//! `yahoo_finance_api` 커넥터의 chart API(`get_quote_range`)를 사용합니다.
//! 종가가 0 이하이거나 NaN인 quote는 갭으로 제외합니다.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::{debug, info};
use trader_core::{
    CoreResult, Interval, PriceQuery, PriceSample, PriceSeries, PriceSeriesProvider,
};
use yahoo_finance_api as yahoo;

use crate::error::{FetchError, FetchResult};

/// Yahoo Finance 시세 제공자.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> FetchResult<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| FetchError::Network(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }

    /// 종가 시계열 조회.
    pub async fn fetch_quotes(&self, symbol: &str, query: &PriceQuery) -> FetchResult<PriceSeries> {
        let interval = interval_param(query.interval);
        let range = range_param(query.interval, query.limit);

        debug!(
            symbol = symbol,
            interval = interval,
            range = range,
            "Yahoo Finance API 호출"
        );

        let response = self
            .connector
            .get_quote_range(symbol, interval, range)
            .await
            .map_err(|e| FetchError::Network(format!("Yahoo Finance API 오류 ({}): {}", symbol, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| FetchError::Parse(format!("Quote 파싱 오류: {}", e)))?;

        if quotes.is_empty() {
            return Err(FetchError::empty(symbol));
        }

        let mut samples = Vec::with_capacity(quotes.len());
        for quote in &quotes {
            let timestamp = i64::try_from(quote.timestamp)
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .ok_or_else(|| FetchError::Parse(format!("잘못된 quote 시각: {}", quote.timestamp)))?;
            samples.push(PriceSample::new(
                timestamp,
                Some(quote.close),
                Some(quote.volume as f64),
            ));
        }
        samples.sort_by_key(|sample| sample.timestamp);
        samples.dedup_by_key(|sample| sample.timestamp);

        let skip = samples.len().saturating_sub(query.limit);
        let series = PriceSeries::from_samples(symbol, samples.into_iter().skip(skip))
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        if series.is_empty() {
            return Err(FetchError::empty(symbol));
        }

        info!(
            symbol = symbol,
            interval = interval,
            points = series.len(),
            "Yahoo Finance 조회 완료"
        );
        Ok(series)
    }
}

/// Yahoo 간격 문자열.
fn interval_param(interval: Interval) -> &'static str {
    match interval {
        Interval::Minute1 => "1m",
        Interval::Minute5 => "5m",
        Interval::Minute15 => "15m",
        Interval::Hour1 => "60m",
        Interval::Day1 => "1d",
    }
}

/// 요청 개수를 덮는 조회 범위 (정규장 하루 390분 기준).
///
/// 1분봉은 Yahoo가 최근 7일까지만 제공하므로 최대 "5d"입니다.
fn range_param(interval: Interval, limit: usize) -> &'static str {
    match interval {
        Interval::Minute1 => {
            if limit <= 390 {
                "1d"
            } else {
                "5d"
            }
        }
        Interval::Minute5 | Interval::Minute15 => {
            if limit <= 100 {
                "5d"
            } else {
                "1mo"
            }
        }
        Interval::Hour1 => {
            if limit <= 35 {
                "5d"
            } else if limit <= 150 {
                "1mo"
            } else {
                "3mo"
            }
        }
        Interval::Day1 => {
            if limit <= 5 {
                "5d"
            } else if limit <= 20 {
                "1mo"
            } else if limit <= 60 {
                "3mo"
            } else if limit <= 250 {
                "1y"
            } else {
                "5y"
            }
        }
    }
}

#[async_trait]
impl PriceSeriesProvider for YahooProvider {
    async fn fetch_price_series(&self, symbol: &str, query: &PriceQuery) -> CoreResult<PriceSeries> {
        Ok(self.fetch_quotes(symbol, query).await?)
    }

    fn provider_name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_param() {
        assert_eq!(interval_param(Interval::Hour1), "60m");
        assert_eq!(interval_param(Interval::Day1), "1d");
    }

    #[test]
    fn test_range_param() {
        assert_eq!(range_param(Interval::Minute1, 120), "1d");
        assert_eq!(range_param(Interval::Minute1, 1440), "5d");
        assert_eq!(range_param(Interval::Day1, 120), "1y");
        assert_eq!(range_param(Interval::Day1, 1000), "5y");
    }
}
