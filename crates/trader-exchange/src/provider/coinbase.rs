//! Coinbase Exchange 시세 조회.
//!
//! 캔들 응답은 `[time, low, high, open, close, volume]` 배열이며 최신순으로 내려오므로
//! 시간 오름차순으로 다시 정렬합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use trader_core::{
    CoreResult, Interval, PriceQuery, PriceSample, PriceSeries, PriceSeriesProvider,
};

use super::lenient_f64;
use crate::client::{build_client, get_json, normalize_base_url, DEFAULT_TIMEOUT_SECS};
use crate::error::{FetchError, FetchResult};

/// Coinbase Exchange 공개 API 기본 URL
pub const COINBASE_BASE_URL: &str = "https://api.exchange.coinbase.com";

/// 요청당 최대 캔들 수
pub const COINBASE_MAX_CANDLES: usize = 300;

/// 현재 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseTicker {
    /// 상품 ID (예: "BTC-USD")
    pub product_id: String,
    /// 마지막 체결가
    pub price: Option<f64>,
    /// 매수 호가
    pub bid: Option<f64>,
    /// 매도 호가
    pub ask: Option<f64>,
    /// 24시간 거래량
    pub volume: Option<f64>,
    /// 시각
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    price: Option<Value>,
    bid: Option<Value>,
    ask: Option<Value>,
    volume: Option<Value>,
    time: Option<String>,
}

/// Coinbase 시세 제공자.
pub struct CoinbaseProvider {
    client: Client,
    base_url: String,
}

impl CoinbaseProvider {
    /// 기본 URL로 생성.
    pub fn new() -> FetchResult<Self> {
        Self::with_base_url(COINBASE_BASE_URL)
    }

    /// 지정한 URL로 생성.
    pub fn with_base_url(base_url: impl Into<String>) -> FetchResult<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            base_url: normalize_base_url(base_url),
        })
    }

    /// 캔들 간격 (초). Coinbase가 지원하는 값만 허용됩니다.
    fn granularity(interval: Interval) -> u32 {
        interval.seconds()
    }

    /// 캔들 종가 시계열 조회 (최근 `limit`개, 최대 300개).
    pub async fn fetch_candles(
        &self,
        product_id: &str,
        query: &PriceQuery,
    ) -> FetchResult<PriceSeries> {
        let url = format!("{}/products/{}/candles", self.base_url, product_id);
        let rows: Vec<Vec<Value>> = get_json(
            &self.client,
            &url,
            &[("granularity", Self::granularity(query.interval).to_string())],
        )
        .await?;

        if rows.is_empty() {
            return Err(FetchError::empty(product_id));
        }

        let mut samples = rows
            .iter()
            .map(|row| parse_candle(row))
            .collect::<FetchResult<Vec<_>>>()?;
        samples.sort_by_key(|sample| sample.timestamp);

        let limit = query.limit.min(COINBASE_MAX_CANDLES);
        let skip = samples.len().saturating_sub(limit);
        let series = PriceSeries::from_samples(product_id, samples.into_iter().skip(skip))
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        if series.is_empty() {
            return Err(FetchError::empty(product_id));
        }

        info!(
            product_id = product_id,
            interval = %query.interval,
            points = series.len(),
            "Coinbase 캔들 조회 완료"
        );
        Ok(series)
    }

    /// 현재 시세 조회.
    pub async fn ticker(&self, product_id: &str) -> FetchResult<CoinbaseTicker> {
        let url = format!("{}/products/{}/ticker", self.base_url, product_id);
        let raw: RawTicker = get_json(&self.client, &url, &[]).await?;

        Ok(CoinbaseTicker {
            product_id: product_id.to_string(),
            price: lenient_f64(raw.price.as_ref()),
            bid: lenient_f64(raw.bid.as_ref()),
            ask: lenient_f64(raw.ask.as_ref()),
            volume: lenient_f64(raw.volume.as_ref()),
            time: raw
                .time
                .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// 캔들 한 행에서 시각, 종가, 거래량 추출.
fn parse_candle(row: &[Value]) -> FetchResult<PriceSample> {
    let time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::Parse(format!("캔들 시각 없음: {:?}", row)))?;
    let timestamp = Utc
        .timestamp_opt(time, 0)
        .single()
        .ok_or_else(|| FetchError::Parse(format!("잘못된 캔들 시각: {}", time)))?;

    Ok(PriceSample::new(
        timestamp,
        lenient_f64(row.get(4)),
        lenient_f64(row.get(5)),
    ))
}

#[async_trait]
impl PriceSeriesProvider for CoinbaseProvider {
    async fn fetch_price_series(&self, symbol: &str, query: &PriceQuery) -> CoreResult<PriceSeries> {
        Ok(self.fetch_candles(symbol, query).await?)
    }

    fn provider_name(&self) -> &str {
        "coinbase"
    }
}
