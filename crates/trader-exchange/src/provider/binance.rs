//! Binance 시세 조회.
//!
//! # 엔드포인트
//!
//! ```text
//! GET /api/v3/klines?symbol=BTCUSDT&interval=1m&limit=1000
//!     → [[open_time_ms, "open", "high", "low", "close", "volume", ...], ...]
//! GET /api/v3/ticker/24hr?symbol=BTCUSDT
//!     → { "lastPrice": "...", "volume": "...", "highPrice": "...", "lowPrice": "..." }
//! ```
//!
//! 인증이 필요 없는 공개 시세 API만 사용합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use trader_core::{
    CoreResult, Interval, PriceQuery, PriceSample, PriceSeries, PriceSeriesProvider,
};

use super::lenient_f64;
use crate::client::{build_client, get_json, normalize_base_url, DEFAULT_TIMEOUT_SECS};
use crate::error::{FetchError, FetchResult};

/// Binance 공개 API 기본 URL
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// 요청당 최대 캔들 수
pub const BINANCE_MAX_LIMIT: usize = 1000;

/// 24시간 시세 요약.
///
/// 응답에 없는 필드는 `None`으로 남깁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker24h {
    /// 심볼
    pub symbol: String,
    /// 마지막 체결가
    pub last_price: Option<f64>,
    /// 24시간 거래량
    pub volume: Option<f64>,
    /// 24시간 고가
    pub high_price: Option<f64>,
    /// 24시간 저가
    pub low_price: Option<f64>,
    /// 24시간 변동률 (%)
    pub price_change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker24h {
    symbol: Option<String>,
    last_price: Option<Value>,
    volume: Option<Value>,
    high_price: Option<Value>,
    low_price: Option<Value>,
    price_change_percent: Option<Value>,
}

/// Binance 시세 제공자.
pub struct BinanceProvider {
    client: Client,
    base_url: String,
}

impl BinanceProvider {
    /// 기본 URL로 생성.
    pub fn new() -> FetchResult<Self> {
        Self::with_base_url(BINANCE_BASE_URL)
    }

    /// 지정한 URL로 생성 (테스트용 mock 서버 등).
    pub fn with_base_url(base_url: impl Into<String>) -> FetchResult<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Binance 간격 문자열
    fn interval_param(interval: Interval) -> &'static str {
        interval.as_str()
    }

    /// 캔들 종가 시계열 조회.
    pub async fn fetch_klines(&self, symbol: &str, query: &PriceQuery) -> FetchResult<PriceSeries> {
        let limit = query.limit.clamp(1, BINANCE_MAX_LIMIT);
        if limit != query.limit {
            debug!(requested = query.limit, limit, "Binance 조회 개수 조정");
        }

        let url = format!("{}/api/v3/klines", self.base_url);
        let rows: Vec<Vec<Value>> = get_json(
            &self.client,
            &url,
            &[
                ("symbol", symbol.to_uppercase()),
                ("interval", Self::interval_param(query.interval).to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await?;

        if rows.is_empty() {
            return Err(FetchError::empty(symbol));
        }

        let samples = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<FetchResult<Vec<_>>>()?;

        let series = PriceSeries::from_samples(symbol, samples)
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        if series.is_empty() {
            return Err(FetchError::empty(symbol));
        }

        info!(
            symbol = symbol,
            interval = %query.interval,
            points = series.len(),
            "Binance 캔들 조회 완료"
        );
        Ok(series)
    }

    /// 24시간 시세 요약 조회.
    pub async fn ticker_24h(&self, symbol: &str) -> FetchResult<Ticker24h> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let raw: RawTicker24h =
            get_json(&self.client, &url, &[("symbol", symbol.to_uppercase())]).await?;

        Ok(Ticker24h {
            symbol: raw.symbol.unwrap_or_else(|| symbol.to_uppercase()),
            last_price: lenient_f64(raw.last_price.as_ref()),
            volume: lenient_f64(raw.volume.as_ref()),
            high_price: lenient_f64(raw.high_price.as_ref()),
            low_price: lenient_f64(raw.low_price.as_ref()),
            price_change_percent: lenient_f64(raw.price_change_percent.as_ref()),
        })
    }
}

/// 캔들 한 행에서 시가 시각, 종가, 거래량 추출.
///
/// 종가를 읽을 수 없으면 갭(`None`)으로 남기고, 시각이 없으면 응답 형식 오류입니다.
fn parse_kline(row: &[Value]) -> FetchResult<PriceSample> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::Parse(format!("캔들 시각 없음: {:?}", row)))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time)
        .single()
        .ok_or_else(|| FetchError::Parse(format!("잘못된 캔들 시각: {}", open_time)))?;

    Ok(PriceSample::new(
        timestamp,
        lenient_f64(row.get(4)),
        lenient_f64(row.get(5)),
    ))
}

#[async_trait]
impl PriceSeriesProvider for BinanceProvider {
    async fn fetch_price_series(&self, symbol: &str, query: &PriceQuery) -> CoreResult<PriceSeries> {
        Ok(self.fetch_klines(symbol, query).await?)
    }

    fn provider_name(&self) -> &str {
        "binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline() {
        let row = vec![
            json!(1_700_000_000_000i64),
            json!("100.0"),
            json!("101.0"),
            json!("99.0"),
            json!("100.5"),
            json!("12.3"),
        ];
        let sample = parse_kline(&row).unwrap();
        assert_eq!(sample.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(sample.price, Some(100.5));
        assert_eq!(sample.volume, Some(12.3));
    }

    #[test]
    fn test_parse_kline_missing_close_is_gap() {
        let row = vec![json!(1_700_000_000_000i64), json!("100.0")];
        let sample = parse_kline(&row).unwrap();
        assert_eq!(sample.price, None);
        assert_eq!(sample.volume, None);
    }

    #[test]
    fn test_parse_kline_without_time_is_error() {
        let row = vec![json!("abc"), json!("100.0")];
        assert!(matches!(parse_kline(&row), Err(FetchError::Parse(_))));
    }
}
