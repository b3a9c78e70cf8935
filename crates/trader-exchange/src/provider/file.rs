//! 로컬 파일 시세 로더.
//!
//! 오프라인 분석용으로 `.csv` 또는 `.json` 파일에서 가격 시계열을 읽습니다.
//!
//! ```text
//! CSV : timestamp,price[,volume]   (헤더 필수, price 대신 close 허용)
//!       2024-01-01T00:00:00Z,42000.5,12.5
//!       1704067260,,               (빈 가격 = 갭)
//! JSON: [{"timestamp": "2024-01-01T00:00:00Z", "price": 42000.5, "volume": 12.5}, ...]
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::info;
use trader_core::{CoreResult, PriceQuery, PriceSample, PriceSeries, PriceSeriesProvider};

use crate::error::{FetchError, FetchResult};

/// 초 단위와 밀리초 단위 유닉스 시각을 구분하는 경계값
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Deserialize)]
struct JsonSample {
    timestamp: DateTime<Utc>,
    #[serde(default, alias = "close")]
    price: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

/// 파일 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// 확장자로 형식 판별
    pub fn from_path(path: &Path) -> FetchResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(FileFormat::Csv),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(FetchError::Io(format!(
                "지원하지 않는 파일 형식: {} (.csv, .json)",
                path.display()
            ))),
        }
    }
}

/// 로컬 파일 시세 제공자.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일 전체를 시계열로 로드.
    pub async fn load(&self, symbol: &str) -> FetchResult<PriceSeries> {
        let format = FileFormat::from_path(&self.path)?;
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;

        let samples = match format {
            FileFormat::Csv => parse_csv(&text)?,
            FileFormat::Json => parse_json(&text)?,
        };

        let series = PriceSeries::from_samples(symbol, samples)
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        if series.is_empty() {
            return Err(FetchError::empty(symbol));
        }

        info!(
            path = %self.path.display(),
            points = series.len(),
            "파일 시세 로드 완료"
        );
        Ok(series)
    }
}

fn parse_csv(text: &str) -> FetchResult<Vec<PriceSample>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.contains(&h.to_lowercase().as_str()))
    };
    let ts_col = find(&["timestamp", "time", "date", "datetime"])
        .ok_or_else(|| FetchError::Parse("CSV에 timestamp 열이 없습니다".to_string()))?;
    let price_col = find(&["price", "close"])
        .ok_or_else(|| FetchError::Parse("CSV에 price 열이 없습니다".to_string()))?;
    let volume_col = find(&["volume", "vol"]);

    let mut samples = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let raw_ts = record.get(ts_col).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| FetchError::Parse(format!("{}행: 잘못된 시각 '{}'", line + 2, raw_ts)))?;

        let raw_price = record.get(price_col).unwrap_or_default();
        let price = if raw_price.is_empty() {
            None
        } else {
            Some(raw_price.parse::<f64>().map_err(|_| {
                FetchError::Parse(format!("{}행: 잘못된 가격 '{}'", line + 2, raw_price))
            })?)
        };
        // 거래량은 보조 값이므로 읽을 수 없으면 비워 둠
        let volume = volume_col
            .and_then(|col| record.get(col))
            .and_then(|raw| raw.parse::<f64>().ok());
        samples.push(PriceSample::new(timestamp, price, volume));
    }
    Ok(samples)
}

fn parse_json(text: &str) -> FetchResult<Vec<PriceSample>> {
    let rows: Vec<JsonSample> = serde_json::from_str(text)?;
    Ok(rows
        .into_iter()
        .map(|r| PriceSample::new(r.timestamp, r.price, r.volume))
        .collect())
}

/// RFC3339 또는 유닉스 시각(초/밀리초) 파싱.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let value: i64 = raw.parse().ok()?;
    if value.abs() >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

#[async_trait]
impl PriceSeriesProvider for FileProvider {
    /// 파일을 로드한 뒤 최근 `limit`개만 반환합니다. 간격은 파일 내용을 따릅니다.
    async fn fetch_price_series(&self, symbol: &str, query: &PriceQuery) -> CoreResult<PriceSeries> {
        let series = self.load(symbol).await?;
        Ok(series.tail(query.limit))
    }

    fn provider_name(&self) -> &str {
        "file"
    }
}
