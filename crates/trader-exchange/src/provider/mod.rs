//! PriceSeriesProvider 구현체.
//!
//! # Provider 구조
//!
//! - [`BinanceProvider`]: Binance 캔들 + 24시간 시세
//! - [`CoinbaseProvider`]: Coinbase 캔들 + 현재 시세
//! - [`YahooProvider`]: Yahoo Finance 주식/ETF 시세
//! - [`FileProvider`]: 로컬 CSV/JSON 파일

mod binance;
mod coinbase;
mod file;
mod yahoo;

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trader_core::PriceSeriesProvider;

pub use binance::{BinanceProvider, Ticker24h, BINANCE_BASE_URL, BINANCE_MAX_LIMIT};
pub use coinbase::{CoinbaseProvider, CoinbaseTicker, COINBASE_BASE_URL, COINBASE_MAX_CANDLES};
pub use file::{FileFormat, FileProvider};
pub use yahoo::YahooProvider;

use crate::error::{FetchError, FetchResult};

/// 숫자 또는 숫자 문자열을 f64로 변환 (실패 시 None).
pub(crate) fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 데이터 소스 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Binance,
    Coinbase,
    Yahoo,
    File,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Binance => "binance",
            DataSource::Coinbase => "coinbase",
            DataSource::Yahoo => "yahoo",
            DataSource::File => "file",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(DataSource::Binance),
            "coinbase" => Ok(DataSource::Coinbase),
            "yahoo" | "yahoo_finance" => Ok(DataSource::Yahoo),
            "file" | "local" => Ok(DataSource::File),
            other => Err(FetchError::Parse(format!(
                "알 수 없는 데이터 소스: {} (지원: binance, coinbase, yahoo, file)",
                other
            ))),
        }
    }
}

/// Provider 생성 옵션.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Binance base URL 재정의
    pub binance_url: Option<String>,
    /// Coinbase base URL 재정의
    pub coinbase_url: Option<String>,
    /// 로컬 파일 경로 (`DataSource::File` 필수)
    pub input: Option<PathBuf>,
}

/// 데이터 소스에 맞는 provider 생성.
pub fn create_provider(
    source: DataSource,
    options: &ProviderOptions,
) -> FetchResult<Box<dyn PriceSeriesProvider>> {
    Ok(match source {
        DataSource::Binance => Box::new(BinanceProvider::with_base_url(
            options.binance_url.as_deref().unwrap_or(BINANCE_BASE_URL),
        )?),
        DataSource::Coinbase => Box::new(CoinbaseProvider::with_base_url(
            options.coinbase_url.as_deref().unwrap_or(COINBASE_BASE_URL),
        )?),
        DataSource::Yahoo => Box::new(YahooProvider::new()?),
        DataSource::File => {
            let path = options.input.clone().ok_or_else(|| {
                FetchError::Io("file 소스에는 입력 파일 경로가 필요합니다".to_string())
            })?;
            Box::new(FileProvider::new(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_f64() {
        assert_eq!(lenient_f64(Some(&json!("42.5"))), Some(42.5));
        assert_eq!(lenient_f64(Some(&json!(7))), Some(7.0));
        assert_eq!(lenient_f64(Some(&json!("n/a"))), None);
        assert_eq!(lenient_f64(Some(&json!(null))), None);
        assert_eq!(lenient_f64(None), None);
    }

    #[test]
    fn test_data_source_parse() {
        assert_eq!("Binance".parse::<DataSource>().unwrap(), DataSource::Binance);
        assert_eq!("local".parse::<DataSource>().unwrap(), DataSource::File);
        assert!("kraken".parse::<DataSource>().is_err());
    }

    #[test]
    fn test_file_source_requires_path() {
        let result = create_provider(DataSource::File, &ProviderOptions::default());
        assert!(matches!(result, Err(FetchError::Io(_))));

        let options = ProviderOptions {
            input: Some(PathBuf::from("prices.csv")),
            ..Default::default()
        };
        let provider = create_provider(DataSource::File, &options).unwrap();
        assert_eq!(provider.provider_name(), "file");
    }
}
