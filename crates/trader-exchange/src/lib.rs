//! 시장 데이터 조회 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - Binance, Coinbase, Yahoo Finance HTTP 조회 (`PriceSeriesProvider` 구현)
//! - 로컬 CSV/JSON 파일 로더
//! - 조회 실패를 `CoreError::UpstreamUnavailable`로 통일하는 `FetchError`
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_core::{Interval, PriceQuery, PriceSeriesProvider};
//! use trader_exchange::BinanceProvider;
//!
//! let provider = BinanceProvider::new()?;
//! let series = provider
//!     .fetch_price_series("BTCUSDT", &PriceQuery::new(Interval::Minute1, 1000))
//!     .await?;
//! ```

mod client;
pub mod error;
pub mod provider;

pub use client::DEFAULT_TIMEOUT_SECS;
pub use error::{FetchError, FetchResult};
pub use provider::{
    create_provider, BinanceProvider, CoinbaseProvider, CoinbaseTicker, DataSource, FileFormat,
    FileProvider, ProviderOptions, Ticker24h, YahooProvider, BINANCE_BASE_URL, COINBASE_BASE_URL,
};
