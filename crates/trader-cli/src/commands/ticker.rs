//! 24시간 시세 API 확인 명령어.
//!
//! ```bash
//! trader ticker -s BTCUSDT
//! trader ticker --source coinbase -s BTC-USD
//! ```

use std::fmt::Write as _;

use anyhow::{bail, Result};
use trader_exchange::{
    BinanceProvider, CoinbaseProvider, CoinbaseTicker, DataSource, FetchResult, Ticker24h,
    BINANCE_BASE_URL, COINBASE_BASE_URL,
};

use super::Context;
use crate::render::table::fmt_opt;

/// Binance 24시간 시세 출력 문자열
pub fn format_ticker_24h(ticker: &Ticker24h) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  심볼        : {}", ticker.symbol);
    let _ = writeln!(out, "  마지막 가격 : {}", fmt_opt(ticker.last_price, 4));
    let _ = writeln!(out, "  24h 거래량  : {}", fmt_opt(ticker.volume, 4));
    let _ = writeln!(out, "  24h 고가    : {}", fmt_opt(ticker.high_price, 4));
    let _ = writeln!(out, "  24h 저가    : {}", fmt_opt(ticker.low_price, 4));
    let _ = writeln!(
        out,
        "  24h 변동률  : {}",
        ticker
            .price_change_percent
            .map_or_else(|| "-".to_string(), |p| format!("{:+.2}%", p))
    );
    out
}

/// Coinbase 현재 시세 출력 문자열
pub fn format_coinbase_ticker(ticker: &CoinbaseTicker) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  상품        : {}", ticker.product_id);
    let _ = writeln!(out, "  마지막 가격 : {}", fmt_opt(ticker.price, 4));
    let _ = writeln!(out, "  매수 호가   : {}", fmt_opt(ticker.bid, 4));
    let _ = writeln!(out, "  매도 호가   : {}", fmt_opt(ticker.ask, 4));
    let _ = writeln!(out, "  24h 거래량  : {}", fmt_opt(ticker.volume, 4));
    if let Some(time) = ticker.time {
        let _ = writeln!(out, "  시각        : {}", time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    out
}

/// 성공/실패 메시지 출력 후 결과 전달
fn report<T>(symbol: &str, result: FetchResult<T>, format: impl Fn(&T) -> String) -> Result<()> {
    match result {
        Ok(ticker) => {
            println!("\n✅ API 요청 성공: {}", symbol);
            println!("═══════════════════════════════════════");
            print!("{}", format(&ticker));
            println!("═══════════════════════════════════════");
            Ok(())
        }
        Err(e) => {
            println!("\n❌ API 요청 실패: {} ({})", symbol, e);
            Err(e.into())
        }
    }
}

/// ticker 실행
pub async fn run(ctx: &Context) -> Result<()> {
    let options = &ctx.provider_options;

    match ctx.source {
        DataSource::Binance => {
            let provider = BinanceProvider::with_base_url(
                options.binance_url.as_deref().unwrap_or(BINANCE_BASE_URL),
            )?;
            report(
                &ctx.symbol,
                provider.ticker_24h(&ctx.symbol).await,
                format_ticker_24h,
            )
        }
        DataSource::Coinbase => {
            let provider = CoinbaseProvider::with_base_url(
                options.coinbase_url.as_deref().unwrap_or(COINBASE_BASE_URL),
            )?;
            report(
                &ctx.symbol,
                provider.ticker(&ctx.symbol).await,
                format_coinbase_ticker,
            )
        }
        other => bail!("ticker는 binance, coinbase 소스만 지원합니다: {}", other),
    }
}
