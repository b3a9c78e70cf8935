//! 지표 분석 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # BTCUSDT 1분봉 1440개로 이동평균/볼린저 밴드/변동성 계산
//! trader analyze -s BTCUSDT
//!
//! # Coinbase 시세, 결과를 JSON과 PNG로 저장
//! trader analyze --source coinbase -s BTC-USD -o out/btc.json --chart out/btc.png
//!
//! # 로컬 CSV 파일, 밴드 윈도우 20
//! trader analyze --source file --input data/prices.csv --band-window 20
//! ```

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use trader_analytics::{IndicatorParams, IndicatorSet};
use trader_core::PriceSeries;

use super::{save_json, Context, IndicatorArgs};
use crate::render::chart::{ChartConfig, ChartRenderer};
use crate::render::table::{fmt_pct, indicator_table};

/// analyze 명령 옵션
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub indicators: IndicatorArgs,
    /// 출력할 최근 행 수
    pub rows: Option<usize>,
    /// JSON 결과 경로
    pub output: Option<PathBuf>,
    /// PNG 차트 경로
    pub chart: Option<PathBuf>,
}

/// 시점별 지표 값
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    pub short_sma: Option<f64>,
    pub long_sma: Option<f64>,
    pub upper_band: Option<f64>,
    pub middle_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub volatility: Option<f64>,
}

/// JSON 결과
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub source: String,
    pub interval: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub params: IndicatorParams,
    pub realized_volatility: Option<f64>,
    pub rows: Vec<AnalysisRow>,
}

/// 시계열과 지표를 행 단위로 합치기
pub fn build_rows(series: &PriceSeries, indicators: &IndicatorSet) -> Vec<AnalysisRow> {
    series
        .iter()
        .enumerate()
        .map(|(i, point)| AnalysisRow {
            timestamp: point.timestamp,
            price: point.price,
            volume: point.volume,
            short_sma: indicators.short_sma.get(i),
            long_sma: indicators.long_sma.get(i),
            upper_band: indicators.bands.upper.get(i),
            middle_band: indicators.bands.middle.get(i),
            lower_band: indicators.bands.lower.get(i),
            volatility: indicators.volatility.get(i),
        })
        .collect()
}

/// 데이터 기간 표시 ("시작 ~ 종료")
pub fn period_label(series: &PriceSeries) -> String {
    match series.time_range() {
        Some((start, end)) => format!(
            "{} ~ {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        ),
        None => "-".to_string(),
    }
}

/// 지표 파라미터 결정 (설정 파일 → CLI 플래그)
pub fn resolve_params(ctx: &Context, args: &IndicatorArgs) -> Result<IndicatorParams> {
    let base = match &ctx.config_path {
        Some(_) => ctx.base_simulation_config()?.indicators,
        None => IndicatorParams::default(),
    };
    let params = args.apply(base, ctx.periods_per_year());
    params.validate()?;
    Ok(params)
}

/// analyze 실행
pub async fn run(ctx: &Context, options: AnalyzeOptions) -> Result<()> {
    let params = resolve_params(ctx, &options.indicators)?;
    let series = ctx.fetch_series().await?;
    let indicators = IndicatorSet::compute(&series, &params)?;

    info!(
        symbol = %ctx.symbol,
        points = series.len(),
        realized_volatility = ?indicators.realized_volatility,
        "지표 분석 완료"
    );

    let rows = options.rows.unwrap_or(ctx.dashboard.table_rows);
    println!(
        "\n📈 {} ({}, {}) - {}개 포인트, 기간: {}",
        series.symbol(),
        ctx.source,
        ctx.query.interval,
        series.len(),
        period_label(&series)
    );
    println!("═══════════════════════════════════════════════════════════════");
    print!("{}", indicator_table(&series, &indicators, rows));
    println!("═══════════════════════════════════════════════════════════════");
    println!(
        "전체 구간 실현 변동성 (연율화): {}",
        fmt_pct(indicators.realized_volatility)
    );
    if let Some(band) = indicators.bands.last() {
        println!(
            "최근 밴드 폭: {:.4} / %B: {}",
            band.width(),
            band.percent_b(series.last_price().unwrap_or(band.middle))
                .map_or_else(|| "-".to_string(), |b| format!("{:.2}", b))
        );
    }

    if let Some(path) = &options.chart {
        let renderer = ChartRenderer::with_config(
            ChartConfig::default().with_size(ctx.dashboard.chart_width, ctx.dashboard.chart_height),
        );
        match renderer.render_indicators(&series, &indicators, path) {
            Ok(()) => println!("\n📊 차트 저장: {}", path.display()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "차트 생성 실패");
                println!("\n⚠️ 차트 생성 실패: {}", e);
            }
        }
    }

    if let Some(path) = &options.output {
        let range = series.time_range();
        let report = AnalysisReport {
            symbol: series.symbol().to_string(),
            source: ctx.source.to_string(),
            interval: ctx.query.interval.to_string(),
            start_time: range.map(|(start, _)| start),
            end_time: range.map(|(_, end)| end),
            params,
            realized_volatility: indicators.realized_volatility,
            rows: build_rows(&series, &indicators),
        };
        save_json(&report, path)?;
        println!("💾 결과 저장: {}", path.display());
    }

    Ok(())
}
