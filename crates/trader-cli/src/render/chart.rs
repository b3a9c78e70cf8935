//! PNG 차트 생성.
//!
//! # 생성되는 차트
//!
//! 1. **지표 차트** (`analyze`): 가격 + 단기/장기 이동평균 + 볼린저 밴드,
//!    거래량이 있으면 하단 거래량 막대
//! 2. **시뮬레이션 차트** (`simulate`): 상단 지표 차트에 매수/매도 마커, 하단 평가 자산 곡선
//!
//! # 기술적 참고
//!
//! plotters의 RangedDateTime은 내부적으로 나노초 계산 시 overflow가 발생할 수 있어,
//! 타임스탬프를 f64로 변환하여 처리합니다. 지표의 값 없는 구간은 선을 끊어서 그립니다.

use std::ops::Range;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use trader_analytics::{IndicatorSet, SimulationReport};
use trader_core::{PriceSeries, RollingSeries, TradeKind};

type PriceChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// 차트 생성 설정
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// 차트 너비 (픽셀)
    pub width: u32,
    /// 차트 높이 (픽셀)
    pub height: u32,
    /// 배경색
    pub background_color: RGBColor,
    /// 가격 색상
    pub price_color: RGBColor,
    /// 단기 이동평균 색상
    pub short_sma_color: RGBColor,
    /// 장기 이동평균 색상
    pub long_sma_color: RGBColor,
    /// 볼린저 밴드 색상
    pub band_color: RGBColor,
    /// 자산 곡선 색상
    pub equity_color: RGBColor,
    /// 거래량 막대 색상
    pub volume_color: RGBColor,
    /// 매수 마커 색상
    pub buy_color: RGBColor,
    /// 매도 마커 색상
    pub sell_color: RGBColor,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1000,
            background_color: WHITE,
            price_color: RGBColor(30, 30, 30),
            short_sma_color: RGBColor(230, 120, 0),
            long_sma_color: RGBColor(120, 0, 180),
            band_color: RGBColor(0, 100, 180),
            equity_color: RGBColor(0, 100, 180),
            volume_color: RGBColor(100, 100, 100),
            buy_color: RGBColor(0, 150, 0),
            sell_color: RGBColor(200, 0, 0),
        }
    }
}

impl ChartConfig {
    /// 크기 지정
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// 차트 생성기
pub struct ChartRenderer {
    config: ChartConfig,
}

impl ChartRenderer {
    /// 기본 설정으로 생성
    pub fn new() -> Self {
        Self {
            config: ChartConfig::default(),
        }
    }

    /// 사용자 지정 설정으로 생성
    pub fn with_config(config: ChartConfig) -> Self {
        Self { config }
    }

    /// 가격 + 이동평균 + 볼린저 밴드 차트 (거래량이 있으면 70/30 분할)
    pub fn render_indicators(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
        output_path: &Path,
    ) -> Result<()> {
        ensure_plottable(series)?;

        let root = BitMapBackend::new(output_path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&self.config.background_color)?;

        let caption = format!("{} Price & Indicators", series.symbol());
        if series.has_volume() {
            let (upper, lower) = root.split_vertically((self.config.height / 10) * 7);
            self.draw_price_panel(&upper, series, indicators, None, &caption)?;
            self.draw_volume_panel(&lower, series)?;
        } else {
            self.draw_price_panel(&root, series, indicators, None, &caption)?;
        }

        root.present()?;
        Ok(())
    }

    /// 시뮬레이션 결과 2패널 차트 (가격/신호 70% + 자산 곡선 30%)
    pub fn render_simulation(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
        report: &SimulationReport,
        output_path: &Path,
    ) -> Result<()> {
        ensure_plottable(series)?;
        if report.equity_curve.len() < 2 {
            return Err(anyhow!(
                "자산 곡선 데이터가 부족합니다 ({} 포인트)",
                report.equity_curve.len()
            ));
        }

        let root = BitMapBackend::new(output_path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&self.config.background_color)?;

        let (upper, lower) = root.split_vertically((self.config.height / 10) * 7);

        let caption = format!(
            "{} {} Simulation ({:+.2}%)",
            report.symbol, report.config.strategy, report.return_pct
        );
        self.draw_price_panel(&upper, series, indicators, Some(report), &caption)?;
        self.draw_equity_panel(&lower, report)?;

        root.present()?;
        Ok(())
    }

    /// 가격 패널 그리기 (f64 타임스탬프 좌표계)
    fn draw_price_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        series: &PriceSeries,
        indicators: &IndicatorSet,
        report: Option<&SimulationReport>,
        caption: &str,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let xs: Vec<f64> = series
            .iter()
            .map(|p| p.timestamp.timestamp() as f64)
            .collect();
        let time_range = padded_range(xs.iter().copied(), 0.0);
        let price_range = padded_range(
            series
                .iter()
                .map(|p| p.price)
                .chain(indicators.bands.upper.iter().flatten())
                .chain(indicators.bands.lower.iter().flatten()),
            0.05,
        );

        let mut chart = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(time_range, price_range)?;

        chart
            .configure_mesh()
            .x_labels(10)
            .y_labels(8)
            .x_label_formatter(&|ts| timestamp_label(*ts))
            .y_label_formatter(&|v| format!("{:.2}", v))
            .draw()?;

        let band_style: ShapeStyle = self.config.band_color.mix(0.5).into();
        self.draw_rolling(&mut chart, &xs, &indicators.bands.upper, band_style, "Upper band")?;
        self.draw_rolling(&mut chart, &xs, &indicators.bands.lower, band_style, "Lower band")?;
        self.draw_rolling(
            &mut chart,
            &xs,
            &indicators.short_sma,
            self.config.short_sma_color.stroke_width(2),
            &format!("SMA({})", indicators.params.short_window),
        )?;
        self.draw_rolling(
            &mut chart,
            &xs,
            &indicators.long_sma,
            self.config.long_sma_color.stroke_width(2),
            &format!("SMA({})", indicators.params.long_window),
        )?;

        let price_color = self.config.price_color;
        chart
            .draw_series(LineSeries::new(
                series.iter().map(|p| (p.timestamp.timestamp() as f64, p.price)),
                &price_color,
            ))?
            .label("Price")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], price_color));

        if let Some(report) = report {
            self.add_trade_markers(&mut chart, report)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }

    /// 값 없는 구간에서 끊어지는 롤링 시계열 라인
    fn draw_rolling<DB: DrawingBackend>(
        &self,
        chart: &mut PriceChart<'_, DB>,
        xs: &[f64],
        values: &RollingSeries,
        style: ShapeStyle,
        label: &str,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        for (i, segment) in defined_segments(xs, values).into_iter().enumerate() {
            let anno = chart.draw_series(LineSeries::new(segment, style))?;
            if i == 0 {
                anno.label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }
        Ok(())
    }

    /// 매수/매도 마커 추가
    fn add_trade_markers<DB: DrawingBackend>(
        &self,
        chart: &mut PriceChart<'_, DB>,
        report: &SimulationReport,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let point = |kind: TradeKind| -> Vec<(f64, f64)> {
            report
                .trades
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| (t.timestamp.timestamp() as f64, t.price))
                .collect()
        };

        chart.draw_series(PointSeries::of_element(
            point(TradeKind::Buy),
            8,
            &self.config.buy_color,
            &|coord, size, style| {
                EmptyElement::at(coord) + Circle::new((0, 0), size, style.filled())
            },
        ))?;

        chart.draw_series(PointSeries::of_element(
            point(TradeKind::Sell),
            6,
            &self.config.sell_color,
            &|coord, size, style| {
                EmptyElement::at(coord) + Circle::new((0, 0), size, style.filled())
            },
        ))?;

        Ok(())
    }

    /// 거래량 막대 패널
    fn draw_volume_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        series: &PriceSeries,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let bars = volume_bars(series);
        let time_range = padded_range(series.iter().map(|p| p.timestamp.timestamp() as f64), 0.0);
        let max_volume = bars.iter().map(|(_, _, v)| *v).fold(0.0, f64::max);
        let volume_range = 0.0..if max_volume > 0.0 { max_volume * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(area)
            .caption("Volume", ("sans-serif", 18).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(time_range, volume_range)?;

        chart
            .configure_mesh()
            .x_labels(10)
            .y_labels(5)
            .x_label_formatter(&|ts| timestamp_label(*ts))
            .y_label_formatter(&|v| format_currency(*v))
            .draw()?;

        let style = self.config.volume_color.mix(0.6).filled();
        chart.draw_series(
            bars.into_iter()
                .map(|(left, right, v)| Rectangle::new([(left, 0.0), (right, v)], style)),
        )?;

        Ok(())
    }

    /// 평가 자산 곡선 패널
    fn draw_equity_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        report: &SimulationReport,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let data: Vec<(f64, f64)> = report
            .equity_curve
            .iter()
            .map(|p| (p.timestamp.timestamp() as f64, p.equity))
            .collect();

        let time_range = padded_range(data.iter().map(|(x, _)| *x), 0.0);
        let equity_range = padded_range(data.iter().map(|(_, y)| *y), 0.1);

        let mut chart = ChartBuilder::on(area)
            .caption("Equity Curve", ("sans-serif", 18).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(time_range, equity_range.clone())?;

        chart
            .configure_mesh()
            .x_labels(10)
            .y_labels(6)
            .x_label_formatter(&|ts| timestamp_label(*ts))
            .y_label_formatter(&|v| format_currency(*v))
            .draw()?;

        chart.draw_series(LineSeries::new(data.clone(), &self.config.equity_color))?;

        // 영역 채우기 (반투명)
        let fill_color = self.config.equity_color.mix(0.2);
        chart.draw_series(AreaSeries::new(data, equity_range.start, fill_color))?;

        Ok(())
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_plottable(series: &PriceSeries) -> Result<()> {
    // 최소 2개 이상의 데이터 포인트가 필요 (plotters 오버플로우 방지)
    if series.len() < 2 {
        return Err(anyhow!(
            "차트를 그리기에 데이터가 부족합니다 ({} 포인트)",
            series.len()
        ));
    }
    Ok(())
}

/// 값 범위 + 여백. 값이 하나뿐이거나 모두 같으면 ±1 범위로 확장합니다.
fn padded_range(values: impl Iterator<Item = f64>, margin_ratio: f64) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if max - min <= f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }

    let margin = (max - min) * margin_ratio;
    (min - margin)..(max + margin)
}

/// 거래량 막대 (왼쪽 x, 오른쪽 x, 거래량). 막대 폭은 평균 간격의 80%입니다.
fn volume_bars(series: &PriceSeries) -> Vec<(f64, f64, f64)> {
    let half_width = match series.time_range() {
        Some((first, last)) if series.len() > 1 => {
            (last - first).num_seconds() as f64 / (series.len() - 1) as f64 * 0.4
        }
        _ => 0.5,
    };

    series
        .iter()
        .filter_map(|p| {
            let x = p.timestamp.timestamp() as f64;
            p.volume.map(|v| (x - half_width, x + half_width, v))
        })
        .collect()
}

/// 정의된 값만 연속 구간별로 묶기
fn defined_segments(xs: &[f64], values: &RollingSeries) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for (x, value) in xs.iter().zip(values.iter()) {
        match value {
            Some(v) => current.push((*x, v)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// f64 타임스탬프를 축 라벨로 변환
fn timestamp_label(ts: f64) -> String {
    Utc.timestamp_opt(ts as i64, 0)
        .single()
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// 통화 형식으로 포맷
fn format_currency(v: f64) -> String {
    if v >= 1_000_000_000.0 {
        format!("{:.1}B", v / 1_000_000_000.0)
    } else if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_config() {
        let config = ChartConfig::default().with_size(800, 600);
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range([10.0, 20.0].into_iter(), 0.1);
        assert!((range.start - 9.0).abs() < 1e-9);
        assert!((range.end - 21.0).abs() < 1e-9);

        let flat = padded_range([5.0, 5.0].into_iter(), 0.1);
        assert_eq!(flat, 4.0..6.0);

        assert_eq!(padded_range(std::iter::empty(), 0.1), 0.0..1.0);
    }

    #[test]
    fn test_defined_segments_split_on_gaps() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let values = RollingSeries::new(vec![None, Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]);

        let segments = defined_segments(&xs, &values);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], vec![(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(segments[1], vec![(4.0, 4.0), (5.0, 5.0)]);
    }

    #[test]
    fn test_volume_bars_skip_missing() {
        let base = Utc.timestamp_opt(0, 0).unwrap();
        let samples = vec![
            (base, Some(1.0), Some(10.0)),
            (base + chrono::Duration::seconds(100), Some(2.0), None),
            (base + chrono::Duration::seconds(200), Some(3.0), Some(30.0)),
        ];
        let series = PriceSeries::from_samples("VOL", samples).unwrap();

        let bars = volume_bars(&series);
        assert_eq!(bars, vec![(-40.0, 40.0, 10.0), (160.0, 240.0, 30.0)]);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_500_000_000.0), "1.5B");
        assert_eq!(format_currency(2_500_000.0), "2.5M");
        assert_eq!(format_currency(10_500.0), "10.5K");
        assert_eq!(format_currency(98.02), "98.02");
    }

    #[test]
    fn test_render_requires_two_points() {
        let series = PriceSeries::from_prices("TEST", &[100.0]).unwrap();
        let indicators =
            IndicatorSet::compute(&series, &trader_analytics::IndicatorParams::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = ChartRenderer::new().render_indicators(
            &series,
            &indicators,
            &dir.path().join("chart.png"),
        );
        assert!(result.is_err());
    }
}
