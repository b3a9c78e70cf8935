//! 신호 시뮬레이션 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # 모멘텀 전략 (직전 가격 대비 상승 매수, 하락 매도)
//! trader simulate -s BTCUSDT --capital 1000 --fee 0.1
//!
//! # 단기/장기 이동평균 교차 전략, 변동성 80% 초과 시 매수 차단
//! trader simulate --strategy crossover --short-window 20 --long-window 50 --risk-threshold 0.8
//!
//! # 설정 파일 사용 + 결과 저장
//! trader simulate -c config/simulation.toml -o out/report.json --chart out/report.png
//! ```

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};
use trader_analytics::{IndicatorSet, SignalSimulator, SimulationConfig};

use super::{save_json, Context, IndicatorArgs, SimulationArgs};
use crate::render::chart::{ChartConfig, ChartRenderer};
use crate::render::table::trade_table;

/// simulate 명령 옵션
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub indicators: IndicatorArgs,
    pub simulation: SimulationArgs,
    /// 출력할 최근 거래 수 (없으면 전체)
    pub trades: Option<usize>,
    /// JSON 보고서 경로
    pub output: Option<PathBuf>,
    /// PNG 차트 경로
    pub chart: Option<PathBuf>,
}

/// 시뮬레이션 설정 결정 (환경/설정 파일 → CLI 플래그)
pub fn resolve_config(
    ctx: &Context,
    indicators: &IndicatorArgs,
    simulation: &SimulationArgs,
) -> Result<SimulationConfig> {
    let base = ctx.base_simulation_config()?;
    let params = indicators.apply(base.indicators.clone(), ctx.periods_per_year());
    let config = simulation.apply(base).with_indicators(params);
    config.validate()?;
    Ok(config)
}

/// simulate 실행
pub async fn run(ctx: &Context, options: SimulateOptions) -> Result<()> {
    let config = resolve_config(ctx, &options.indicators, &options.simulation)?;
    let series = ctx.fetch_series().await?;

    let indicators = IndicatorSet::compute(&series, &config.indicators)?;
    let simulator = SignalSimulator::new(config);
    let report = simulator.run_with_indicators(&series, &indicators)?;

    info!(
        symbol = %report.symbol,
        rule = simulator.rule_name(),
        trades = report.trades.len(),
        final_value = report.final_portfolio_value,
        "시뮬레이션 명령 완료"
    );

    println!("\n📋 거래 로그 ({}건)", report.trades.len());
    println!("═══════════════════════════════════════════════════════════════");
    print!("{}", trade_table(&report.trades, options.trades));
    println!("\n{}", report.summary());

    if let Some(path) = &options.chart {
        let renderer = ChartRenderer::with_config(
            ChartConfig::default().with_size(ctx.dashboard.chart_width, ctx.dashboard.chart_height),
        );
        match renderer.render_simulation(&series, &indicators, &report, path) {
            Ok(()) => println!("\n📊 차트 저장: {}", path.display()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "차트 생성 실패");
                println!("\n⚠️ 차트 생성 실패: {}", e);
            }
        }
    }

    if let Some(path) = &options.output {
        save_json(&report, path)?;
        println!("💾 보고서 저장: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use trader_analytics::StrategyKind;

    use super::*;
    use crate::commands::DataArgs;
    use crate::config::DashboardConfig;

    fn context(config_path: Option<PathBuf>) -> Context {
        let dashboard = DashboardConfig {
            starting_capital: 1_000.0,
            fee_percent: 0.5,
            ..Default::default()
        };
        Context::resolve(dashboard, &DataArgs::default(), config_path)
    }

    #[test]
    fn test_resolve_config_from_dashboard() {
        let ctx = context(None);
        let args = SimulationArgs {
            fee: Some(0.2),
            ..Default::default()
        };

        let config = resolve_config(&ctx, &IndicatorArgs::default(), &args).unwrap();
        assert_eq!(config.starting_capital, 1_000.0);
        assert_eq!(config.fee_percent, 0.2);
        assert_eq!(config.indicators.periods_per_year, 525_600.0);
    }

    #[test]
    fn test_resolve_config_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"starting_capital": 250.0, "strategy": "crossover", "indicators": {{"short_window": 3, "long_window": 8}}}}"#
        )
        .unwrap();

        let ctx = context(Some(file.path().to_path_buf()));
        let indicators = IndicatorArgs {
            long_window: Some(12),
            ..Default::default()
        };
        let config = resolve_config(&ctx, &indicators, &SimulationArgs::default()).unwrap();

        assert_eq!(config.starting_capital, 250.0);
        assert_eq!(config.strategy, StrategyKind::Crossover);
        assert_eq!(config.indicators.short_window, 3);
        assert_eq!(config.indicators.long_window, 12);
        // 설정 파일 값이 환경 기본값보다 우선
        assert_eq!(config.fee_percent, 0.1);
    }

    #[test]
    fn test_resolve_config_rejects_bad_fee() {
        let ctx = context(None);
        let args = SimulationArgs {
            fee: Some(150.0),
            ..Default::default()
        };
        assert!(resolve_config(&ctx, &IndicatorArgs::default(), &args).is_err());
    }
}
