//! 이동평균 윈도우 조합 탐색.
//!
//! 각 (단기, 장기) 조합을 독립된 시뮬레이션으로 실행합니다. 조합마다 시계열 복사본과
//! 자체 상태를 사용하므로 공유 가변 상태가 없습니다.
//!
//! # 사용 예시
//!
//! ```bash
//! trader sweep -s BTCUSDT --short-windows 5,10,20 --long-windows 50,100,200 --top 5
//! ```

use anyhow::{bail, Result};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use trader_analytics::{SignalSimulator, SimulationConfig, SimulationReport, StrategyKind};
use trader_core::PriceSeries;

use super::{save_json, Context, SimulationArgs};
use crate::render::table::sweep_table;

/// sweep 명령 옵션
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub simulation: SimulationArgs,
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    /// 출력할 상위 조합 수
    pub top: usize,
    /// JSON 결과 경로
    pub output: Option<std::path::PathBuf>,
}

/// 조합별 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub short_window: usize,
    pub long_window: usize,
    pub final_value: f64,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trades: usize,
}

impl SweepResult {
    fn from_report(short_window: usize, long_window: usize, report: &SimulationReport) -> Self {
        Self {
            short_window,
            long_window,
            final_value: report.final_portfolio_value,
            return_pct: report.return_pct,
            max_drawdown_pct: report.max_drawdown_pct(),
            trades: report.trades.len(),
        }
    }
}

/// 단기 < 장기인 조합만 생성
pub fn build_grid(short_windows: &[usize], long_windows: &[usize]) -> Vec<(usize, usize)> {
    let mut grid = Vec::new();
    for &short in short_windows {
        for &long in long_windows {
            if short > 0 && short < long {
                grid.push((short, long));
            }
        }
    }
    grid.sort_unstable();
    grid.dedup();
    grid
}

/// 조합별 시뮬레이션 병렬 실행.
///
/// 실패한 조합은 경고 로그만 남기고 제외합니다. 결과는 최종 평가 금액 내림차순입니다.
pub async fn run_grid(
    series: &PriceSeries,
    base: &SimulationConfig,
    grid: &[(usize, usize)],
) -> Result<Vec<SweepResult>> {
    let mut tasks = JoinSet::new();

    for &(short, long) in grid {
        let series = series.clone();
        let config = base
            .clone()
            .with_indicators(base.indicators.clone().with_sma_windows(short, long));

        tasks.spawn_blocking(move || {
            let outcome = SignalSimulator::new(config).run(&series);
            (short, long, outcome)
        });
    }

    let mut results = Vec::with_capacity(grid.len());
    while let Some(joined) = tasks.join_next().await {
        let (short, long, outcome) = joined?;
        match outcome {
            Ok(report) => results.push(SweepResult::from_report(short, long, &report)),
            Err(e) => warn!(
                short_window = short,
                long_window = long,
                error = %e,
                "조합 시뮬레이션 실패"
            ),
        }
    }

    results.sort_by(|a, b| {
        b.final_value
            .total_cmp(&a.final_value)
            .then(a.short_window.cmp(&b.short_window))
            .then(a.long_window.cmp(&b.long_window))
    });
    Ok(results)
}

/// sweep 실행
pub async fn run(ctx: &Context, options: SweepOptions) -> Result<()> {
    let grid = build_grid(&options.short_windows, &options.long_windows);
    if grid.is_empty() {
        bail!(
            "유효한 윈도우 조합이 없습니다 (단기 < 장기): {:?} × {:?}",
            options.short_windows,
            options.long_windows
        );
    }

    let mut base = options.simulation.apply(ctx.base_simulation_config()?);
    // 모멘텀 전략은 이동평균을 쓰지 않으므로 교차 전략으로 탐색
    if options.simulation.strategy.is_none() {
        base = base.with_strategy(StrategyKind::Crossover);
    }
    base.indicators.periods_per_year = ctx.periods_per_year();
    base.validate()?;

    let series = ctx.fetch_series().await?;
    let results = run_grid(&series, &base, &grid).await?;

    info!(
        symbol = %ctx.symbol,
        combinations = grid.len(),
        succeeded = results.len(),
        "파라미터 탐색 완료"
    );

    println!(
        "\n🔎 {} 이동평균 조합 탐색 ({} 전략, {}개 조합)",
        series.symbol(),
        base.strategy,
        grid.len()
    );
    println!("═══════════════════════════════════════════════════════════════");
    print!("{}", sweep_table(&results, options.top));

    if let Some(path) = &options.output {
        save_json(&results, path)?;
        println!("💾 결과 저장: {}", path.display());
    }

    Ok(())
}
