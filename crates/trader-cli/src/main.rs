//! 가격 시계열 분석 및 신호 시뮬레이션 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # BTCUSDT 1분봉 지표 분석 (이동평균, 볼린저 밴드, 변동성)
//! trader analyze -s BTCUSDT
//!
//! # 모멘텀 전략 시뮬레이션 + 차트
//! trader simulate -s BTCUSDT --capital 1000 --chart out/sim.png
//!
//! # 이동평균 조합 탐색
//! trader sweep --short-windows 5,10,20 --long-windows 50,100
//!
//! # Binance 24시간 시세 API 확인
//! trader ticker -s BTCUSDT
//! ```
//!
//! 환경변수(`DASHBOARD_*`, `.env`)로 기본값을 지정하고 CLI 플래그로 덮어씁니다.
//! 로그 레벨은 `RUST_LOG`, JSON 로그는 `--log-json` 또는 `LOG_FORMAT=json`입니다.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod render;

use commands::{
    analyze::AnalyzeOptions, simulate::SimulateOptions, sweep::SweepOptions, Context, DataArgs,
    IndicatorArgs, SimulationArgs,
};
use config::DashboardConfig;
use trader_core::CoreError;

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "가격 시계열 분석 및 신호 시뮬레이션 대시보드", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    /// 시뮬레이션/지표 설정 파일 (TOML 또는 JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON 형식 로그 출력
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 이동평균, 볼린저 밴드, 변동성 계산
    Analyze {
        #[command(flatten)]
        indicators: IndicatorArgs,

        /// 출력할 최근 행 수 (기본: DASHBOARD_TABLE_ROWS)
        #[arg(long)]
        rows: Option<usize>,

        /// JSON 결과 저장 경로
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PNG 차트 저장 경로
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// 단일 포지션 신호 시뮬레이션
    Simulate {
        #[command(flatten)]
        indicators: IndicatorArgs,

        #[command(flatten)]
        simulation: SimulationArgs,

        /// 출력할 최근 거래 수 (기본: 전체)
        #[arg(long)]
        trades: Option<usize>,

        /// JSON 보고서 저장 경로
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PNG 차트 저장 경로
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// 단기/장기 이동평균 윈도우 조합 병렬 탐색
    Sweep {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// 단기 윈도우 목록 (쉼표 구분)
        #[arg(long, value_delimiter = ',', default_values_t = vec![5, 10, 20])]
        short_windows: Vec<usize>,

        /// 장기 윈도우 목록 (쉼표 구분)
        #[arg(long, value_delimiter = ',', default_values_t = vec![50, 100, 200])]
        long_windows: Vec<usize>,

        /// 출력할 상위 조합 수
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// JSON 결과 저장 경로
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 24시간 시세 API 확인 (binance, coinbase)
    Ticker,
}

/// 트레이싱 초기화 (RUST_LOG 기본값: info)
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // 표 출력과 섞이지 않도록 로그는 stderr로
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// 에러 체인의 `CoreError` 종류에 따른 안내 문구
fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let core = err.chain().find_map(|e| e.downcast_ref::<CoreError>())?;
    if core.is_data_error() {
        Some("데이터 소스와 심볼, 조회 개수(--limit)를 확인하세요")
    } else {
        Some("지표/시뮬레이션 파라미터 값을 확인하세요")
    }
}

async fn run(cli: Cli, dashboard: DashboardConfig) -> anyhow::Result<()> {
    let ctx = Context::resolve(dashboard, &cli.data, cli.config);

    match cli.command {
        Commands::Analyze {
            indicators,
            rows,
            output,
            chart,
        } => {
            commands::analyze::run(
                &ctx,
                AnalyzeOptions {
                    indicators,
                    rows,
                    output,
                    chart,
                },
            )
            .await
        }

        Commands::Simulate {
            indicators,
            simulation,
            trades,
            output,
            chart,
        } => {
            commands::simulate::run(
                &ctx,
                SimulateOptions {
                    indicators,
                    simulation,
                    trades,
                    output,
                    chart,
                },
            )
            .await
        }

        Commands::Sweep {
            simulation,
            short_windows,
            long_windows,
            top,
            output,
        } => {
            commands::sweep::run(
                &ctx,
                SweepOptions {
                    simulation,
                    short_windows,
                    long_windows,
                    top,
                    output,
                },
            )
            .await
        }

        Commands::Ticker => commands::ticker::run(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env 파일 로드 (없어도 에러 안남)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let dashboard = DashboardConfig::from_env();
    init_tracing(cli.log_json || dashboard.log_json);

    match run(cli, dashboard).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "명령 실행 실패");
            eprintln!("\n오류: {:#}", e);
            if let Some(hint) = error_hint(&e) {
                eprintln!("💡 {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}
