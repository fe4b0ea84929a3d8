use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tallydb::ProgressTracker;
use tallydb::config::AppConfig;
use tallydb::web::{AppState, build_router};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tallydb")]
#[command(about = "Track progress through numbered pages of questions")]
struct Cli {
    /// Data file, or a directory holding one (overrides TALLY_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the progress summary
    Status,
    /// Record a completion
    Add {
        #[arg(long, allow_negative_numbers = true)]
        page: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        item: Option<i64>,
        /// Timestamp in epoch milliseconds (defaults to now)
        #[arg(long)]
        at: Option<i64>,
    },
    /// Set the target number of items
    SetTotal {
        #[arg(allow_negative_numbers = true)]
        total: i64,
    },
    /// Set the daily goal
    SetGoal {
        #[arg(allow_negative_numbers = true)]
        goal: i64,
    },
    /// Clear target, events and daily progress (keeps the daily goal)
    Reset,
    /// Print active days of the trailing year
    Calendar,
    /// Print the cumulative progress series
    Chart,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    let tracker = ProgressTracker::open(&config.data_path).with_context(|| {
        format!("failed to open data file '{}'", config.data_path.display())
    })?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(tracker, &config)
        }
        Command::Status => print_json(&tracker.summary()?),
        Command::Add { page, item, at } => {
            let event = match at {
                Some(ts) => tracker.add_event(ts, page, item)?,
                None => tracker.record_now(page, item)?,
            };
            print_json(&event)
        }
        Command::SetTotal { total } => {
            tracker.set_total(total)?;
            print_json(&tracker.summary()?)
        }
        Command::SetGoal { goal } => {
            tracker.set_daily_goal(goal)?;
            print_json(&tracker.summary()?)
        }
        Command::Reset => {
            tracker.reset()?;
            print_json(&tracker.summary()?)
        }
        Command::Calendar => print_json(&tracker.calendar_data()?),
        Command::Chart => print_json(&tracker.chart_series()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn serve(tracker: ProgressTracker, config: &AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        info!(path = %tracker.path().display(), "using data file");
        let app = build_router(AppState::new(tracker));

        let addr = config.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind to {addr}"))?;

        info!(address = %addr, "tallydb started");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tallydb=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
