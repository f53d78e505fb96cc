mod check_commands;

use std::path::Path;

use {
    clap::{Parser, Subcommand},
    rota_dispatch::Dispatcher,
    tokio::sync::watch,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "rota", about = "Rota — cron-style job dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (skips discovery).
    #[arg(long, global = true, env = "ROTA_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dispatcher (default when no subcommand is provided).
    Run,
    /// Validate the config and preview upcoming fire times.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "rota starting");

    match cli.command {
        None | Some(Commands::Run) => run_dispatcher(cli.config.as_deref()).await,
        Some(Commands::Check) => check_commands::handle_check(cli.config.as_deref()),
    }
}

async fn run_dispatcher(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => rota_config::load_config(path)?,
        None => rota_config::discover_and_load(),
    };

    let registry = rota_tasks::registry_from_config(&config)?;
    info!(jobs = registry.len(), "registry assembled");

    let dispatcher = Dispatcher::new(registry)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    dispatcher.run(shutdown_rx).await?;
    Ok(())
}
