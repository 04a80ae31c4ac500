mod backend;
mod config;
mod logging;
mod reconcile;
mod scan;
mod scheduler;
mod transfer;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::MirrorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

fn print_usage() {
    println!("Usage: diskmirrord");
    println!("Mirrors a local directory onto a remote folder on a fixed schedule.");
    println!();
    println!("Configuration is read from the environment (or a .env file):");
    println!("  LOCAL_FOLDER_PATH  local directory to mirror (required, must exist)");
    println!("  CLOUD_FOLDER_NAME  remote folder name (required)");
    println!("  ACCESS_TOKEN       OAuth token, or mirror root for local_mock (required)");
    println!("  SYNC_INTERVAL      seconds between cycles (default 300)");
    println!("  LOG_PATH           log file path (default: stderr)");
    println!("  CLOUD_PROVIDER     'yandex' or 'local_mock' (default 'yandex')");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    match parse_cli_mode(std::env::args()) {
        Ok(CliMode::Help) => {
            print_usage();
            return;
        }
        Ok(CliMode::Run) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }

    let config = match MirrorConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            eprintln!("Please check your environment or .env file and try again.");
            std::process::exit(2);
        }
    };
    if let Err(err) = logging::init_tracing(config.log_path.as_deref()) {
        eprintln!("Failed to set up logging: {err}");
        std::process::exit(2);
    }

    if let Err(err) = run(config).await {
        error!("unexpected error: {err:#}");
        eprintln!("A critical error occurred. See the log for details.");
        std::process::exit(1);
    }
}

async fn run(config: MirrorConfig) -> anyhow::Result<()> {
    info!(
        folder = %config.local_folder.display(),
        interval_secs = config.sync_interval.as_secs(),
        "service started"
    );

    let backend = backend::create_backend(&config).await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("service stopped by user");
            signal_token.cancel();
        }
    });

    scheduler::run(
        backend.as_ref(),
        &config.local_folder,
        config.sync_interval,
        shutdown,
    )
    .await;
    Ok(())
}
