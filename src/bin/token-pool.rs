use anyhow::Result;
use clap::Parser;
use token_pool::observability::service_resources_metrics::collect_process_metrics;
use token_pool::pool::manager::PoolManager;
use token_pool::server;
use token_pool::utils::config_loader;
use token_pool::utils::logging::{self, LogLevel};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-pool.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Issuer client + pool manager
    // -------------------------------

    let pool = PoolManager::from_config(&service_config)?;
    info!("token store: {}", pool.store().path().display());

    // -------------------------------
    // 3. Http server and process metrics
    // -------------------------------

    let http_server = server::server::start(&service_config, pool);

    info!("Service starting...");
    if service_config.settings.metrics.is_enabled {
        tokio::select! {
            res = http_server => res?,
            res = collect_process_metrics(true) => res?,
        }
    } else {
        http_server.await?;
    }

    Ok(())
}
