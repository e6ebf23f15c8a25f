use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atris_resolver::catalog::load_catalog;
use atris_resolver::config;
use atris_resolver::nodes::directory_for;
use atris_resolver::resolver::Resolver;
use atris_resolver::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML configuration file. Its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// JSON file replacing the built-in endpoint catalog.
    #[clap(long, value_parser = parse_path)]
    pub catalog: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3002)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9092)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// URL of the discovery node directory.
    #[clap(long)]
    pub directory_url: Option<String>,

    /// Host used when the directory is unreachable. Can be repeated.
    #[clap(long = "fallback-node")]
    pub fallback_nodes: Vec<String>,

    /// Pin the node pool to these hosts and skip the directory. Can be repeated.
    #[clap(long = "node")]
    pub nodes: Vec<String>,

    /// Timeout in seconds for each node request.
    #[clap(long)]
    pub request_timeout_sec: Option<u64>,

    /// Application name sent with every node request.
    #[clap(long)]
    pub app_name: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            catalog_path: args.catalog.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            directory_url: args.directory_url.clone(),
            fallback_nodes: args.fallback_nodes.clone(),
            request_timeout_sec: args.request_timeout_sec,
            app_name: args.app_name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  catalog: {:?}", app_config.catalog_path);
    info!("  port: {}", app_config.port);
    info!("  directory: {}", app_config.directory.url);
    info!(
        "  executor: {} nodes x {} attempts, {}ms backoff unit",
        app_config.executor.max_node_attempts,
        app_config.executor.max_retries,
        app_config.executor.retry_delay_ms
    );

    info!("Initializing metrics...");
    metrics::init_metrics();

    let catalog = load_catalog(app_config.catalog_path.as_ref())?;
    let directory = directory_for(&app_config.directory, cli_args.nodes.clone())?;
    let resolver = Resolver::from_config(&app_config, catalog, directory)?;

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
    };

    tokio::select! {
        result = run_server(server_config, Arc::new(resolver)) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
