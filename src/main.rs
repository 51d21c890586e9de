use std::sync::Arc;

use clap::{Parser, Subcommand};
use token_explorer::{
    client::HttpExplorerClient,
    config::AppConfig,
    error::{AppError, AppResult},
    explorer::Explorer,
    implementations::{
        chain::{ChainRegistry, EvmChainClient},
        pricing::FunkitClient,
    },
    layers::{
        http::HttpServer,
        service::{ServiceContext, ServiceLayer},
    },
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "token-explorer", version, about = "Token prices and USD conversions across chains")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        /// Overrides `bind_addr` from the configuration.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Interactive terminal explorer backed by a running API.
    Explore {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// Start with the per-chain token list instead of the fixed one.
        #[arg(long)]
        advanced: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("fatal error: {err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(bind).await,
        Command::Explore { server, advanced } => explore(&server, advanced).await,
    }
}

async fn serve(bind: Option<String>) -> AppResult<()> {
    info!("loading configuration");
    let mut config = AppConfig::load()?;
    if let Some(bind) = bind {
        config.bind_addr = bind;
        config.validate()?;
    }

    let pricing = FunkitClient::from_config(&config)?;
    let registry = ChainRegistry::from_config(&config)?;
    let chains = EvmChainClient::new(registry);

    let service_ctx = Arc::new(ServiceContext::new(Arc::new(pricing), Arc::new(chains)));
    let service = ServiceLayer::new(service_ctx);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {addr}: {err}")))?;

    HttpServer::new(service).serve(listener, shutdown_signal()).await
}

async fn explore(server: &str, advanced: bool) -> AppResult<()> {
    let client = HttpExplorerClient::new(server)?;
    info!("starting explorer against {server}");
    let (explorer, events) = Explorer::new(Arc::new(client), advanced);
    explorer.run_stdio(events).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .init();
}
