//! Share Pool Indexer Server
//!
//! Indexes share-token transfers into pool, holder and daily history
//! records, and serves them over a read-only HTTP API.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::Shutdown;
use spool_core::oracle::JsonRpcOracle;
use spool_core::processors::{AccountingEngine, LogSync, TransferIndexer};
use spool_core::rpc::RpcClient;
use spool_core::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Timeout for a single JSON-RPC request.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Share pool indexer - staking share accounting over an EVM share token
#[derive(Parser, Debug)]
#[command(name = "spool-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./spool-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting spool-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigLoader::new(&args.config, args.listen)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!(
        pool = %config.accounting.pool_id,
        start_block = config.chain.start_block,
        policy = ?config.accounting.invariant_policy,
        "Configuration loaded from {:?}",
        args.config
    );

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let store = Arc::new(PgStore::new(db_pool.clone()));

    // One HTTP connection pool for both the oracle and the log source.
    let http = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
    let chain = &config.chain;
    let oracle = Arc::new(JsonRpcOracle::new(
        RpcClient::new(chain.rpc_url.clone()).with_http_client(http.clone()),
        chain.share_token.clone(),
        chain.staked_token.clone(),
        config.accounting.value_scale,
    ));
    let source = LogSync::new(
        RpcClient::new(chain.rpc_url.clone()).with_http_client(http),
        chain.share_token.clone(),
        chain.confirmations,
    );
    let engine = Arc::new(AccountingEngine::new(
        store.clone(),
        oracle,
        config.accounting.clone(),
    ));

    let shutdown = Shutdown::new();
    let indexer = TransferIndexer::new(source, engine, chain);
    let indexer_handle = tokio::spawn(indexer.run(shutdown.subscribe()));

    let router = build_router(AppState::new(store, config.accounting.pool_id.clone()));

    tracing::info!("Starting HTTP server on {}", config.listen);
    let result = run_server(router, config.listen).await;

    // The indexer finishes its current window before it exits.
    shutdown.trigger();
    if let Err(e) = indexer_handle.await {
        tracing::error!("Indexer task failed: {}", e);
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
