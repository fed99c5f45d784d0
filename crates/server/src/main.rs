//! TCP server for the tenant database gateway.

use anyhow::{Context, Result};
use clap::Parser;
use common::{Config, Credential};
use gateway::Gateway;
use gateway::audit::FileAuditSink;
use server::run_server;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_AUDIT_LOG: &str = "audit.log";
const DEFAULT_SEED_USER: &str = "john";
const DEFAULT_SEED_PASSWORD: &str = "secret123";

#[derive(Parser, Debug)]
#[command(
    name = "gatewaydb-server",
    about = "Multi-tenant SQLite gateway addressed by connection strings"
)]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Root directory holding auth.db and one directory per user
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Scheme expected at the start of every connection string
    #[arg(long, default_value = common::DEFAULT_SCHEME)]
    scheme: String,

    /// Audit log file; relative paths live under the data directory
    #[arg(long, default_value = DEFAULT_AUDIT_LOG)]
    audit_log: PathBuf,

    /// Milliseconds SQLite waits on a locked database file
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,

    /// User registered when the credential store is empty
    #[arg(long, default_value = DEFAULT_SEED_USER)]
    seed_user: String,

    /// Password for the seeded user
    #[arg(long, default_value = DEFAULT_SEED_PASSWORD)]
    seed_password: String,

    /// Skip seeding a default user
    #[arg(long)]
    no_seed: bool,

    /// Tracing filter, e.g. `info` or `server=debug,audit=info`
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_filter)?;

    let seed_user = (!args.no_seed).then(|| Credential::new(&args.seed_user, &args.seed_password));
    let config = Config::builder()
        .data_dir(args.data_dir.clone())
        .scheme(args.scheme.clone())
        .busy_timeout_ms(args.busy_timeout_ms)
        .maybe_seed_user(seed_user)
        .build();

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
    let audit_path = config.data_dir.join(&args.audit_log);
    let audit = FileAuditSink::open(&audit_path)
        .with_context(|| format!("opening audit log {}", audit_path.display()))?;
    let gateway = Arc::new(Gateway::bootstrap(&config, Arc::new(audit))?);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, data_dir = %config.data_dir.display(), scheme = %config.scheme, "server listening");
    info!(audit_log = %audit_path.display(), "audit events enabled");

    let server_task = tokio::spawn(run_server(listener, gateway));

    signal::ctrl_c().await?;
    info!("shutdown signal received, stopping server");
    server_task.abort();

    Ok(())
}

fn init_tracing(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
