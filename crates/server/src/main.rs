use std::num::NonZeroUsize;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use memvault_common::{DEFAULT_CAPACITY, DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS};
use memvault_storage::Db;

#[derive(Parser, Debug)]
#[command(name = "memvault-server", about = "MemVault — nó de cache LRU em memória")]
struct Args {
    #[arg(long, env = "MEMVAULT_HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "MEMVAULT_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Número máximo de chaves no LRU.
    #[arg(long, env = "MEMVAULT_CAPACITY", default_value_t = default_capacity())]
    capacity: NonZeroUsize,
    #[arg(long, env = "MEMVAULT_MAX_CONNECTIONS", default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
}

fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memvault_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let db = Db::new(args.capacity);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "MemVault escutando em {addr} (capacidade {}, até {} conexões)",
        args.capacity, args.max_connections
    );

    memvault_server::run(listener, db, args.max_connections, signal::ctrl_c()).await?;

    Ok(())
}
