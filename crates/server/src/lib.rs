#![forbid(unsafe_code)]

pub mod handler;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tracing::{error, info};

use memvault_protocol::Connection;
use memvault_storage::Db;

pub use handler::{execute_command, handle_connection};

/// Accept loop de um nó de cache.
///
/// Limita conexões simultâneas a `max_connections`. Quando `shutdown`
/// completa, para de aceitar e avisa todos os handlers, que fecham seus
/// sockets.
pub async fn run(
    listener: TcpListener,
    db: Db,
    max_connections: usize,
    shutdown: impl Future,
) -> std::io::Result<()> {
    let semaphore = Arc::new(Semaphore::new(max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = &mut shutdown => {
                info!("shutdown signal recebido");
                break;
            }
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal recebido");
                break;
            }
        };

        info!("nova conexão: {addr}");
        let db = db.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, db, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    // Handlers recebem RecvError::Closed e encerram.
    drop(shutdown_tx);
    Ok(())
}
