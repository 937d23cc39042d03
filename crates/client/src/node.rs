//! Conexão com um nó físico.
//!
//! Cada conexão é dona de uma task que serializa as requisições: o protocolo
//! não tem id de requisição, então só existe uma requisição em voo por socket
//! e as respostas casam com as requisições por ordem de chegada.

use std::sync::Weak;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use memvault_common::{ClientError, ClientResult, ConnectionError};
use memvault_protocol::{Connection, Response};
use memvault_ring::NodeAddr;

use crate::client::Inner;

/// Requisições enfileiradas por conexão.
const REQUEST_QUEUE: usize = 64;

struct Request {
    line: String,
    reply: oneshot::Sender<ClientResult<Response>>,
}

/// Handle barato para a task da conexão.
#[derive(Clone)]
pub(crate) struct NodeHandle {
    /// Distingue conexões sucessivas para o mesmo endereço.
    pub(crate) id: u64,
    addr: NodeAddr,
    tx: mpsc::Sender<Request>,
}

impl NodeHandle {
    /// Inicia a task da conexão. Quando ela termina, as entradas do nó são
    /// removidas do anel.
    pub(crate) fn spawn(
        id: u64,
        addr: NodeAddr,
        conn: Connection,
        request_timeout: Option<Duration>,
        owner: Weak<Inner>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let task = NodeTask {
            id,
            addr: addr.clone(),
            conn,
            rx,
            request_timeout,
        };
        tokio::spawn(task.run(owner));
        Self { id, addr, tx }
    }

    /// Falso quando a task da conexão já terminou ou está terminando.
    pub(crate) fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Confirma com um PING que a conexão ainda responde.
    pub(crate) async fn ping(&self) -> bool {
        self.is_alive() && matches!(self.request("PING".to_string()).await, Ok(Response::Pong))
    }

    /// Envia uma linha e espera a resposta correspondente.
    pub(crate) async fn request(&self, line: String) -> ClientResult<Response> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { line, reply })
            .await
            .map_err(|_| ClientError::Closed(self.addr.to_string()))?;
        rx.await
            .map_err(|_| ClientError::Closed(self.addr.to_string()))?
    }
}

struct NodeTask {
    id: u64,
    addr: NodeAddr,
    conn: Connection,
    rx: mpsc::Receiver<Request>,
    request_timeout: Option<Duration>,
}

impl NodeTask {
    async fn run(mut self, owner: Weak<Inner>) {
        loop {
            tokio::select! {
                request = self.rx.recv() => {
                    let Some(request) = request else {
                        // Cliente descartado.
                        return;
                    };
                    let result = self.exchange(&request.line).await;
                    let failed = result.is_err();
                    if let Err(e) = &result {
                        error!("requisição para {} falhou: {e}", self.addr);
                    }
                    let _ = request.reply.send(result);
                    if failed {
                        break;
                    }
                }
                line = self.conn.read_line() => match line {
                    Ok(None) => {
                        warn!("desconectado de {}", self.addr);
                        break;
                    }
                    Ok(Some(line)) => {
                        warn!("linha não solicitada de {}: {line:?}", self.addr);
                    }
                    Err(e) => {
                        error!("erro na conexão com {}: {e}", self.addr);
                        break;
                    }
                },
            }
        }

        // Requisições já enfileiradas recebem Closed ao descartar o receiver.
        self.rx.close();
        drop(self.conn);
        if let Some(inner) = owner.upgrade() {
            inner.forget(&self.addr, self.id).await;
        }
    }

    async fn exchange(&mut self, line: &str) -> ClientResult<Response> {
        debug!("→ {} {line}", self.addr);
        let result = match self.request_timeout {
            Some(limit) => timeout(limit, round_trip(&mut self.conn, line))
                .await
                .map_err(|_| ClientError::Timeout(self.addr.to_string()))?,
            None => round_trip(&mut self.conn, line).await,
        };

        result.map_err(|source| ClientError::Connection {
            addr: self.addr.to_string(),
            source,
        })
    }
}

async fn round_trip(conn: &mut Connection, line: &str) -> Result<Response, ConnectionError> {
    conn.write_line(line).await?;
    match conn.read_line().await? {
        Some(reply) => Ok(Response::parse(&reply)?),
        None => Err(ConnectionError::ConnectionReset),
    }
}

async fn ping(conn: &mut Connection) -> Result<Option<String>, ConnectionError> {
    conn.write_line("PING").await?;
    conn.read_line().await
}

/// Handshake PING/PONG antes de considerar o nó vivo.
pub(crate) async fn handshake(
    conn: &mut Connection,
    addr: &NodeAddr,
    limit: Option<Duration>,
) -> ClientResult<()> {
    let reply = match limit {
        Some(limit) => timeout(limit, ping(conn))
            .await
            .map_err(|_| ClientError::Timeout(addr.to_string()))?,
        None => ping(conn).await,
    }
    .map_err(|source| ClientError::Connection {
        addr: addr.to_string(),
        source,
    })?;

    match reply {
        Some(line) if line.trim() == "PONG" => {
            info!("handshake com {addr} concluído");
            Ok(())
        }
        Some(line) => Err(ClientError::Handshake {
            addr: addr.to_string(),
            response: line,
        }),
        None => Err(ClientError::Closed(addr.to_string())),
    }
}
