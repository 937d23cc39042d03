use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use memvault_common::{ClientError, ClientResult};
use memvault_protocol::{Command, Connection, Response, escape, is_valid_key, unescape};
use memvault_ring::{HashRing, NodeAddr, Placement};

use crate::config::{ClientConfig, ConnectOptions};
use crate::node::{self, NodeHandle};

/// Cliente que distribui chaves entre nós de cache via hashing consistente.
///
/// Leituras vão ao nó dono da chave. Escritas vão ao líder e, sem esperar,
/// às réplicas; o resultado reflete apenas o ack do líder.
#[derive(Clone)]
pub struct DistributedClient {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    ring: RwLock<HashRing>,
    nodes: DashMap<NodeAddr, NodeHandle>,
    config: ClientConfig,
    next_id: AtomicU64,
}

impl Inner {
    /// Remove o nó se `id` ainda for a conexão registrada para ele.
    pub(crate) async fn forget(&self, addr: &NodeAddr, id: u64) {
        let mut ring = self.ring.write().await;
        if self.nodes.remove_if(addr, |_, handle| handle.id == id).is_none() {
            return;
        }
        let removed = ring.remove_node(addr);
        info!("{removed} nós virtuais de {addr} removidos do anel");
    }

    fn handle(&self, addr: &NodeAddr) -> ClientResult<NodeHandle> {
        self.nodes
            .get(addr)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ClientError::Closed(addr.to_string()))
    }
}

impl Default for DistributedClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl DistributedClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                ring: RwLock::new(HashRing::new()),
                nodes: DashMap::new(),
                config,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Conecta a um nó com as opções padrão do cliente.
    pub async fn connect(&self, host: &str, port: u16) -> ClientResult<()> {
        self.connect_with(host, port, self.inner.config.connect_options())
            .await
    }

    /// Abre a conexão (com retry), faz o handshake e registra os nós
    /// virtuais no anel. Conectar a um nó já conectado não faz nada; uma
    /// conexão anterior que não responde ao PING é descartada e refeita.
    pub async fn connect_with(
        &self,
        host: &str,
        port: u16,
        options: ConnectOptions,
    ) -> ClientResult<()> {
        let addr = NodeAddr::new(host, port);
        if let Ok(existing) = self.inner.handle(&addr) {
            if existing.ping().await {
                info!("já conectado a {addr}");
                return Ok(());
            }
            warn!("conexão anterior com {addr} não responde, reconectando");
            self.inner.forget(&addr, existing.id).await;
        }

        let mut conn = dial(&addr, &options).await?;
        node::handshake(&mut conn, &addr, self.inner.config.request_timeout).await?;

        let mut ring = self.inner.ring.write().await;
        if self
            .inner
            .nodes
            .get(&addr)
            .is_some_and(|existing| existing.is_alive())
        {
            info!("já conectado a {addr}, descartando conexão duplicada");
            return Ok(());
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = NodeHandle::spawn(
            id,
            addr.clone(),
            conn,
            self.inner.config.request_timeout,
            Arc::downgrade(&self.inner),
        );
        self.inner.nodes.insert(addr.clone(), handle);

        let vnodes = options.virtual_nodes.max(1);
        ring.add_node(&addr, vnodes);
        info!("conectado ao MemVault em {addr} ({vnodes} nós virtuais)");
        Ok(())
    }

    /// Lê uma chave do nó dono. `None` se não existir ou tiver expirado.
    pub async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        validate_key(key)?;
        let leader = self.inner.ring.read().await.route(key)?.node.clone();
        debug!("chave {key:?} roteada para {leader}");

        let line = Command::Get(key.to_string()).to_line();
        match self.inner.handle(&leader)?.request(line).await? {
            Response::OkWithValue(value) => Ok(Some(unescape(&value))),
            Response::Ok => Ok(Some(String::new())),
            Response::NotFound => Ok(None),
            Response::Error(message) => Err(ClientError::Server(message)),
            other => Err(ClientError::UnexpectedResponse(other.to_line())),
        }
    }

    /// Grava uma chave no líder e nas réplicas. `ttl_secs = None` usa o TTL
    /// padrão da configuração.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> ClientResult<()> {
        validate_key(key)?;
        if value.contains(['\r', '\n']) {
            return Err(ClientError::InvalidValue(
                "valor não pode conter quebras de linha".into(),
            ));
        }

        let ttl = ttl_secs.unwrap_or(self.inner.config.default_ttl_secs);
        let line = format!("SET {key} \"{}\" EX {ttl}", escape(value));
        self.write(key, line).await
    }

    /// Remove uma chave do líder e das réplicas.
    pub async fn delete(&self, key: &str) -> ClientResult<()> {
        validate_key(key)?;
        let line = Command::Delete(key.to_string()).to_line();
        self.write(key, line).await
    }

    /// Lê e desserializa um valor gravado com [`set_json`](Self::set_json).
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> ClientResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ClientError::InvalidValue(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> ClientResult<()> {
        let raw =
            serde_json::to_string(value).map_err(|e| ClientError::InvalidValue(e.to_string()))?;
        self.set(key, &raw, ttl_secs).await
    }

    /// Líder e réplicas que receberiam uma escrita para a chave.
    pub async fn placement(&self, key: &str) -> ClientResult<Placement> {
        let ring = self.inner.ring.read().await;
        Ok(ring.placement(key, self.inner.config.replication_factor)?)
    }

    /// Nós físicos presentes no anel.
    pub async fn nodes(&self) -> Vec<NodeAddr> {
        self.inner.ring.read().await.nodes()
    }

    /// Posições ocupadas no anel.
    pub async fn vnode_count(&self) -> usize {
        self.inner.ring.read().await.len()
    }

    async fn write(&self, key: &str, line: String) -> ClientResult<()> {
        let Placement {
            leader, replicas, ..
        } = self.placement(key).await?;
        debug!("chave {key:?} roteada para {leader}, réplicas {replicas:?}");

        for replica in replicas {
            let inner = Arc::clone(&self.inner);
            let line = line.clone();
            tokio::spawn(async move {
                debug!("replicando em {replica}: {line}");
                let result = match inner.handle(&replica) {
                    Ok(handle) => handle.request(line).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(Response::Ok) => {}
                    Ok(other) => warn!("réplica {replica} respondeu {}", other.to_line()),
                    Err(e) => warn!("falha ao replicar em {replica}: {e}"),
                }
            });
        }

        match self.inner.handle(&leader)?.request(line).await? {
            Response::Ok => Ok(()),
            Response::Error(message) => Err(ClientError::Server(message)),
            other => Err(ClientError::UnexpectedResponse(other.to_line())),
        }
    }
}

fn validate_key(key: &str) -> ClientResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(ClientError::InvalidKey(key.to_string()))
    }
}

/// Conecta com até `max_retries` novas tentativas, com atraso fixo.
async fn dial(addr: &NodeAddr, options: &ConnectOptions) -> ClientResult<Connection> {
    let mut attempt = 0;
    loop {
        match TcpStream::connect((addr.host(), addr.port())).await {
            Ok(stream) => return Ok(Connection::new(stream)),
            Err(e) if attempt < options.max_retries => {
                attempt += 1;
                warn!(
                    "falha ao conectar em {addr}: {e}, tentando novamente ({attempt}/{})",
                    options.max_retries
                );
                tokio::time::sleep(options.retry_delay).await;
            }
            Err(source) => {
                return Err(ClientError::Connect {
                    addr: addr.to_string(),
                    attempts: attempt + 1,
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_client_reports_no_nodes() {
        let client = DistributedClient::default();
        let err = client.get("k").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Routing(memvault_common::RoutingError::NoNodesConnected)
        ));
        assert!(client.set("k", "v", None).await.is_err());
        assert!(client.delete("k").await.is_err());
        assert!(client.nodes().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_keys_rejected_before_routing() {
        let client = DistributedClient::default();
        for key in ["", "two words", "\"quoted", "tab\there"] {
            assert!(
                matches!(client.get(key).await, Err(ClientError::InvalidKey(_))),
                "key: {key:?}"
            );
        }
    }

    #[tokio::test]
    async fn multiline_values_rejected() {
        let client = DistributedClient::default();
        assert!(matches!(
            client.set("k", "a\r\nGET x", None).await,
            Err(ClientError::InvalidValue(_))
        ));
    }
}
