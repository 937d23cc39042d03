use tokio::time::Duration;

use memvault_common::{
    DEFAULT_MAX_RETRIES, DEFAULT_REPLICATION_FACTOR, DEFAULT_RETRY_DELAY_MS, DEFAULT_TTL_SECS,
    DEFAULT_VIRTUAL_NODES,
};

/// Configuração do cliente distribuído.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Total de cópias de cada escrita (líder + réplicas).
    pub replication_factor: usize,
    pub virtual_nodes: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub default_ttl_secs: u64,
    /// Sem timeout por padrão: uma requisição espera a resposta indefinidamente.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            virtual_nodes: DEFAULT_VIRTUAL_NODES,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            default_ttl_secs: DEFAULT_TTL_SECS,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_virtual_nodes(mut self, virtual_nodes: usize) -> Self {
        self.virtual_nodes = virtual_nodes;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_default_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Opções de conexão derivadas desta configuração.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            virtual_nodes: self.virtual_nodes,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }
}

/// Parâmetros de um `connect`, sobrepondo os padrões do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub virtual_nodes: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ClientConfig::default().connect_options()
    }
}
