#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const MAX_CONNECTIONS: usize = 1024;
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024; // 8 MB

/// Capacidade padrão do LRU de cada nó.
pub const DEFAULT_CAPACITY: usize = 128;

/// TTL aplicado quando o SET não traz `EX`.
pub const DEFAULT_TTL_SECS: u64 = 120;
/// Menor TTL aceito pelo protocolo.
pub const MIN_TTL_SECS: u64 = 1;

pub const DEFAULT_REPLICATION_FACTOR: usize = 3;
pub const DEFAULT_VIRTUAL_NODES: usize = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
