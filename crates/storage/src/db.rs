use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use tokio::time::Duration;

use memvault_common::StorageError;

use crate::lru::LruStore;

/// Handle para o store do nó, compartilhado entre todas as conexões.
///
/// Nenhuma operação atravessa um ponto de suspensão, então um `Mutex`
/// síncrono basta.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Mutex<LruStore>>,
}

impl Db {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Db {
            shared: Arc::new(Mutex::new(LruStore::new(capacity))),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_store(|store| store.get(key))
    }

    pub fn set(
        &self,
        key: String,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        self.with_store(|store| store.set(key, value, ttl))
    }

    pub fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.with_store(|store| store.delete(key))
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.with_store(|store| store.contains(key))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        self.with_store(|store| store.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.with_store(|store| store.is_empty())
    }

    pub fn capacity(&self) -> Result<usize, StorageError> {
        self.with_store(|store| store.capacity())
    }

    /// Executa `f` com o store travado. Um pânico dentro de `f` envenena o
    /// lock e as chamadas seguintes retornam `LockPoisoned`.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut LruStore) -> R) -> Result<R, StorageError> {
        let mut store = self.shared.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(f(&mut store))
    }
}
