use std::collections::HashMap;
use std::num::NonZeroUsize;

use tokio::time::Duration;
use tracing::debug;

use crate::entry::CacheEntry;
use crate::list::{RecencyList, Slot};

/// Store LRU de capacidade fixa com TTL avaliado de forma preguiçosa.
///
/// Invariantes: o mapa e a lista têm sempre os mesmos nós, e
/// `len() <= capacity()` ao fim de toda operação.
#[derive(Debug)]
pub struct LruStore {
    capacity: NonZeroUsize,
    map: HashMap<String, Slot>,
    list: RecencyList<CacheEntry>,
}

impl LruStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            map: HashMap::with_capacity(capacity.get()),
            list: RecencyList::with_capacity(capacity.get()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Lê uma chave, promovendo-a a mais recente.
    ///
    /// Uma entrada expirada é removida aqui mesmo e reportada como miss.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let slot = *self.map.get(key)?;
        let expired = self.list.get(slot).is_none_or(CacheEntry::is_expired);
        if expired {
            debug!("key expirada removida: {key}");
            self.evict(key);
            return None;
        }

        self.list.move_to_back(slot);
        self.list.get(slot).map(|entry| entry.value.clone())
    }

    /// Grava uma chave. `ttl = None` nunca expira.
    ///
    /// Chave nova com o store cheio despeja o item menos recente antes de
    /// inserir, mesmo que a nova entrada já nasça expirada.
    pub fn set(&mut self, key: String, value: String, ttl: Option<Duration>) {
        if let Some(&slot) = self.map.get(&key) {
            if let Some(entry) = self.list.get_mut(slot) {
                entry.refresh(value, ttl);
            }
            self.list.move_to_back(slot);
            return;
        }

        if self.map.len() + 1 > self.capacity.get() {
            self.evict_oldest();
        }

        let slot = self
            .list
            .push_back(CacheEntry::new(key.clone(), value, ttl));
        self.map.insert(key, slot);
    }

    /// Remove uma chave. Retorna se ela existia.
    pub fn delete(&mut self, key: &str) -> bool {
        self.evict(key)
    }

    /// Verifica presença sem alterar recência nem despejar.
    pub fn contains(&self, key: &str) -> bool {
        self.map
            .get(key)
            .and_then(|&slot| self.list.get(slot))
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Chaves do menos recente para o mais recente.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|entry| entry.key.as_str())
    }

    fn evict(&mut self, key: &str) -> bool {
        match self.map.remove(key) {
            Some(slot) => {
                self.list.remove(slot);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) {
        let Some(head) = self.list.front() else {
            return;
        };
        if let Some(entry) = self.list.remove(head) {
            debug!("key despejada por LRU: {}", entry.key);
            self.map.remove(&entry.key);
        }
    }
}
