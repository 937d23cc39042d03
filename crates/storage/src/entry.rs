use tokio::time::{Duration, Instant};

/// Um TTL grande demais para o relógio equivale a nunca expirar.
fn deadline(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

/// Entrada no store: chave, valor já serializado e TTL opcional.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    pub fn new(key: String, value: String, ttl: Option<Duration>) -> Self {
        Self {
            key,
            value,
            expires_at: deadline(ttl),
        }
    }

    /// Substitui valor e prazo, contando o TTL a partir de agora.
    pub fn refresh(&mut self, value: String, ttl: Option<Duration>) {
        self.value = value;
        self.expires_at = deadline(ttl);
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|t| Instant::now() >= t)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_already_expired() {
        assert!(CacheEntry::new("k".into(), "v".into(), Some(Duration::ZERO)).is_expired());
    }

    #[test]
    fn no_ttl_never_expires() {
        let entry = CacheEntry::new("k".into(), "v".into(), None);
        assert_eq!(entry.expires_at, None);
        assert!(!entry.is_expired());
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new("k".into(), "v".into(), Some(Duration::from_secs(u64::MAX)));
        assert!(!entry.is_expired());
    }
}
