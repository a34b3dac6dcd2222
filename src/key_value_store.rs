use std::{collections::HashMap, sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{
    sync::{mpsc, RwLock},
    time::Instant,
};

use crate::{expiry::spawn_expiry_worker, rdb::RdbEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: String,
    pub expiration: Option<Instant>,
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

/// Deadline for a key written with a TTL, consumed by the expiry worker.
#[derive(Debug)]
pub struct PendingExpiry {
    pub key: String,
    pub expiration: Instant,
}

/// Live key-value mapping layered over the immutable snapshot loaded at
/// startup.
///
/// A live entry always shadows the snapshot entry with the same key. The
/// snapshot mapping is never written after construction, so it is read
/// without taking the lock.
#[derive(Debug)]
pub struct KeyValueStore {
    live: RwLock<HashMap<String, Value>>,
    snapshot: HashMap<String, Value>,
    expiry_sender: mpsc::UnboundedSender<PendingExpiry>,
}

impl KeyValueStore {
    /// Creates an empty store and starts its expiry worker.
    ///
    /// Must be called from within a tokio runtime. The worker stops once the
    /// store is dropped.
    pub fn new() -> Arc<Self> {
        Self::with_snapshot(HashMap::new())
    }

    /// Creates a store whose fallback mapping holds the given snapshot
    /// entries. Wall-clock expiries are converted to monotonic deadlines;
    /// entries that already expired are skipped.
    pub fn with_snapshot(entries: HashMap<String, RdbEntry>) -> Arc<Self> {
        let now = Instant::now();
        let wall_clock_now = Timestamp::now();

        let snapshot = entries
            .into_iter()
            .filter_map(|(key, entry)| {
                let expiration = match entry.expires_at {
                    Some(expires_at) => {
                        let remaining =
                            Duration::try_from(expires_at.duration_since(wall_clock_now)).ok()?;
                        Some(now + remaining)
                    }
                    None => None,
                };

                Some((
                    key,
                    Value {
                        data: entry.value,
                        expiration,
                    },
                ))
            })
            .collect();

        let (expiry_sender, expiry_receiver) = mpsc::unbounded_channel();

        let store = Arc::new(Self {
            live: RwLock::new(HashMap::new()),
            snapshot,
            expiry_sender,
        });

        spawn_expiry_worker(Arc::downgrade(&store), expiry_receiver);

        store
    }

    /// Inserts or overwrites the live entry for `key`. With a `ttl` the entry
    /// gets a deadline and the expiry worker is notified.
    ///
    /// Returns `false`, leaving the store untouched, when `now + ttl` does not
    /// fit in an instant.
    pub async fn set(&self, key: String, value: String, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let expiration = match ttl {
            Some(ttl) => match now.checked_add(ttl) {
                Some(expiration) => Some(expiration),
                None => {
                    tracing::warn!(key = %key, "dropping write with an unrepresentable expiration");
                    return false;
                }
            },
            None => None,
        };

        {
            let mut live = self.live.write().await;
            live.insert(
                key.clone(),
                Value {
                    data: value,
                    expiration,
                },
            );
        }

        if let Some(expiration) = expiration {
            if self
                .expiry_sender
                .send(PendingExpiry { key, expiration })
                .is_err()
            {
                tracing::warn!("expiry worker is gone, key will only expire lazily");
            }
        }

        true
    }

    /// Returns the value for `key`, reading the live mapping first and the
    /// snapshot second. Expired entries are treated as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();

        {
            let live = self.live.read().await;

            if let Some(value) = live.get(key) {
                if !value.is_expired(now) {
                    return Some(value.data.clone());
                }
            }
        }

        self.snapshot
            .get(key)
            .filter(|value| !value.is_expired(now))
            .map(|value| value.data.clone())
    }

    /// Every unexpired key from both mappings, without duplicates.
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let live = self.live.read().await;

        let mut keys: Vec<String> = live
            .iter()
            .filter(|(_, value)| !value.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        keys.extend(
            self.snapshot
                .iter()
                .filter(|(key, value)| !value.is_expired(now) && !live.contains_key(*key))
                .map(|(key, _)| key.clone()),
        );

        keys
    }

    /// Removes the live entry for `key` if its current deadline has passed.
    /// An entry rewritten after the deadline was scheduled is left alone.
    pub(crate) async fn remove_if_expired(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut live = self.live.write().await;

        match live.get(key) {
            Some(value) if value.is_expired(now) => {
                live.remove(key);
                true
            }
            _ => false,
        }
    }
}
