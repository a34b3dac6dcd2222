use tokio::sync::RwLock;

use crate::{
    connection::{thread_safe_write_to_stream, SharedWriter},
    resp::RespValue,
};

#[derive(Debug, Clone)]
pub struct Replica {
    pub address: String,
    pub writer: SharedWriter,
}

/// Registry of the replicas attached to a master.
///
/// The registry lock only guards registration and removal. Fan-out copies
/// the registry and writes to each replica without holding it.
#[derive(Debug, Default)]
pub struct ReplicationManager {
    replicas: RwLock<Vec<Replica>>,
}

impl ReplicationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, address: String, writer: SharedWriter) {
        tracing::info!(replica = %address, "replica registered");

        let mut replicas = self.replicas.write().await;
        replicas.push(Replica { address, writer });
    }

    /// Returns whether a replica with this address was registered.
    pub async fn unregister(&self, address: &str) -> bool {
        let mut replicas = self.replicas.write().await;
        let before = replicas.len();
        replicas.retain(|replica| replica.address != address);

        let removed = replicas.len() != before;

        if removed {
            tracing::info!(replica = %address, "replica unregistered");
        }

        removed
    }

    pub async fn replica_count(&self) -> usize {
        self.replicas.read().await.len()
    }

    /// Writes `command` in request framing to every replica, in registration
    /// order. Replicas whose write fails are unregistered once the pass is
    /// complete.
    pub async fn propagate(&self, command: &RespValue) {
        let replicas = self.replicas.read().await.clone();

        if replicas.is_empty() {
            return;
        }

        let encoded = command.encode();
        let mut failed = Vec::new();

        for replica in &replicas {
            if let Err(e) = thread_safe_write_to_stream(&replica.writer, encoded.as_bytes()).await {
                tracing::warn!(replica = %replica.address, error = %e, "failed to propagate write");
                failed.push(replica.address.clone());
            }
        }

        for address in failed {
            self.unregister(&address).await;
        }
    }
}
