use std::{cmp::Reverse, collections::BinaryHeap, sync::Weak};

use tokio::{
    sync::mpsc::UnboundedReceiver,
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::key_value_store::{KeyValueStore, PendingExpiry};

/// Spawns the background task that deletes keys once their deadline passes.
///
/// Deadlines are kept in a min-heap and the task sleeps until the earliest
/// one. A key is only deleted if its current entry is still expired, so a
/// later write without a TTL survives an older deadline. The task exits when
/// the store is dropped.
pub fn spawn_expiry_worker(
    store: Weak<KeyValueStore>,
    mut receiver: UnboundedReceiver<PendingExpiry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut deadlines: BinaryHeap<Reverse<(Instant, String)>> = BinaryHeap::new();

        loop {
            let next_deadline = deadlines.peek().map(|Reverse((deadline, _))| *deadline);

            tokio::select! {
                message = receiver.recv() => match message {
                    Some(PendingExpiry { key, expiration }) => {
                        deadlines.push(Reverse((expiration, key)));
                    }
                    None => break,
                },
                _ = wait_until(next_deadline) => {
                    let Some(store) = store.upgrade() else {
                        break;
                    };

                    let now = Instant::now();

                    while let Some(Reverse((deadline, _))) = deadlines.peek() {
                        if *deadline > now {
                            break;
                        }

                        let Some(Reverse((_, key))) = deadlines.pop() else {
                            break;
                        };

                        if store.remove_if_expired(&key).await {
                            tracing::debug!(key = %key, "expired key removed");
                        }
                    }
                }
            }
        }

        tracing::debug!("expiry worker stopped");
    })
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
