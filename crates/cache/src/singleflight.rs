//! Request coalescing keyed by an arbitrary value.
//!
//! The first caller for a key runs the work; callers arriving while it is
//! in flight wait for and clone its result. The key is released when the
//! leader finishes, whether the work succeeded or failed. If the leader is
//! dropped mid-flight, each waiter runs the work itself.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

pub struct SingleFlight<K, V> {
    calls: Mutex<HashMap<K, watch::Receiver<Option<V>>>>,
}

enum Role<V> {
    Leader(watch::Sender<Option<V>>),
    Waiter(watch::Receiver<Option<V>>),
}

/// Removes the leader's key on completion or cancellation.
struct InFlight<'a, K: Eq + Hash, V> {
    calls: &'a Mutex<HashMap<K, watch::Receiver<Option<V>>>>,
    key: K,
}

impl<K: Eq + Hash, V> Drop for InFlight<'_, K, V> {
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `work` for `key`, or share the result of the run already in
    /// flight for it.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let role = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            match calls.get(&key) {
                Some(rx) => Role::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                let _in_flight = InFlight {
                    calls: &self.calls,
                    key,
                };
                let value = work().await;
                // The map still holds a receiver, so this cannot fail.
                let _ = tx.send(Some(value.clone()));
                value
            }
            Role::Waiter(mut rx) => {
                loop {
                    let shared = rx.borrow_and_update().clone();
                    if let Some(value) = shared {
                        return value;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
                tracing::debug!("In-flight leader went away, running work directly");
                work().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_share_one_run() {
        let flights = Arc::new(SingleFlight::<&'static str, usize>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let flights = Arc::clone(&flights);
                let runs = Arc::clone(&runs);
                tokio::spawn(async move {
                    flights
                        .run("G4/2020-04", || async {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            runs.fetch_add(1, Ordering::SeqCst) + 100
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 100);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn key_is_released_after_completion() {
        let flights = SingleFlight::<u32, u32>::new();
        assert_eq!(flights.run(1, || async { 1 }).await, 1);
        assert_eq!(flights.run(1, || async { 2 }).await, 2);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn waiter_runs_work_when_leader_is_cancelled() {
        let flights = Arc::new(SingleFlight::<u32, u32>::new());

        let leader = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move {
                flights
                    .run(7, || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        0
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(flights.in_flight(), 1);

        let waiter = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move { flights.run(7, || async { 42 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        assert_eq!(waiter.await.unwrap(), 42);
    }
}
