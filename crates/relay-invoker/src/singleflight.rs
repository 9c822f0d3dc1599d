//! Single-flight dispatch coalescing: concurrent misses on the same cache
//! key collapse into exactly one outbound dispatch (I6, S2).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

struct InFlight<V> {
    /// Closed by the leader once `result` is populated; followers treat
    /// the resulting `AcquireError` as their wakeup signal.
    done: Semaphore,
    result: Mutex<Option<V>>,
}

/// Coalesces concurrent calls keyed by a `String`: the first caller to
/// register a key becomes its leader and runs `work` once; every other
/// caller waits for the leader's result instead of repeating the dispatch.
pub struct SingleFlight<V: Clone + Send + Sync + 'static> {
    inflight: Mutex<HashMap<String, Arc<InFlight<V>>>>,
}

impl<V: Clone + Send + Sync + 'static> Default for SingleFlight<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync + 'static> SingleFlight<V> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run<F, Fut>(&self, key: &str, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = V>,
    {
        let (entry, is_leader) = {
            let mut map = self.inflight.lock();
            if let Some(entry) = map.get(key) {
                (entry.clone(), false)
            } else {
                let entry = Arc::new(InFlight {
                    done: Semaphore::new(0),
                    result: Mutex::new(None),
                });
                map.insert(key.to_string(), entry.clone());
                (entry, true)
            }
        };

        if is_leader {
            let value = work().await;
            *entry.result.lock() = Some(value.clone());
            entry.done.close();
            self.inflight.lock().remove(key);
            value
        } else {
            let _ = entry.done.acquire().await;
            entry
                .result
                .lock()
                .clone()
                .expect("leader populates result before closing the semaphore")
        }
    }
}
