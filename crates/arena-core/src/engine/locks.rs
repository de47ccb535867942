use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per origin, created on first use.
///
/// A vote holds the locks of both its origins for the read-compute-write of
/// their ratings. Locks are always taken in ascending origin order, so two
/// rounds sharing an origin in opposite slots cannot deadlock.
#[derive(Default)]
pub struct OriginLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl OriginLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, origin: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(origin.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub async fn lock_pair(&self, a: &str, b: &str) -> PairGuard {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let first = self.handle(lo).lock_owned().await;
        let second = if lo == hi {
            None
        } else {
            Some(self.handle(hi).lock_owned().await)
        };
        PairGuard {
            _first: first,
            _second: second,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_opposite_order_pairs_do_not_deadlock() {
        let locks = Arc::new(OriginLocks::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let (a, b) = if i % 2 == 0 { ("x", "y") } else { ("y", "x") };
                let _g = locks.lock_pair(a, b).await;
                tokio::task::yield_now().await;
            }));
        }
        let all = futures_join(handles);
        tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("deadlock");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_disjoint_pairs_do_not_contend() {
        let locks = OriginLocks::new();
        let _g1 = locks.lock_pair("a", "b").await;
        let g2 = tokio::time::timeout(Duration::from_millis(200), locks.lock_pair("c", "d")).await;
        assert!(g2.is_ok());
    }

    #[tokio::test]
    async fn test_shared_origin_blocks() {
        let locks = OriginLocks::new();
        let _g1 = locks.lock_pair("a", "b").await;
        let g2 = tokio::time::timeout(Duration::from_millis(50), locks.lock_pair("b", "c")).await;
        assert!(g2.is_err());
    }

    async fn futures_join(handles: Vec<tokio::task::JoinHandle<()>>) {
        for h in handles {
            h.await.unwrap();
        }
    }
}
