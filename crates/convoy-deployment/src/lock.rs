//! Named mutual exclusion
//!
//! The coordinator serializes rollout-mutating operations through a single
//! named lock (the `"deployment"` key). The trait admits distributed
//! implementations; the in-memory one hands out real owned-guard exclusion
//! within the process.

use crate::error::{DeploymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Scoped mutual exclusion keyed by a string.
///
/// `lock` may block until the key is free; after a successful `lock` the
/// caller must `unlock` on every exit path.
#[async_trait]
pub trait Locker: Send + Sync {
    async fn lock(&self, key: &str) -> Result<()>;
    async fn unlock(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
struct LockerInner {
    mutexes: HashMap<String, Arc<Mutex<()>>>,
    held: HashMap<String, OwnedMutexGuard<()>>,
}

/// In-process implementation of [`Locker`] backed by named async mutexes.
pub struct InMemoryLocker {
    inner: Mutex<LockerInner>,
}

impl InMemoryLocker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LockerInner::default()),
        }
    }
}

impl Default for InMemoryLocker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Locker for InMemoryLocker {
    async fn lock(&self, key: &str) -> Result<()> {
        let mutex = {
            let mut inner = self.inner.lock().await;
            inner
                .mutexes
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        // Await outside the registry lock so other keys stay usable while
        // this one is contended.
        let guard = mutex.lock_owned().await;

        let mut inner = self.inner.lock().await;
        inner.held.insert(key.to_string(), guard);
        Ok(())
    }

    async fn unlock(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.held.remove(key) {
            Some(_guard) => Ok(()),
            None => Err(DeploymentError::Lock(format!("key {:?} is not locked", key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn lock_excludes_until_unlocked() {
        let locker = Arc::new(InMemoryLocker::new());
        locker.lock("deployment").await.unwrap();

        let contender = {
            let locker = locker.clone();
            tokio::spawn(async move {
                locker.lock("deployment").await.unwrap();
                locker.unlock("deployment").await.unwrap();
            })
        };

        // The contender cannot finish while we hold the key.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        locker.unlock("deployment").await.unwrap();
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let locker = InMemoryLocker::new();
        locker.lock("deployment").await.unwrap();
        locker.lock("other").await.unwrap();
        locker.unlock("other").await.unwrap();
        locker.unlock("deployment").await.unwrap();
    }

    #[tokio::test]
    async fn unlock_without_lock_fails() {
        let locker = InMemoryLocker::new();
        assert!(matches!(
            locker.unlock("deployment").await,
            Err(DeploymentError::Lock(_))
        ));
    }
}
