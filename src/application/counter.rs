use super::background::BackgroundTasks;
use crate::domain::ports::CounterStoreRef;
use crate::error::{EconomyError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterDelta {
    pub old_value: i64,
    pub new_value: i64,
    pub added: i64,
}

/// A single persisted integer with every access serialized by one lock.
///
/// `increment` is the exception to strict consistency: it returns before the
/// write happens, and a failed write is only logged.
#[derive(Clone)]
pub struct AtomicCounter {
    store: CounterStoreRef,
    lock: Arc<Mutex<()>>,
    background: BackgroundTasks,
}

impl AtomicCounter {
    pub fn new(store: CounterStoreRef, background: BackgroundTasks) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
            background,
        }
    }

    pub async fn get(&self) -> Result<i64> {
        let _guard = self.lock.lock().await;
        let value = self.current().await?;
        info!(value, "counter read");
        Ok(value)
    }

    /// Schedules `S += 1` and returns immediately.
    pub fn increment(&self) {
        let counter = self.clone();
        self.background.spawn(async move {
            let _guard = counter.lock.lock().await;
            let result = async {
                let old = counter.current().await?;
                let new = old
                    .checked_add(1)
                    .ok_or_else(|| EconomyError::InvalidState("counter overflow".into()))?;
                counter.store.save(new).await?;
                Ok::<_, EconomyError>((old, new))
            }
            .await;
            match result {
                Ok((old, new)) => info!(old, new, "counter incremented"),
                Err(e) => error!(error = %e, "background increment failed"),
            }
        });
        info!("counter increment scheduled");
    }

    /// Doubles an odd value. Even values are rejected unchanged.
    pub async fn double(&self) -> Result<CounterDelta> {
        let _guard = self.lock.lock().await;
        let old = self.current().await?;
        if old % 2 == 0 {
            warn!(value = old, "refusing to double an even value");
            return Err(EconomyError::InvalidState(format!(
                "cannot double even value {old}"
            )));
        }
        let new = old
            .checked_mul(2)
            .ok_or_else(|| EconomyError::InvalidState("counter overflow".into()))?;
        self.store.save(new).await?;
        info!(old, new, "counter doubled");
        Ok(CounterDelta {
            old_value: old,
            new_value: new,
            added: old,
        })
    }

    pub async fn add_delta(&self, delta: i64) -> Result<CounterDelta> {
        let _guard = self.lock.lock().await;
        let old = self.current().await?;
        let new = old
            .checked_add(delta)
            .ok_or_else(|| EconomyError::InvalidState("counter overflow".into()))?;
        self.store.save(new).await?;
        info!(old, new, delta, "delta added to counter");
        Ok(CounterDelta {
            old_value: old,
            new_value: new,
            added: delta,
        })
    }

    /// Current value, persisting 0 on first use. Caller holds the lock.
    async fn current(&self) -> Result<i64> {
        match self.store.load().await? {
            Some(value) => Ok(value),
            None => {
                self.store.save(0).await?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CounterStore;
    use crate::infrastructure::in_memory::InMemoryCounterStore;
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_double_odd_then_even() {
        let store = InMemoryCounterStore::new();
        store.save(7).await.unwrap();
        let counter = AtomicCounter::new(Arc::new(store), BackgroundTasks::new());

        let delta = counter.double().await.unwrap();
        assert_eq!(delta.new_value, 14);

        let result = counter.double().await;
        assert!(matches!(result, Err(EconomyError::InvalidState(_))));
        assert_eq!(counter.get().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_get_initializes_to_zero() {
        let store = InMemoryCounterStore::new();
        let counter = AtomicCounter::new(Arc::new(store.clone()), BackgroundTasks::new());

        assert_eq!(counter.get().await.unwrap(), 0);
        assert_eq!(store.load().await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_add_delta_reports_both_values() {
        let store = InMemoryCounterStore::new();
        store.save(5).await.unwrap();
        let counter = AtomicCounter::new(Arc::new(store), BackgroundTasks::new());

        let delta = counter.add_delta(-8).await.unwrap();
        assert_eq!(
            delta,
            CounterDelta {
                old_value: 5,
                new_value: -3,
                added: -8
            }
        );
        // Negative odd values can be doubled.
        assert_eq!(counter.double().await.unwrap().new_value, -6);
    }

    #[tokio::test]
    async fn test_add_delta_overflow_leaves_value() {
        let store = InMemoryCounterStore::new();
        store.save(i64::MAX).await.unwrap();
        let counter = AtomicCounter::new(Arc::new(store), BackgroundTasks::new());

        assert!(matches!(
            counter.add_delta(1).await,
            Err(EconomyError::InvalidState(_))
        ));
        assert_eq!(counter.get().await.unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn test_increment_is_eventually_applied() {
        let store = InMemoryCounterStore::new();
        let background = BackgroundTasks::new();
        let counter = AtomicCounter::new(Arc::new(store.clone()), background.clone());

        for _ in 0..10 {
            counter.increment();
        }
        background.drain().await;

        assert_eq!(counter.get().await.unwrap(), 10);
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn load(&self) -> Result<Option<i64>> {
            Ok(Some(1))
        }

        async fn save(&self, _value: i64) -> Result<()> {
            Err(EconomyError::IoError(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_increment_failure_is_not_surfaced() {
        let background = BackgroundTasks::new();
        let counter = AtomicCounter::new(Arc::new(BrokenStore), background.clone());

        counter.increment();
        background.drain().await;

        assert_eq!(counter.get().await.unwrap(), 1);
    }
}
