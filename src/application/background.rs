use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, warn};

/// Registry of detached tasks.
///
/// Spawned work is never cancelled by the caller: dropping the returned
/// handles detaches it. [`BackgroundTasks::drain`] is the only way to wait for
/// it, used at shutdown so fire-and-forget writes land before the runtime
/// stops.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the runtime, carrying the caller's span and log
    /// subscriber into it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task.in_current_span().with_current_subscriber());
        let mut handles = self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Waits for every task spawned so far, including ones spawned while
    /// draining.
    pub async fn drain(&self) {
        loop {
            let pending: Vec<_> = {
                let mut handles = self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                handles.drain(..).collect()
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!(error = %e, "background task did not complete");
                }
            }
        }
    }
}
