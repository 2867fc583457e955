use super::accrual::AccrualEngine;
use super::background::BackgroundTasks;
use crate::domain::account::{Account, Equipment};
use crate::error::{EconomyError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::error;

/// Account state returned to the owner after accrual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub username: String,
    pub balance: i64,
    pub level: i32,
    pub energy: i64,
    pub max_energy: i64,
    pub profit_per_hour: i64,
    pub profit_per_tap: i64,
    #[serde(flatten)]
    pub equipment: Equipment,
}

impl AccountView {
    pub fn new(account: &Account, balance: i64, energy: i64) -> Self {
        Self {
            username: account.display_name.clone(),
            balance,
            level: account.level,
            energy,
            max_energy: account.max_energy,
            profit_per_hour: account.profit_per_hour,
            profit_per_tap: account.profit_per_tap,
            equipment: account.equipment.clone(),
        }
    }
}

/// Runs profit accrual and energy restore concurrently for an account fetch.
///
/// Each computation is a detached task reporting back over a oneshot channel.
/// If the caller stops waiting (its deadline elapsed), the sender side finds
/// the channel closed and drops its result, but the write it already made
/// stays.
#[derive(Clone)]
pub struct ConcurrentAggregator {
    accrual: AccrualEngine,
    background: BackgroundTasks,
}

impl ConcurrentAggregator {
    pub fn new(accrual: AccrualEngine, background: BackgroundTasks) -> Self {
        Self { accrual, background }
    }

    /// Dispatches both computations against `account` and waits for both.
    pub async fn refresh(&self, account: &Account, now: DateTime<Utc>) -> Result<AccountView> {
        let profit = {
            let accrual = self.accrual.clone();
            let snapshot = account.clone();
            self.dispatch(async move { accrual.compute_profit(&snapshot, now).await })
        };
        let energy = {
            let accrual = self.accrual.clone();
            let snapshot = account.clone();
            self.dispatch(async move { accrual.restore_energy(&snapshot, now).await })
        };

        let balance = receive(profit, "profit accrual").await?;
        let energy = receive(energy, "energy restore").await?;
        Ok(AccountView::new(account, balance, energy))
    }

    fn dispatch<F>(&self, computation: F) -> oneshot::Receiver<Result<i64>>
    where
        F: Future<Output = Result<i64>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.background.spawn(async move {
            // The receiver is gone if the request timed out.
            let _ = tx.send(computation.await);
        });
        rx
    }
}

async fn receive(rx: oneshot::Receiver<Result<i64>>, what: &str) -> Result<i64> {
    match rx.await {
        Ok(result) => result.inspect_err(|e| error!(error = %e, "{what} failed")),
        Err(e) => Err(EconomyError::internal(e)),
    }
}
