use crate::domain::account::{
    Account, AccountUpdate, MINUTES_PER_ENERGY, accrued_profit, checked, elapsed_minutes,
    restored_energy,
};
use crate::domain::ports::AccountStoreRef;
use crate::error::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// Time-based accrual of currency and energy.
///
/// Both computations work from the account snapshot they are given and
/// persist through independent column writes, so they can run concurrently
/// against the same snapshot.
#[derive(Clone)]
pub struct AccrualEngine {
    accounts: AccountStoreRef,
}

impl AccrualEngine {
    pub fn new(accounts: AccountStoreRef) -> Self {
        Self { accounts }
    }

    /// Credits passive income for the whole minutes since the last accrual and
    /// returns the new balance. A call within the same minute is a no-op.
    pub async fn compute_profit(&self, account: &Account, now: DateTime<Utc>) -> Result<i64> {
        let minutes = elapsed_minutes(account.last_accrual_at, now);
        if minutes == 0 {
            return Ok(account.balance);
        }

        let profit = checked("accrued profit", accrued_profit(account.profit_per_hour, minutes))?;
        let balance = checked("balance", account.balance.checked_add(profit))?;

        self.accounts
            .update(account.id, AccountUpdate::Accrual { balance, at: now })
            .await
            .inspect_err(|e| error!(account = account.id, error = %e, "failed to persist accrual"))?;

        info!(
            account = account.id,
            old_balance = account.balance,
            profit,
            new_balance = balance,
            minutes,
            profit_per_hour = account.profit_per_hour,
            "balance accrued"
        );
        Ok(balance)
    }

    /// Regenerates one energy point per two whole minutes, capped at
    /// `max_energy`, and returns the new energy.
    ///
    /// The restore timestamp moves to `now` even when the cap clipped the
    /// gain: regeneration time past the cap is dropped, not banked.
    pub async fn restore_energy(&self, account: &Account, now: DateTime<Utc>) -> Result<i64> {
        let ticks = elapsed_minutes(account.last_energy_at, now) / MINUTES_PER_ENERGY;
        debug!(
            account = account.id,
            ticks,
            need = account.max_energy - account.energy,
            energy = account.energy,
            "restoring energy"
        );
        if ticks == 0 {
            return Ok(account.energy);
        }

        let energy = restored_energy(account.energy, account.max_energy, ticks);
        self.accounts
            .update(account.id, AccountUpdate::EnergyRestore { energy, at: now })
            .await
            .inspect_err(|e| error!(account = account.id, error = %e, "failed to persist energy"))?;

        Ok(energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::AccountStore;
    use crate::error::EconomyError;
    use crate::infrastructure::in_memory::InMemoryAccountStore;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn setup(configure: impl FnOnce(&mut Account)) -> (AccrualEngine, InMemoryAccountStore, Account) {
        let store = InMemoryAccountStore::new();
        let mut account = Account::new(1, 42, "alice", epoch());
        configure(&mut account);
        store.insert(account.clone()).await;
        (AccrualEngine::new(Arc::new(store.clone())), store, account)
    }

    #[tokio::test]
    async fn test_profit_truncates_rate_before_multiplying() {
        let (engine, store, account) = setup(|a| a.profit_per_hour = 119).await;
        let now = epoch() + Duration::minutes(125);

        let balance = engine.compute_profit(&account, now).await.unwrap();

        assert_eq!(balance, 125);
        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.balance, 125);
        assert_eq!(stored.last_accrual_at, now);
    }

    #[tokio::test]
    async fn test_profit_for_whole_rate() {
        let (engine, _, account) = setup(|a| {
            a.profit_per_hour = 120;
            a.balance = 10;
        })
        .await;
        let now = epoch() + Duration::minutes(65) + Duration::seconds(30);

        assert_eq!(engine.compute_profit(&account, now).await.unwrap(), 140);
    }

    #[tokio::test]
    async fn test_profit_overflow_leaves_account_untouched() {
        let (engine, store, account) = setup(|a| {
            a.profit_per_hour = 600;
            a.balance = i64::MAX - 5;
        })
        .await;

        let result = engine.compute_profit(&account, epoch() + Duration::minutes(1)).await;

        assert!(matches!(result, Err(EconomyError::InvalidState(_))));
        assert_eq!(store.get(1).await.unwrap().unwrap(), account);

        let (engine, _, account) = setup(|a| a.profit_per_hour = i64::MAX).await;
        let result = engine.compute_profit(&account, epoch() + Duration::hours(2)).await;
        assert!(matches!(result, Err(EconomyError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_zero_elapsed_is_noop() {
        let (engine, store, account) = setup(|a| {
            a.profit_per_hour = 6000;
            a.energy = 1;
        })
        .await;
        let now = epoch() + Duration::seconds(59);

        assert_eq!(engine.compute_profit(&account, now).await.unwrap(), 0);
        assert_eq!(engine.restore_energy(&account, now).await.unwrap(), 1);

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[tokio::test]
    async fn test_energy_clamped_and_timestamp_advances() {
        let (engine, store, account) = setup(|a| {
            a.energy = 8;
            a.max_energy = 10;
        })
        .await;
        let now = epoch() + Duration::minutes(10);

        assert_eq!(engine.restore_energy(&account, now).await.unwrap(), 10);

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.energy, 10);
        assert_eq!(stored.last_energy_at, now);
    }

    #[tokio::test]
    async fn test_energy_one_tick_per_two_minutes() {
        let (engine, _, account) = setup(|a| {
            a.energy = 0;
            a.max_energy = 100;
        })
        .await;
        let now = epoch() + Duration::minutes(7);

        assert_eq!(engine.restore_energy(&account, now).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_energy_recovers_from_negative() {
        let (engine, _, account) = setup(|a| {
            a.energy = -4;
            a.max_energy = 10;
        })
        .await;
        let now = epoch() + Duration::minutes(6);

        assert_eq!(engine.restore_energy(&account, now).await.unwrap(), -1);
    }
}
