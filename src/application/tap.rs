use crate::domain::account::{Account, AccountUpdate, checked, tap_yield};
use crate::domain::ports::AccountStoreRef;
use crate::error::Result;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TapOutcome {
    pub profit: i64,
}

/// Resolves a single tap into currency and energy.
#[derive(Clone)]
pub struct TapResolver {
    accounts: AccountStoreRef,
}

impl TapResolver {
    pub fn new(accounts: AccountStoreRef) -> Self {
        Self { accounts }
    }

    pub fn compute_tap_yield(&self, account: &Account) -> i64 {
        tap_yield(account.profit_per_tap)
    }

    /// Credits one tap and spends one energy point.
    ///
    /// Energy is not checked and may go negative. The write carries values
    /// computed from `account`, so concurrent taps on one snapshot overwrite
    /// each other.
    pub async fn apply_tap(&self, account: &Account) -> Result<TapOutcome> {
        let profit = self.compute_tap_yield(account);
        let balance = checked("balance", account.balance.checked_add(profit))?;
        let energy = checked("energy", account.energy.checked_sub(1))?;
        self.accounts
            .update(account.id, AccountUpdate::Tap { balance, energy })
            .await?;

        info!(account = account.id, profit, energy, "tap applied");
        Ok(TapOutcome { profit })
    }
}
