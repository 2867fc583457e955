use crate::domain::account::{Account, AccountUpdate, checked};
use crate::domain::ports::{AccountStoreRef, WorkerStoreRef};
use crate::domain::worker::{WorkerCategory, WorkerDefinition, WorkerId, WorkerOwnership, WorkerUpgradeTier};
use crate::error::{EconomyError, Result};
use serde::Serialize;
use tracing::{info, warn};

/// A worker as seen by one account: its current rung and the price of the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerListing {
    pub id: WorkerId,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    /// Zero when the account does not own the worker.
    pub level: u32,
    /// Hourly income contributed by the current tier.
    pub profit: i64,
    /// Cost of the next tier, zero at the top of the ladder.
    pub cost: i64,
    pub can_upgrade: bool,
}

/// Income-generating workers and their tiered upgrade ladders.
///
/// An upgrade is three sequential writes (balance, ownership, hourly profit)
/// with no transaction around them.
#[derive(Clone)]
pub struct WorkerLedger {
    accounts: AccountStoreRef,
    workers: WorkerStoreRef,
}

impl WorkerLedger {
    pub fn new(accounts: AccountStoreRef, workers: WorkerStoreRef) -> Self {
        Self { accounts, workers }
    }

    pub async fn list_catalog(&self, account: &Account, category: WorkerCategory) -> Result<Vec<WorkerListing>> {
        let definitions = self.workers.list_workers(category).await?;
        let mut listings = Vec::with_capacity(definitions.len());
        for worker in definitions {
            listings.push(self.listing(account, worker).await?);
        }
        Ok(listings)
    }

    async fn listing(&self, account: &Account, worker: WorkerDefinition) -> Result<WorkerListing> {
        let (_, current) = self.current_tier(account, worker.id).await?;
        let level = current.as_ref().map_or(0, |tier| tier.level);
        let profit = current.as_ref().map_or(0, |tier| tier.profit_per_hour);

        let (cost, can_upgrade) = match self.workers.get_tier(worker.id, level + 1).await? {
            Some(next) => (next.cost, account.balance >= next.cost),
            None => (0, false),
        };

        Ok(WorkerListing {
            id: worker.id,
            name: worker.name,
            description: worker.description,
            image_ref: worker.image_ref,
            level,
            profit,
            cost,
            can_upgrade,
        })
    }

    /// Buys the next tier of a worker (tier 1 if not yet owned) and returns
    /// the worker's category so callers can refresh the right listing.
    pub async fn upgrade(&self, account: &Account, worker_id: WorkerId) -> Result<WorkerCategory> {
        let worker = self
            .workers
            .get_worker(worker_id)
            .await?
            .ok_or_else(|| EconomyError::NotFound(format!("worker {worker_id}")))?;

        let (ownership, current) = self.current_tier(account, worker.id).await?;
        let next_level = current.as_ref().map_or(1, |tier| tier.level + 1);
        let next = self
            .workers
            .get_tier(worker.id, next_level)
            .await?
            .ok_or(EconomyError::MaxLevelReached { worker: worker.id })?;

        if account.balance < next.cost {
            warn!(
                account = account.id,
                worker = worker.id,
                balance = account.balance,
                cost = next.cost,
                "upgrade rejected: insufficient funds"
            );
            return Err(EconomyError::InsufficientFunds {
                balance: account.balance,
                required: next.cost,
            });
        }

        let old_profit = current.as_ref().map_or(0, |tier| tier.profit_per_hour);
        let balance = checked("balance", account.balance.checked_sub(next.cost))?;
        let profit_per_hour = checked(
            "profit per hour",
            account
                .profit_per_hour
                .checked_add(next.profit_per_hour)
                .and_then(|total| total.checked_sub(old_profit)),
        )?;

        self.accounts
            .update(account.id, AccountUpdate::Balance(balance))
            .await?;

        match ownership {
            Some(ownership) => self.workers.update_ownership(ownership.id, next.id).await?,
            None => {
                self.workers
                    .create_ownership(account.id, worker.id, next.id)
                    .await?;
            }
        }

        self.accounts
            .update(account.id, AccountUpdate::ProfitPerHour(profit_per_hour))
            .await?;

        info!(
            account = account.id,
            worker = worker.id,
            level = next.level,
            cost = next.cost,
            profit_per_hour,
            "worker upgraded"
        );
        Ok(worker.category)
    }

    /// The account's ownership row for a worker and the tier it points at.
    async fn current_tier(
        &self,
        account: &Account,
        worker: WorkerId,
    ) -> Result<(Option<WorkerOwnership>, Option<WorkerUpgradeTier>)> {
        let Some(ownership) = self.workers.get_ownership(account.id, worker).await? else {
            return Ok((None, None));
        };
        let tier = self
            .workers
            .get_tier_by_id(ownership.tier_id)
            .await?
            .ok_or_else(|| EconomyError::NotFound(format!("worker tier {}", ownership.tier_id)))?;
        Ok((Some(ownership), Some(tier)))
    }
}
