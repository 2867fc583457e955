use super::accounts::AccountService;
use super::accrual::AccrualEngine;
use super::aggregator::{AccountView, ConcurrentAggregator};
use super::background::BackgroundTasks;
use super::counter::{AtomicCounter, CounterDelta};
use super::equipment::{ClothingDetail, ClothingListing, EquipmentLedger};
use super::tap::{TapOutcome, TapResolver};
use super::workers::{WorkerLedger, WorkerListing};
use crate::domain::account::Account;
use crate::domain::catalog::Catalog;
use crate::domain::clothing::ItemId;
use crate::domain::ports::{ClockRef, Stores};
use crate::domain::principal::Principal;
use crate::domain::worker::{WorkerCategory, WorkerId};
use crate::error::{EconomyError, Result};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Request deadline applied to account fetches unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// The main entry point of the economy.
///
/// Every operation resolves the caller's account fresh from the store, so each
/// one works against the snapshot current at its start. Nothing is cached
/// between calls.
pub struct EconomyEngine {
    stores: Stores,
    clock: ClockRef,
    request_timeout: Duration,
    background: BackgroundTasks,
    accounts: AccountService,
    aggregator: ConcurrentAggregator,
    tap: TapResolver,
    equipment: EquipmentLedger,
    workers: WorkerLedger,
    counter: AtomicCounter,
}

impl EconomyEngine {
    /// Creates an engine over the given stores.
    ///
    /// # Arguments
    ///
    /// * `stores` - Persistence for accounts, catalog, ownership and the counter.
    /// * `clock` - Source of "now" for accrual.
    /// * `request_timeout` - Deadline for [`EconomyEngine::fetch_account`].
    pub fn new(stores: Stores, clock: ClockRef, request_timeout: Duration) -> Self {
        let background = BackgroundTasks::new();
        let accrual = AccrualEngine::new(stores.accounts.clone());
        Self {
            accounts: AccountService::new(stores.accounts.clone()),
            aggregator: ConcurrentAggregator::new(accrual, background.clone()),
            tap: TapResolver::new(stores.accounts.clone()),
            equipment: EquipmentLedger::new(stores.accounts.clone(), stores.clothing.clone()),
            workers: WorkerLedger::new(stores.accounts.clone(), stores.workers.clone()),
            counter: AtomicCounter::new(stores.counter.clone(), background.clone()),
            background,
            stores,
            clock,
            request_timeout,
        }
    }

    /// Validates and upserts catalog rows into the stores.
    pub async fn seed(&self, catalog: &Catalog) -> Result<()> {
        catalog.validate()?;
        for item in &catalog.clothes {
            self.stores.clothing.put_item(item.clone()).await?;
        }
        for worker in &catalog.workers {
            self.stores.workers.put_worker(worker.clone()).await?;
        }
        for tier in &catalog.tiers {
            self.stores.workers.put_tier(tier.clone()).await?;
        }
        info!(
            clothes = catalog.clothes.len(),
            workers = catalog.workers.len(),
            tiers = catalog.tiers.len(),
            "catalog seeded"
        );
        Ok(())
    }

    /// Returns the caller's account after crediting passive income and
    /// restoring energy.
    ///
    /// Fails with `Timeout` when the deadline elapses first. Accrual already
    /// dispatched keeps running and its writes still land.
    #[instrument(skip(self), fields(user = principal.id))]
    pub async fn fetch_account(&self, principal: &Principal) -> Result<AccountView> {
        let work = async {
            let now = self.clock.now();
            let account = self.accounts.resolve(principal, now).await?;
            self.aggregator.refresh(&account, now).await
        };
        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.request_timeout.as_millis() as u64, "account fetch timed out");
                Err(EconomyError::Timeout(self.request_timeout))
            }
        }
    }

    #[instrument(skip(self), fields(user = principal.id))]
    pub async fn tap(&self, principal: &Principal) -> Result<TapOutcome> {
        let account = self.resolve(principal).await?;
        self.tap.apply_tap(&account).await
    }

    pub async fn list_clothes(&self, principal: &Principal) -> Result<Vec<ClothingListing>> {
        let account = self.resolve(principal).await?;
        self.equipment.list_catalog(&account).await
    }

    pub async fn clothing_detail(&self, principal: &Principal, item: ItemId) -> Result<ClothingDetail> {
        let account = self.resolve(principal).await?;
        self.equipment.get_item_detail(&account, item).await
    }

    /// Buys an item and returns its refreshed detail.
    #[instrument(skip(self), fields(user = principal.id))]
    pub async fn buy_clothing(&self, principal: &Principal, item: ItemId) -> Result<ClothingDetail> {
        let account = self.resolve(principal).await?;
        self.equipment.purchase(&account, item).await?;
        let account = self.accounts.load(account.id).await?;
        self.equipment.get_item_detail(&account, item).await
    }

    /// Equips an owned item and returns its refreshed detail.
    #[instrument(skip(self), fields(user = principal.id))]
    pub async fn equip_clothing(&self, principal: &Principal, item: ItemId) -> Result<ClothingDetail> {
        let account = self.resolve(principal).await?;
        self.equipment.equip(&account, item).await?;
        let account = self.accounts.load(account.id).await?;
        self.equipment.get_item_detail(&account, item).await
    }

    pub async fn list_workers(
        &self,
        principal: &Principal,
        category: WorkerCategory,
    ) -> Result<Vec<WorkerListing>> {
        let account = self.resolve(principal).await?;
        self.workers.list_catalog(&account, category).await
    }

    /// Upgrades a worker and returns the refreshed listing of its category.
    #[instrument(skip(self), fields(user = principal.id))]
    pub async fn upgrade_worker(&self, principal: &Principal, worker: WorkerId) -> Result<Vec<WorkerListing>> {
        let account = self.resolve(principal).await?;
        let category = self.workers.upgrade(&account, worker).await?;
        let account = self.accounts.load(account.id).await?;
        self.workers.list_catalog(&account, category).await
    }

    pub async fn counter_get(&self) -> Result<i64> {
        self.counter.get().await
    }

    pub fn counter_increment(&self) {
        self.counter.increment();
    }

    pub async fn counter_double(&self) -> Result<CounterDelta> {
        self.counter.double().await
    }

    pub async fn counter_add(&self, delta: i64) -> Result<CounterDelta> {
        self.counter.add_delta(delta).await
    }

    /// Waits for all detached work (increments, accrual outliving a timed-out
    /// fetch) to finish.
    pub async fn shutdown(&self) {
        self.background.drain().await;
        info!("engine shut down");
    }

    async fn resolve(&self, principal: &Principal) -> Result<Account> {
        self.accounts.resolve(principal, self.clock.now()).await
    }
}
