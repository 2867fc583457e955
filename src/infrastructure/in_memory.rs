use crate::domain::account::{Account, AccountId, AccountUpdate};
use crate::domain::clothing::{ClothingItem, ClothingOwnership, ItemId};
use crate::domain::ports::{AccountStore, ClothingStore, CounterStore, Stores, WorkerStore};
use crate::domain::worker::{
    TierId, WorkerCategory, WorkerDefinition, WorkerId, WorkerOwnership, WorkerUpgradeTier,
};
use crate::error::{EconomyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for accounts.
///
/// Every write takes the write lock for the duration of a single column
/// update, which mirrors a single-row `UPDATE` in a relational store. Nothing
/// spans two calls.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    inner: Arc<RwLock<AccountTable>>,
}

#[derive(Default)]
struct AccountTable {
    rows: HashMap<AccountId, Account>,
    by_external_id: HashMap<i64, AccountId>,
    next_id: AccountId,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a full row. Intended for fixtures.
    pub async fn insert(&self, account: Account) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(account.id);
        table.by_external_id.insert(account.external_id, account.id);
        table.rows.insert(account.id, account);
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        let table = self.inner.read().await;
        Ok(table
            .by_external_id
            .get(&external_id)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn create(
        &self,
        external_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        let mut table = self.inner.write().await;
        if table.by_external_id.contains_key(&external_id) {
            return Err(EconomyError::InvalidState(format!(
                "account for external id {external_id} already exists"
            )));
        }
        table.next_id += 1;
        let account = Account::new(table.next_id, external_id, display_name, now);
        table.by_external_id.insert(external_id, account.id);
        table.rows.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()> {
        let mut table = self.inner.write().await;
        let account = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| EconomyError::NotFound(format!("account {id}")))?;
        account.apply(&update);
        Ok(())
    }
}

/// Clothing catalog plus ownership rows.
#[derive(Default, Clone)]
pub struct InMemoryClothingStore {
    items: Arc<RwLock<BTreeMap<ItemId, ClothingItem>>>,
    ownerships: Arc<RwLock<Vec<ClothingOwnership>>>,
}

impl InMemoryClothingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ownership rows recorded for the pair, duplicates included.
    pub async fn ownership_count(&self, account: AccountId, item: ItemId) -> usize {
        let ownerships = self.ownerships.read().await;
        ownerships
            .iter()
            .filter(|row| row.account_id == account && row.item_id == item)
            .count()
    }
}

#[async_trait]
impl ClothingStore for InMemoryClothingStore {
    async fn list_items(&self) -> Result<Vec<ClothingItem>> {
        let items = self.items.read().await;
        Ok(items.values().cloned().collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ClothingItem>> {
        let items = self.items.read().await;
        Ok(items.get(&id).cloned())
    }

    async fn find_by_image(&self, image_ref: &str) -> Result<Option<ClothingItem>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .find(|item| item.image_ref == image_ref)
            .cloned())
    }

    async fn put_item(&self, item: ClothingItem) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(item.id, item);
        Ok(())
    }

    async fn owns(&self, account: AccountId, item: ItemId) -> Result<bool> {
        let ownerships = self.ownerships.read().await;
        Ok(ownerships
            .iter()
            .any(|row| row.account_id == account && row.item_id == item))
    }

    async fn add_ownership(&self, account: AccountId, item: ItemId) -> Result<()> {
        let mut ownerships = self.ownerships.write().await;
        let id = ownerships.len() as i64 + 1;
        ownerships.push(ClothingOwnership {
            id,
            account_id: account,
            item_id: item,
        });
        Ok(())
    }
}

/// Worker catalog, tier ladders, and per-account ownership.
#[derive(Default, Clone)]
pub struct InMemoryWorkerStore {
    inner: Arc<RwLock<WorkerTables>>,
}

#[derive(Default)]
struct WorkerTables {
    workers: BTreeMap<WorkerId, WorkerDefinition>,
    tiers: HashMap<TierId, WorkerUpgradeTier>,
    ownerships: HashMap<i64, WorkerOwnership>,
    next_ownership_id: i64,
}

impl InMemoryWorkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkerStore for InMemoryWorkerStore {
    async fn list_workers(&self, category: WorkerCategory) -> Result<Vec<WorkerDefinition>> {
        let tables = self.inner.read().await;
        Ok(tables
            .workers
            .values()
            .filter(|worker| worker.category == category)
            .cloned()
            .collect())
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Option<WorkerDefinition>> {
        let tables = self.inner.read().await;
        Ok(tables.workers.get(&id).cloned())
    }

    async fn put_worker(&self, worker: WorkerDefinition) -> Result<()> {
        let mut tables = self.inner.write().await;
        tables.workers.insert(worker.id, worker);
        Ok(())
    }

    async fn get_tier(&self, worker: WorkerId, level: u32) -> Result<Option<WorkerUpgradeTier>> {
        let tables = self.inner.read().await;
        Ok(tables
            .tiers
            .values()
            .find(|tier| tier.worker_id == worker && tier.level == level)
            .cloned())
    }

    async fn get_tier_by_id(&self, id: TierId) -> Result<Option<WorkerUpgradeTier>> {
        let tables = self.inner.read().await;
        Ok(tables.tiers.get(&id).cloned())
    }

    async fn put_tier(&self, tier: WorkerUpgradeTier) -> Result<()> {
        let mut tables = self.inner.write().await;
        tables.tiers.insert(tier.id, tier);
        Ok(())
    }

    async fn get_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
    ) -> Result<Option<WorkerOwnership>> {
        let tables = self.inner.read().await;
        Ok(tables
            .ownerships
            .values()
            .find(|row| row.account_id == account && row.worker_id == worker)
            .cloned())
    }

    async fn create_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
        tier: TierId,
    ) -> Result<WorkerOwnership> {
        let mut tables = self.inner.write().await;
        tables.next_ownership_id += 1;
        let ownership = WorkerOwnership {
            id: tables.next_ownership_id,
            account_id: account,
            worker_id: worker,
            tier_id: tier,
        };
        tables.ownerships.insert(ownership.id, ownership.clone());
        Ok(ownership)
    }

    async fn update_ownership(&self, ownership_id: i64, tier: TierId) -> Result<()> {
        let mut tables = self.inner.write().await;
        let row = tables
            .ownerships
            .get_mut(&ownership_id)
            .ok_or_else(|| EconomyError::NotFound(format!("worker ownership {ownership_id}")))?;
        row.tier_id = tier;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCounterStore {
    value: Arc<RwLock<Option<i64>>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn load(&self) -> Result<Option<i64>> {
        Ok(*self.value.read().await)
    }

    async fn save(&self, value: i64) -> Result<()> {
        *self.value.write().await = Some(value);
        Ok(())
    }
}

/// Fresh in-memory implementations of every port.
pub fn in_memory_stores() -> Stores {
    Stores {
        accounts: Arc::new(InMemoryAccountStore::new()),
        clothing: Arc::new(InMemoryClothingStore::new()),
        workers: Arc::new(InMemoryWorkerStore::new()),
        counter: Arc::new(InMemoryCounterStore::new()),
    }
}
