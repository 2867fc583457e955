use super::account::{Account, AccountId, AccountUpdate};
use super::clothing::{ClothingItem, ItemId};
use super::worker::{TierId, WorkerCategory, WorkerDefinition, WorkerId, WorkerOwnership, WorkerUpgradeTier};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>>;
    /// Inserts a new account row and assigns its id.
    async fn create(
        &self,
        external_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account>;
    /// Applies one column-level write. Fails with `NotFound` if the row is gone.
    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()>;
}

#[async_trait]
pub trait ClothingStore: Send + Sync {
    async fn list_items(&self) -> Result<Vec<ClothingItem>>;
    async fn get_item(&self, id: ItemId) -> Result<Option<ClothingItem>>;
    async fn find_by_image(&self, image_ref: &str) -> Result<Option<ClothingItem>>;
    /// Catalog upsert keyed by item id.
    async fn put_item(&self, item: ClothingItem) -> Result<()>;
    async fn owns(&self, account: AccountId, item: ItemId) -> Result<bool>;
    async fn add_ownership(&self, account: AccountId, item: ItemId) -> Result<()>;
}

#[async_trait]
pub trait WorkerStore: Send + Sync {
    async fn list_workers(&self, category: WorkerCategory) -> Result<Vec<WorkerDefinition>>;
    async fn get_worker(&self, id: WorkerId) -> Result<Option<WorkerDefinition>>;
    async fn put_worker(&self, worker: WorkerDefinition) -> Result<()>;
    async fn get_tier(&self, worker: WorkerId, level: u32) -> Result<Option<WorkerUpgradeTier>>;
    async fn get_tier_by_id(&self, id: TierId) -> Result<Option<WorkerUpgradeTier>>;
    async fn put_tier(&self, tier: WorkerUpgradeTier) -> Result<()>;
    async fn get_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
    ) -> Result<Option<WorkerOwnership>>;
    async fn create_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
        tier: TierId,
    ) -> Result<WorkerOwnership>;
    async fn update_ownership(&self, ownership_id: i64, tier: TierId) -> Result<()>;
}

/// The single persisted counter value.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn load(&self) -> Result<Option<i64>>;
    async fn save(&self, value: i64) -> Result<()>;
}

/// Source of "now" for time-based accrual.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type ClothingStoreRef = Arc<dyn ClothingStore>;
pub type WorkerStoreRef = Arc<dyn WorkerStore>;
pub type CounterStoreRef = Arc<dyn CounterStore>;
pub type ClockRef = Arc<dyn Clock>;

/// Every persistence port the engine needs, bundled for construction.
#[derive(Clone)]
pub struct Stores {
    pub accounts: AccountStoreRef,
    pub clothing: ClothingStoreRef,
    pub workers: WorkerStoreRef,
    pub counter: CounterStoreRef,
}
