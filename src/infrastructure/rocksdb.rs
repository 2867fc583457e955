use crate::domain::account::{Account, AccountId, AccountUpdate};
use crate::domain::clothing::{ClothingItem, ClothingOwnership, ItemId};
use crate::domain::ports::{AccountStore, ClothingStore, CounterStore, Stores, WorkerStore};
use crate::domain::worker::{
    TierId, WorkerCategory, WorkerDefinition, WorkerId, WorkerOwnership, WorkerUpgradeTier,
};
use crate::error::{EconomyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Account rows keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// External id to account id.
pub const CF_ACCOUNT_INDEX: &str = "account_index";
pub const CF_CLOTHES: &str = "clothes";
/// Keyed by account id, item id, row id.
pub const CF_CLOTHING_OWNERSHIP: &str = "clothing_ownership";
pub const CF_WORKERS: &str = "workers";
pub const CF_WORKER_TIERS: &str = "worker_tiers";
/// Keyed by account id, worker id.
pub const CF_WORKER_OWNERSHIP: &str = "worker_ownership";
/// Ownership id to its `CF_WORKER_OWNERSHIP` key.
pub const CF_WORKER_OWNERSHIP_IDS: &str = "worker_ownership_ids";
pub const CF_COUNTER: &str = "counter";
/// Id sequences.
pub const CF_META: &str = "meta";

const COLUMN_FAMILIES: [&str; 10] = [
    CF_ACCOUNTS,
    CF_ACCOUNT_INDEX,
    CF_CLOTHES,
    CF_CLOTHING_OWNERSHIP,
    CF_WORKERS,
    CF_WORKER_TIERS,
    CF_WORKER_OWNERSHIP,
    CF_WORKER_OWNERSHIP_IDS,
    CF_COUNTER,
    CF_META,
];

const COUNTER_KEY: &[u8] = b"value";
const SEQ_ACCOUNT: &[u8] = b"seq/account";
const SEQ_CLOTHING_OWNERSHIP: &[u8] = b"seq/clothing_ownership";
const SEQ_WORKER_OWNERSHIP: &[u8] = b"seq/worker_ownership";

/// A persistent store implementing every port on top of RocksDB.
///
/// Each entity lives in its own column family, serialized as JSON. Row-level
/// read-modify-write (a column update, an id allocation) runs under
/// `write_lock` so a single update is atomic; nothing spans two port calls.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating any
    /// missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Every port backed by this one database.
    pub fn stores(&self) -> Stores {
        Stores {
            accounts: Arc::new(self.clone()),
            clothing: Arc::new(self.clone()),
            workers: Arc::new(self.clone()),
            counter: Arc::new(self.clone()),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            EconomyError::internal(std::io::Error::other(format!(
                "column family '{name}' not found"
            )))
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|e| {
            EconomyError::internal(std::io::Error::other(format!("write lock poisoned: {e}")))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    /// All values of a column family whose key starts with `prefix`.
    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    /// Allocates the next id of a sequence. Caller must hold `write_lock`.
    fn next_id(&self, sequence: &[u8]) -> Result<i64> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, sequence)? {
            Some(bytes) => decode_i64(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.db.put_cf(cf, sequence, next.to_be_bytes())?;
        Ok(next)
    }
}

fn decode_i64(bytes: &[u8]) -> Result<i64> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| {
        EconomyError::internal(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("expected 8 bytes, found {}", bytes.len()),
        ))
    })?;
    Ok(i64::from_be_bytes(array))
}

fn pair_key(a: i64, b: i64) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&a.to_be_bytes());
    key.extend_from_slice(&b.to_be_bytes());
    key
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, &id.to_be_bytes())
    }

    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        let index = self.cf(CF_ACCOUNT_INDEX)?;
        match self.db.get_cf(index, external_id.to_be_bytes())? {
            Some(bytes) => {
                let id = decode_i64(&bytes)?;
                self.get_json(CF_ACCOUNTS, &id.to_be_bytes())
            }
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        external_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        let _guard = self.lock()?;
        let index = self.cf(CF_ACCOUNT_INDEX)?;
        if self.db.get_cf(index, external_id.to_be_bytes())?.is_some() {
            return Err(EconomyError::InvalidState(format!(
                "account for external id {external_id} already exists"
            )));
        }

        let id = self.next_id(SEQ_ACCOUNT)?;
        let account = Account::new(id, external_id, display_name, now);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_ACCOUNTS)?,
            id.to_be_bytes(),
            serde_json::to_vec(&account)?,
        );
        batch.put_cf(index, external_id.to_be_bytes(), id.to_be_bytes());
        self.db.write(batch)?;

        Ok(account)
    }

    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()> {
        let _guard = self.lock()?;
        let mut account: Account = self
            .get_json(CF_ACCOUNTS, &id.to_be_bytes())?
            .ok_or_else(|| EconomyError::NotFound(format!("account {id}")))?;
        account.apply(&update);
        self.put_json(CF_ACCOUNTS, &id.to_be_bytes(), &account)
    }
}

#[async_trait]
impl ClothingStore for RocksDBStore {
    async fn list_items(&self) -> Result<Vec<ClothingItem>> {
        self.scan_json(CF_CLOTHES, &[])
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ClothingItem>> {
        self.get_json(CF_CLOTHES, &id.to_be_bytes())
    }

    async fn find_by_image(&self, image_ref: &str) -> Result<Option<ClothingItem>> {
        let items: Vec<ClothingItem> = self.scan_json(CF_CLOTHES, &[])?;
        Ok(items.into_iter().find(|item| item.image_ref == image_ref))
    }

    async fn put_item(&self, item: ClothingItem) -> Result<()> {
        self.put_json(CF_CLOTHES, &item.id.to_be_bytes(), &item)
    }

    async fn owns(&self, account: AccountId, item: ItemId) -> Result<bool> {
        let rows: Vec<ClothingOwnership> =
            self.scan_json(CF_CLOTHING_OWNERSHIP, &pair_key(account, item))?;
        Ok(!rows.is_empty())
    }

    async fn add_ownership(&self, account: AccountId, item: ItemId) -> Result<()> {
        let _guard = self.lock()?;
        let id = self.next_id(SEQ_CLOTHING_OWNERSHIP)?;
        let mut key = pair_key(account, item);
        key.extend_from_slice(&id.to_be_bytes());
        self.put_json(
            CF_CLOTHING_OWNERSHIP,
            &key,
            &ClothingOwnership {
                id,
                account_id: account,
                item_id: item,
            },
        )
    }
}

#[async_trait]
impl WorkerStore for RocksDBStore {
    async fn list_workers(&self, category: WorkerCategory) -> Result<Vec<WorkerDefinition>> {
        let workers: Vec<WorkerDefinition> = self.scan_json(CF_WORKERS, &[])?;
        Ok(workers
            .into_iter()
            .filter(|worker| worker.category == category)
            .collect())
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Option<WorkerDefinition>> {
        self.get_json(CF_WORKERS, &id.to_be_bytes())
    }

    async fn put_worker(&self, worker: WorkerDefinition) -> Result<()> {
        self.put_json(CF_WORKERS, &worker.id.to_be_bytes(), &worker)
    }

    async fn get_tier(&self, worker: WorkerId, level: u32) -> Result<Option<WorkerUpgradeTier>> {
        let tiers: Vec<WorkerUpgradeTier> = self.scan_json(CF_WORKER_TIERS, &[])?;
        Ok(tiers
            .into_iter()
            .find(|tier| tier.worker_id == worker && tier.level == level))
    }

    async fn get_tier_by_id(&self, id: TierId) -> Result<Option<WorkerUpgradeTier>> {
        self.get_json(CF_WORKER_TIERS, &id.to_be_bytes())
    }

    async fn put_tier(&self, tier: WorkerUpgradeTier) -> Result<()> {
        self.put_json(CF_WORKER_TIERS, &tier.id.to_be_bytes(), &tier)
    }

    async fn get_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
    ) -> Result<Option<WorkerOwnership>> {
        self.get_json(CF_WORKER_OWNERSHIP, &pair_key(account, worker))
    }

    async fn create_ownership(
        &self,
        account: AccountId,
        worker: WorkerId,
        tier: TierId,
    ) -> Result<WorkerOwnership> {
        let _guard = self.lock()?;
        let id = self.next_id(SEQ_WORKER_OWNERSHIP)?;
        let ownership = WorkerOwnership {
            id,
            account_id: account,
            worker_id: worker,
            tier_id: tier,
        };
        let key = pair_key(account, worker);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_WORKER_OWNERSHIP)?,
            &key,
            serde_json::to_vec(&ownership)?,
        );
        batch.put_cf(self.cf(CF_WORKER_OWNERSHIP_IDS)?, id.to_be_bytes(), &key);
        self.db.write(batch)?;

        Ok(ownership)
    }

    async fn update_ownership(&self, ownership_id: i64, tier: TierId) -> Result<()> {
        let _guard = self.lock()?;
        let ids = self.cf(CF_WORKER_OWNERSHIP_IDS)?;
        let key = self
            .db
            .get_cf(ids, ownership_id.to_be_bytes())?
            .ok_or_else(|| EconomyError::NotFound(format!("worker ownership {ownership_id}")))?;
        let mut ownership: WorkerOwnership = self
            .get_json(CF_WORKER_OWNERSHIP, &key)?
            .ok_or_else(|| EconomyError::NotFound(format!("worker ownership {ownership_id}")))?;
        ownership.tier_id = tier;
        self.put_json(CF_WORKER_OWNERSHIP, &key, &ownership)
    }
}

#[async_trait]
impl CounterStore for RocksDBStore {
    async fn load(&self) -> Result<Option<i64>> {
        let cf = self.cf(CF_COUNTER)?;
        match self.db.get_cf(cf, COUNTER_KEY)? {
            Some(bytes) => Ok(Some(decode_i64(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, value: i64) -> Result<()> {
        let cf = self.cf(CF_COUNTER)?;
        self.db.put_cf(cf, COUNTER_KEY, value.to_be_bytes())?;
        Ok(())
    }
}
