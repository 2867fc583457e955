#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use idlecoin::application::engine::{DEFAULT_REQUEST_TIMEOUT, EconomyEngine};
use idlecoin::domain::account::{Account, AccountId, AccountUpdate};
use idlecoin::domain::ports::{AccountStore, AccountStoreRef, Stores};
use idlecoin::domain::principal::Principal;
use idlecoin::error::{EconomyError, Result};
use idlecoin::infrastructure::clock::ManualClock;
use idlecoin::infrastructure::in_memory::in_memory_stores;
use idlecoin::interfaces::csv::catalog_reader;
use idlecoin::interfaces::telegram::TelegramAuthenticator;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";

pub fn fixture_catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog")
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn alice() -> Principal {
    Principal {
        id: 1001,
        username: "alice".into(),
    }
}

pub fn signed_init_data(principal: &Principal) -> String {
    TelegramAuthenticator::new(BOT_TOKEN)
        .unwrap()
        .sign_principal(principal, 1_700_000_000)
        .unwrap()
}

/// An engine over `stores`, seeded with the fixture catalog.
pub async fn seeded_engine(stores: Stores, clock: Arc<ManualClock>, timeout: Duration) -> EconomyEngine {
    let engine = EconomyEngine::new(stores, clock, timeout);
    let catalog = catalog_reader::load_dir(fixture_catalog_dir()).unwrap();
    engine.seed(&catalog).await.unwrap();
    engine
}

pub struct TestContext {
    pub engine: EconomyEngine,
    pub clock: Arc<ManualClock>,
    pub stores: Stores,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_stores(in_memory_stores(), DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn with_stores(stores: Stores, timeout: Duration) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let engine = seeded_engine(stores.clone(), clock.clone(), timeout).await;
        Self {
            engine,
            clock,
            stores,
        }
    }

    /// Reads the caller's row straight from the account store.
    pub async fn account(&self, principal: &Principal) -> Account {
        self.stores
            .accounts
            .get_by_external_id(principal.id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// Holds every lookup by external id until `parties` callers have read,
/// so they all act on the same snapshot.
pub struct BarrierAccountStore {
    inner: AccountStoreRef,
    barrier: Barrier,
}

impl BarrierAccountStore {
    pub fn new(inner: AccountStoreRef, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl AccountStore for BarrierAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.get(id).await
    }

    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        let account = self.inner.get_by_external_id(external_id).await?;
        self.barrier.wait().await;
        Ok(account)
    }

    async fn create(&self, external_id: i64, display_name: &str, now: DateTime<Utc>) -> Result<Account> {
        self.inner.create(external_id, display_name, now).await
    }

    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()> {
        self.inner.update(id, update).await
    }
}

/// Delays every write.
pub struct SlowAccountStore {
    inner: AccountStoreRef,
    delay: Duration,
}

impl SlowAccountStore {
    pub fn new(inner: AccountStoreRef, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl AccountStore for SlowAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.get(id).await
    }

    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        self.inner.get_by_external_id(external_id).await
    }

    async fn create(&self, external_id: i64, display_name: &str, now: DateTime<Utc>) -> Result<Account> {
        self.inner.create(external_id, display_name, now).await
    }

    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.update(id, update).await
    }
}

/// Lets a fixed number of writes through once armed, then fails the next one.
pub struct FaultyAccountStore {
    inner: AccountStoreRef,
    allowance: Mutex<Option<usize>>,
}

impl FaultyAccountStore {
    pub fn new(inner: AccountStoreRef) -> Self {
        Self {
            inner,
            allowance: Mutex::new(None),
        }
    }

    pub fn fail_after(&self, writes: usize) {
        *self.allowance.lock().unwrap() = Some(writes);
    }

    fn should_fail(&self) -> bool {
        let mut allowance = self.allowance.lock().unwrap();
        match allowance.as_mut() {
            None => false,
            Some(0) => {
                *allowance = None;
                true
            }
            Some(remaining) => {
                *remaining -= 1;
                false
            }
        }
    }
}

#[async_trait]
impl AccountStore for FaultyAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.get(id).await
    }

    async fn get_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        self.inner.get_by_external_id(external_id).await
    }

    async fn create(&self, external_id: i64, display_name: &str, now: DateTime<Utc>) -> Result<Account> {
        self.inner.create(external_id, display_name, now).await
    }

    async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<()> {
        if self.should_fail() {
            return Err(EconomyError::IoError(std::io::Error::other("injected write failure")));
        }
        self.inner.update(id, update).await
    }
}
