use crate::domain::account::{Account, AccountUpdate, Slot, checked};
use crate::domain::clothing::{ClothingItem, ItemId, StatDelta};
use crate::domain::ports::{AccountStoreRef, ClothingStoreRef};
use crate::error::{EconomyError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Catalog entry as seen by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClothingListing {
    pub id: ItemId,
    pub image_ref: String,
    pub price: i64,
    pub slot: Slot,
    pub rarity: String,
    pub is_bought: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClothingDetail {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    pub price: i64,
    pub slot: Slot,
    pub rarity: String,
    pub per_tap_bonus: i64,
    pub energy_bonus: i64,
    pub is_bought: bool,
    pub is_equipped: bool,
    pub can_buy: bool,
}

/// Cosmetic item catalog, purchases, and slot equipment.
///
/// Purchases and equips are sequences of independent writes. A persistence
/// failure between two of them leaves the earlier ones applied.
#[derive(Clone)]
pub struct EquipmentLedger {
    accounts: AccountStoreRef,
    clothing: ClothingStoreRef,
}

impl EquipmentLedger {
    pub fn new(accounts: AccountStoreRef, clothing: ClothingStoreRef) -> Self {
        Self { accounts, clothing }
    }

    pub async fn list_catalog(&self, account: &Account) -> Result<Vec<ClothingListing>> {
        let items = self.clothing.list_items().await?;
        let mut listings = Vec::with_capacity(items.len());
        for item in items {
            let is_bought = self.clothing.owns(account.id, item.id).await?;
            listings.push(ClothingListing {
                id: item.id,
                image_ref: item.image_ref,
                price: item.price,
                slot: item.slot,
                rarity: item.rarity,
                is_bought,
            });
        }
        Ok(listings)
    }

    pub async fn get_item_detail(&self, account: &Account, item_id: ItemId) -> Result<ClothingDetail> {
        let item = self.load_item(item_id).await?;
        let is_bought = self.clothing.owns(account.id, item.id).await?;
        // Slots hold image references, so identity here is the image, not the id.
        let is_equipped = account.equipment.get(item.slot) == Some(item.image_ref.as_str());
        let can_buy = !is_equipped && account.balance >= item.price;

        Ok(ClothingDetail {
            id: item.id,
            name: item.name,
            description: item.description,
            image_ref: item.image_ref,
            price: item.price,
            slot: item.slot,
            rarity: item.rarity,
            per_tap_bonus: item.per_tap_bonus,
            energy_bonus: item.energy_bonus,
            is_bought,
            is_equipped,
            can_buy,
        })
    }

    /// Buys an item: records ownership, then deducts the price.
    ///
    /// Buying an item already owned succeeds again and records another row.
    pub async fn purchase(&self, account: &Account, item_id: ItemId) -> Result<()> {
        let item = self.load_item(item_id).await?;
        if account.balance < item.price {
            warn!(
                account = account.id,
                item = item.id,
                balance = account.balance,
                price = item.price,
                "purchase rejected: insufficient funds"
            );
            return Err(EconomyError::InsufficientFunds {
                balance: account.balance,
                required: item.price,
            });
        }

        let balance = checked("balance", account.balance.checked_sub(item.price))?;
        self.clothing.add_ownership(account.id, item.id).await?;
        self.accounts
            .update(account.id, AccountUpdate::Balance(balance))
            .await?;

        info!(
            account = account.id,
            item = item.id,
            price = item.price,
            new_balance = balance,
            "item purchased"
        );
        Ok(())
    }

    /// Puts an owned item in its slot, replacing whatever was there, and
    /// swaps the old item's stat bonuses for the new one's.
    pub async fn equip(&self, account: &Account, item_id: ItemId) -> Result<()> {
        let item = self.load_item(item_id).await?;
        if !self.clothing.owns(account.id, item.id).await? {
            return Err(EconomyError::NotOwned { item: item.id });
        }

        let previous = match account.equipment.get(item.slot) {
            Some(image_ref) => Some(self.clothing.find_by_image(image_ref).await?.ok_or_else(|| {
                EconomyError::NotFound(format!("equipped item with image '{image_ref}'"))
            })?),
            None => None,
        };
        let delta = StatDelta::between(previous.as_ref(), &item);
        debug!(
            account = account.id,
            slot = %item.slot,
            previous = previous.as_ref().map(|p| p.id),
            energy_delta = delta.energy,
            per_tap_delta = delta.per_tap,
            "equip delta computed"
        );
        let max_energy = checked("max energy", account.max_energy.checked_add(delta.energy))?;
        let profit_per_tap = checked("profit per tap", account.profit_per_tap.checked_add(delta.per_tap))?;

        self.accounts
            .update(
                account.id,
                AccountUpdate::Slot {
                    slot: item.slot,
                    image_ref: Some(item.image_ref.clone()),
                },
            )
            .await?;
        self.accounts
            .update(
                account.id,
                AccountUpdate::MaxEnergy(max_energy),
            )
            .await?;
        self.accounts
            .update(
                account.id,
                AccountUpdate::ProfitPerTap(profit_per_tap),
            )
            .await?;

        info!(account = account.id, item = item.id, slot = %item.slot, "item equipped");
        Ok(())
    }

    async fn load_item(&self, item_id: ItemId) -> Result<ClothingItem> {
        self.clothing
            .get_item(item_id)
            .await?
            .ok_or_else(|| EconomyError::NotFound(format!("clothing item {item_id}")))
    }
}
