use super::account::{AccountId, Slot};
use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// A cosmetic item from the catalog. Immutable once seeded.
///
/// `image_ref` is unique across the catalog: equipped slots store it as the
/// item's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    pub price: i64,
    pub slot: Slot,
    pub rarity: String,
    pub per_tap_bonus: i64,
    pub energy_bonus: i64,
}

/// Membership of an item in an account's wardrobe. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingOwnership {
    pub id: i64,
    pub account_id: AccountId,
    pub item_id: ItemId,
}

/// Stat changes caused by replacing `old` with `new` in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatDelta {
    pub energy: i64,
    pub per_tap: i64,
}

impl StatDelta {
    pub fn between(old: Option<&ClothingItem>, new: &ClothingItem) -> Self {
        Self {
            energy: new.energy_bonus - old.map_or(0, |item| item.energy_bonus),
            per_tap: new.per_tap_bonus - old.map_or(0, |item| item.per_tap_bonus),
        }
    }
}
