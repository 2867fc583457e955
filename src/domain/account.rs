use crate::error::{EconomyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type AccountId = i64;

pub const DEFAULT_LEVEL: i32 = 1;
pub const DEFAULT_ENERGY: i64 = 100;

/// Minutes of wall-clock time needed to regenerate one point of energy.
pub const MINUTES_PER_ENERGY: i64 = 2;

/// Minimum currency credited per tap.
pub const MIN_TAP_YIELD: i64 = 1;

/// One of the five equipment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Head,
    Body,
    Legs,
    Foot,
    Hand,
}

impl Slot {
    pub const ALL: [Slot; 5] = [Slot::Head, Slot::Body, Slot::Legs, Slot::Foot, Slot::Hand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Head => "head",
            Slot::Body => "body",
            Slot::Legs => "legs",
            Slot::Foot => "foot",
            Slot::Hand => "hand",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equipped items, each identified by the item's image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub head: Option<String>,
    pub body: Option<String>,
    pub legs: Option<String>,
    pub foot: Option<String>,
    pub hand: Option<String>,
}

impl Equipment {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Head => self.head.as_deref(),
            Slot::Body => self.body.as_deref(),
            Slot::Legs => self.legs.as_deref(),
            Slot::Foot => self.foot.as_deref(),
            Slot::Hand => self.hand.as_deref(),
        }
    }

    pub fn set(&mut self, slot: Slot, image_ref: Option<String>) {
        let target = match slot {
            Slot::Head => &mut self.head,
            Slot::Body => &mut self.body,
            Slot::Legs => &mut self.legs,
            Slot::Foot => &mut self.foot,
            Slot::Hand => &mut self.hand,
        };
        *target = image_ref;
    }
}

/// A player's economy state.
///
/// `0 <= energy <= max_energy` is intended but a tap may drive energy below
/// zero. `balance >= 0` is only checked at points of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Identity assigned by the authentication collaborator.
    pub external_id: i64,
    pub display_name: String,
    pub balance: i64,
    pub level: i32,
    pub energy: i64,
    pub max_energy: i64,
    pub profit_per_hour: i64,
    pub profit_per_tap: i64,
    pub equipment: Equipment,
    pub last_accrual_at: DateTime<Utc>,
    pub last_energy_at: DateTime<Utc>,
}

impl Account {
    /// A freshly registered account. Both clocks start at `now`.
    pub fn new(
        id: AccountId,
        external_id: i64,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            external_id,
            display_name: display_name.into(),
            balance: 0,
            level: DEFAULT_LEVEL,
            energy: DEFAULT_ENERGY,
            max_energy: DEFAULT_ENERGY,
            profit_per_hour: 0,
            profit_per_tap: 0,
            equipment: Equipment::default(),
            last_accrual_at: now,
            last_energy_at: now,
        }
    }

    /// Applies a single column-level write.
    pub fn apply(&mut self, update: &AccountUpdate) {
        match update {
            AccountUpdate::Accrual { balance, at } => {
                self.balance = *balance;
                self.last_accrual_at = *at;
            }
            AccountUpdate::EnergyRestore { energy, at } => {
                self.energy = *energy;
                self.last_energy_at = *at;
            }
            AccountUpdate::Tap { balance, energy } => {
                self.balance = *balance;
                self.energy = *energy;
            }
            AccountUpdate::Balance(balance) => self.balance = *balance,
            AccountUpdate::Slot { slot, image_ref } => {
                self.equipment.set(*slot, image_ref.clone());
            }
            AccountUpdate::MaxEnergy(max_energy) => self.max_energy = *max_energy,
            AccountUpdate::ProfitPerTap(profit) => self.profit_per_tap = *profit,
            AccountUpdate::ProfitPerHour(profit) => self.profit_per_hour = *profit,
        }
    }
}

/// A point write against one account row. Each variant touches only the
/// columns it names, so two writes of different variants never clobber
/// each other. Values are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountUpdate {
    Accrual { balance: i64, at: DateTime<Utc> },
    EnergyRestore { energy: i64, at: DateTime<Utc> },
    Tap { balance: i64, energy: i64 },
    Balance(i64),
    Slot { slot: Slot, image_ref: Option<String> },
    MaxEnergy(i64),
    ProfitPerTap(i64),
    ProfitPerHour(i64),
}

/// Whole minutes between `since` and `now`; zero if the clock went backwards.
pub fn elapsed_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_minutes().max(0)
}

/// Passive income for `minutes` of elapsed time.
///
/// The hourly rate is truncated to a per-minute rate *before* multiplying.
/// `None` on overflow.
pub fn accrued_profit(profit_per_hour: i64, minutes: i64) -> Option<i64> {
    (profit_per_hour / 60).checked_mul(minutes)
}

/// Energy after regenerating `ticks` points, capped at `max_energy`.
pub fn restored_energy(energy: i64, max_energy: i64, ticks: i64) -> i64 {
    energy + ticks.min(max_energy.saturating_sub(energy))
}

/// Unwraps checked arithmetic on an account column.
pub fn checked(column: &str, value: Option<i64>) -> Result<i64> {
    value.ok_or_else(|| EconomyError::InvalidState(format!("{column} overflow")))
}

pub fn tap_yield(profit_per_tap: i64) -> i64 {
    if profit_per_tap > 0 {
        profit_per_tap
    } else {
        MIN_TAP_YIELD
    }
}
