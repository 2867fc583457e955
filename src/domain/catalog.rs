use super::clothing::ClothingItem;
use super::worker::{WorkerDefinition, WorkerId, WorkerUpgradeTier};
use crate::error::{EconomyError, Result};
use std::collections::{BTreeMap, HashSet};

/// Static game data: clothing items, workers and their upgrade ladders.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    pub clothes: Vec<ClothingItem>,
    pub workers: Vec<WorkerDefinition>,
    pub tiers: Vec<WorkerUpgradeTier>,
}

impl Catalog {
    /// Ids must be unique per table, since stores upsert by id and a repeat
    /// would silently replace an earlier row. Image references must be unique
    /// too (equipped slots are matched by them), and every ladder must run
    /// `1..=n` for a known worker.
    pub fn validate(&self) -> Result<()> {
        unique_ids("clothing item", self.clothes.iter().map(|item| item.id))?;
        unique_ids("worker", self.workers.iter().map(|worker| worker.id))?;
        unique_ids("worker tier", self.tiers.iter().map(|tier| tier.id))?;

        let mut images = HashSet::new();
        for item in &self.clothes {
            if !images.insert(item.image_ref.as_str()) {
                return Err(EconomyError::ValidationError(format!(
                    "duplicate image reference '{}' (item {})",
                    item.image_ref, item.id
                )));
            }
        }

        let known: HashSet<WorkerId> = self.workers.iter().map(|w| w.id).collect();
        let mut ladders: BTreeMap<WorkerId, Vec<u32>> = BTreeMap::new();
        for tier in &self.tiers {
            if !known.contains(&tier.worker_id) {
                return Err(EconomyError::ValidationError(format!(
                    "tier {} references unknown worker {}",
                    tier.id, tier.worker_id
                )));
            }
            ladders.entry(tier.worker_id).or_default().push(tier.level);
        }

        for (worker, mut levels) in ladders {
            levels.sort_unstable();
            for (expected, level) in (1u32..).zip(&levels) {
                if *level != expected {
                    return Err(EconomyError::ValidationError(format!(
                        "worker {worker} ladder must be contiguous from level 1, found level {level} where {expected} was expected"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn unique_ids(kind: &str, ids: impl Iterator<Item = i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EconomyError::ValidationError(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}
