use super::account::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type WorkerId = i64;
pub type TierId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerCategory {
    Worker,
    Army,
}

impl WorkerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerCategory::Worker => "worker",
            WorkerCategory::Army => "army",
        }
    }
}

impl fmt::Display for WorkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "worker" => Ok(WorkerCategory::Worker),
            "army" => Ok(WorkerCategory::Army),
            other => Err(format!("unknown worker category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDefinition {
    pub id: WorkerId,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    pub category: WorkerCategory,
}

/// One rung of a worker's upgrade ladder. Levels start at 1 without gaps;
/// the first missing level marks the top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerUpgradeTier {
    pub id: TierId,
    pub worker_id: WorkerId,
    pub level: u32,
    pub cost: i64,
    pub profit_per_hour: i64,
}

/// Links an account to the tier it currently holds for one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerOwnership {
    pub id: i64,
    pub account_id: AccountId,
    pub worker_id: WorkerId,
    pub tier_id: TierId,
}
