use serde::{Deserialize, Serialize};

/// Trusted caller identity produced by the authentication collaborator.
/// `id` becomes the account's external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    #[serde(default)]
    pub username: String,
}
