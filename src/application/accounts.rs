use crate::domain::account::Account;
use crate::domain::ports::AccountStoreRef;
use crate::domain::principal::Principal;
use crate::error::{EconomyError, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Maps an authenticated principal onto its account row.
#[derive(Clone)]
pub struct AccountService {
    accounts: AccountStoreRef,
}

impl AccountService {
    pub fn new(accounts: AccountStoreRef) -> Self {
        Self { accounts }
    }

    /// Returns the principal's account, creating it with default stats on
    /// first contact.
    pub async fn resolve(&self, principal: &Principal, now: DateTime<Utc>) -> Result<Account> {
        if let Some(account) = self.accounts.get_by_external_id(principal.id).await? {
            return Ok(account);
        }

        match self.accounts.create(principal.id, &principal.username, now).await {
            Ok(account) => {
                info!(
                    account = account.id,
                    external_id = principal.id,
                    username = %principal.username,
                    "account created"
                );
                Ok(account)
            }
            // Lost a first-contact race against another request for the same user.
            Err(EconomyError::InvalidState(_)) => self
                .accounts
                .get_by_external_id(principal.id)
                .await?
                .ok_or_else(|| EconomyError::NotFound(format!("account for user {}", principal.id))),
            Err(e) => Err(e),
        }
    }

    /// Re-reads an account by row id.
    pub async fn load(&self, id: i64) -> Result<Account> {
        self.accounts
            .get(id)
            .await?
            .ok_or_else(|| EconomyError::NotFound(format!("account {id}")))
    }
}
