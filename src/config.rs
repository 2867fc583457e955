//! Runtime configuration. Built from the command line by the CLI adapter.

use crate::error::{EconomyError, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyConfig {
    pub db_path: Option<PathBuf>,
    pub catalog_dir: PathBuf,
    pub bot_token: Option<String>,
    pub init_data: Option<String>,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl EconomyConfig {
    /// The bot token, required by every command that authenticates a caller.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.bot_token.as_deref().ok_or_else(|| {
            EconomyError::ValidationError("TELEGRAM_BOT_TOKEN is not set".into())
        })
    }

    pub fn require_init_data(&self) -> Result<&str> {
        self.init_data
            .as_deref()
            .ok_or_else(|| EconomyError::Unauthorized("init data not provided".into()))
    }
}
