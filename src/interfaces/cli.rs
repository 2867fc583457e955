use crate::config::EconomyConfig;
use crate::error::{EconomyError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Idle/tap game economy engine", long_about = None)]
pub struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "IDLECOIN_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory holding clothes.csv, workers.csv and worker_tiers.csv.
    #[arg(long, env = "IDLECOIN_CATALOG", default_value = "catalog")]
    pub catalog: PathBuf,

    /// Signed Telegram WebApp init data identifying the caller.
    #[arg(long, env = "IDLECOIN_INIT_DATA")]
    pub init_data: Option<String>,

    /// Bot token the init data signature is checked against.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Deadline for account fetches, in milliseconds.
    #[arg(long, env = "IDLECOIN_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Log filter, e.g. `info` or `idlecoin=debug`.
    #[arg(long, env = "IDLECOIN_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the caller's account after accrual.
    Account,
    /// Tap once.
    Tap,
    /// Browse, buy and equip clothing.
    #[command(subcommand)]
    Clothes(ClothesCommand),
    /// Browse and upgrade workers.
    #[command(subcommand)]
    Workers(WorkersCommand),
    /// The shared counter.
    #[command(subcommand)]
    Counter(CounterCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClothesCommand {
    List,
    Show { id: i64 },
    Buy { id: i64 },
    Equip { id: i64 },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WorkersCommand {
    /// List workers of one category (`worker` or `army`).
    List { category: String },
    Upgrade { id: i64 },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CounterCommand {
    Get,
    Increment,
    Double,
    Add {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
}

impl Command {
    /// Whether the command acts on behalf of an authenticated user.
    pub fn needs_principal(&self) -> bool {
        !matches!(self, Command::Counter(_))
    }
}

impl TryFrom<&Cli> for EconomyConfig {
    type Error = EconomyError;

    fn try_from(cli: &Cli) -> Result<Self> {
        if cli.timeout_ms == 0 {
            return Err(EconomyError::ValidationError(
                "timeout must be greater than zero".into(),
            ));
        }
        let bot_token = cli.bot_token.clone().filter(|token| !token.trim().is_empty());
        let init_data = cli.init_data.clone().filter(|data| !data.is_empty());

        Ok(Self {
            db_path: cli.db_path.clone(),
            catalog_dir: cli.catalog.clone(),
            bot_token,
            init_data,
            request_timeout: Duration::from_millis(cli.timeout_ms),
            log_filter: cli.log.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("idlecoin").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parses_nested_subcommand() {
        let cli = Cli::try_parse_from(["idlecoin", "--init-data", "x", "clothes", "buy", "3"]).unwrap();
        assert_eq!(cli.command, Command::Clothes(ClothesCommand::Buy { id: 3 }));
        assert_eq!(cli.init_data.as_deref(), Some("x"));
        assert!(cli.command.needs_principal());
    }

    #[test]
    fn test_counter_add_accepts_negative_delta() {
        let cli = Cli::try_parse_from(["idlecoin", "counter", "add", "-8"]).unwrap();
        assert_eq!(cli.command, Command::Counter(CounterCommand::Add { delta: -8 }));
        assert!(!cli.command.needs_principal());
    }

    #[test]
    fn test_config_defaults() {
        let config = EconomyConfig::try_from(&parse(&["--bot-token", "t", "tap"])).unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.catalog_dir, PathBuf::from("catalog"));
        assert_eq!(config.require_bot_token().unwrap(), "t");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = EconomyConfig::try_from(&parse(&["--timeout-ms", "0", "tap"]));
        assert!(matches!(result, Err(EconomyError::ValidationError(_))));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let config = EconomyConfig::try_from(&parse(&["--bot-token", "  ", "tap"])).unwrap();
        assert!(matches!(
            config.require_bot_token(),
            Err(EconomyError::ValidationError(_))
        ));
        assert!(matches!(
            config.require_init_data(),
            Err(EconomyError::Unauthorized(_))
        ));
    }
}
