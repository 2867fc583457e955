use clap::Parser;
use idlecoin::application::engine::EconomyEngine;
use idlecoin::config::EconomyConfig;
use idlecoin::domain::ports::Stores;
use idlecoin::domain::principal::Principal;
use idlecoin::domain::worker::WorkerCategory;
use idlecoin::error::EconomyError;
use idlecoin::infrastructure::clock::SystemClock;
use idlecoin::infrastructure::in_memory::in_memory_stores;
use idlecoin::interfaces::cli::{Cli, ClothesCommand, Command, CounterCommand, WorkersCommand};
use idlecoin::interfaces::csv::catalog_reader;
use idlecoin::interfaces::telegram::TelegramAuthenticator;
use idlecoin::telemetry;
use miette::{IntoDiagnostic, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EconomyConfig::try_from(&cli)?;
    let _telemetry = telemetry::init(&config.log_filter)?;

    let engine = EconomyEngine::new(open_stores(&config)?, Arc::new(SystemClock), config.request_timeout);

    let catalog = catalog_reader::load_dir(&config.catalog_dir)?;
    engine.seed(&catalog).await?;

    let principal = if cli.command.needs_principal() {
        Some(authenticate(&config)?)
    } else {
        None
    };

    let result = run(&engine, cli.command, principal.as_ref()).await;
    // Detached work has to land before the runtime goes away, even on failure.
    engine.shutdown().await;

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    Ok(())
}

fn open_stores(config: &EconomyConfig) -> Result<Stores> {
    let Some(db_path) = &config.db_path else {
        return Ok(in_memory_stores());
    };

    #[cfg(feature = "storage-rocksdb")]
    {
        let store = idlecoin::infrastructure::rocksdb::RocksDBStore::open(db_path)?;
        info!(path = %db_path.display(), "using RocksDB storage");
        Ok(store.stores())
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    {
        tracing::warn!(
            path = %db_path.display(),
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
        Ok(in_memory_stores())
    }
}

fn authenticate(config: &EconomyConfig) -> Result<Principal> {
    let authenticator = TelegramAuthenticator::new(config.require_bot_token()?)?;
    let principal = authenticator.authenticate(config.require_init_data()?)?;
    info!(user = principal.id, "caller authenticated");
    Ok(principal)
}

async fn run(engine: &EconomyEngine, command: Command, principal: Option<&Principal>) -> Result<Value> {
    let caller = || principal.ok_or_else(|| EconomyError::Unauthorized("no caller".into()));

    let value = match command {
        Command::Account => to_json(engine.fetch_account(caller()?).await?)?,
        Command::Tap => to_json(engine.tap(caller()?).await?)?,
        Command::Clothes(ClothesCommand::List) => to_json(engine.list_clothes(caller()?).await?)?,
        Command::Clothes(ClothesCommand::Show { id }) => {
            to_json(engine.clothing_detail(caller()?, id).await?)?
        }
        Command::Clothes(ClothesCommand::Buy { id }) => {
            to_json(engine.buy_clothing(caller()?, id).await?)?
        }
        Command::Clothes(ClothesCommand::Equip { id }) => {
            to_json(engine.equip_clothing(caller()?, id).await?)?
        }
        Command::Workers(WorkersCommand::List { category }) => {
            let category: WorkerCategory = category.parse().map_err(EconomyError::ValidationError)?;
            to_json(engine.list_workers(caller()?, category).await?)?
        }
        Command::Workers(WorkersCommand::Upgrade { id }) => {
            to_json(engine.upgrade_worker(caller()?, id).await?)?
        }
        Command::Counter(CounterCommand::Get) => json!({ "value": engine.counter_get().await? }),
        Command::Counter(CounterCommand::Increment) => {
            engine.counter_increment();
            json!({ "status": "scheduled" })
        }
        Command::Counter(CounterCommand::Double) => to_json(engine.counter_double().await?)?,
        Command::Counter(CounterCommand::Add { delta }) => to_json(engine.counter_add(delta).await?)?,
    };
    Ok(value)
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).into_diagnostic()
}
