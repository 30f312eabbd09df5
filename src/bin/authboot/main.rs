mod cli;

use crate::cli::{init_logging, Cli, NO_DB_CHECK_FLAG};
use anyhow::{Context, Result};
use authboot::{
    FileStore, InitError, Initializer, KeyValueStore, KeyspaceRoles, KeyspaceScopes, MemoryStore,
    ServiceConfig, StoreLocation,
};
use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_filter.as_deref());
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<InitError>() {
                Some(init) => {
                    error!("bootstrap failed during {}: {init}", init.stage());
                    if let Some(hint) = remedy(init) {
                        error!("{hint}");
                    }
                }
                None => error!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store = store.clone();
    }
    config.validate().context("validate config")?;

    let store = open_store(&config.store_location())?;
    let mut initializer = Initializer::new(
        Arc::clone(&store),
        Arc::new(KeyspaceRoles::new(Arc::clone(&store))),
        Arc::new(KeyspaceScopes::new(Arc::clone(&store))),
        config.initializer_config(cli.no_db_check),
    )
    .with_defaults(config.defaults.clone());

    if cli.inspect {
        let inspection = initializer.inspect().await?;
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let report = initializer.run().await?;
    info!(
        "store ready at version {} (trace: {})",
        config.expected_version,
        report
            .trace
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    Ok(())
}

fn remedy(err: &InitError) -> Option<String> {
    match err {
        InitError::ForeignDatabase(_) => Some(format!(
            "if this store belongs to this service, restart with {NO_DB_CHECK_FLAG}"
        )),
        _ => None,
    }
}

fn open_store(location: &StoreLocation) -> Result<Arc<dyn KeyValueStore>> {
    match location {
        StoreLocation::Memory => {
            info!("using in-memory store; nothing will outlive this process");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreLocation::File(path) => {
            let store = FileStore::open(path)
                .with_context(|| format!("open store {}", path.display()))?;
            info!("using store {}", path.display());
            Ok(Arc::new(store))
        }
    }
}
