use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use lbot_core::{
    config::{Config, StorageKind},
    consumer::Consumer,
    processor::EventProcessor,
    storage::{FsPageStore, MemoryPageStore, PageStore},
};
use lbot_telegram::TelegramTransport;

mod cli;

fn open_store(cfg: &Config) -> Arc<dyn PageStore> {
    match (cfg.storage, cfg.random_seed) {
        (StorageKind::Files, Some(seed)) => {
            Arc::new(FsPageStore::with_seed(cfg.storage_path.clone(), seed))
        }
        (StorageKind::Files, None) => Arc::new(FsPageStore::new(cfg.storage_path.clone())),
        (StorageKind::Memory, Some(seed)) => Arc::new(MemoryPageStore::with_seed(seed)),
        (StorageKind::Memory, None) => Arc::new(MemoryPageStore::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lbot_core::logging::init("lbot")?;

    let cfg = match cli::Cli::parse().apply(Config::from_env()?).and_then(Config::validate) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    let transport = Arc::new(TelegramTransport::new(
        cfg.telegram_bot_token.clone(),
        cfg.poll_timeout,
    )?);
    let processor = Arc::new(EventProcessor::new(transport, open_store(&cfg)));

    let consumer = Consumer::new(processor.clone(), processor, cfg.batch_size)
        .with_idle_interval(cfg.idle_interval);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for ctrl-c, running until killed"),
        }
    });

    tracing::info!(
        storage = ?cfg.storage,
        path = %cfg.storage_path.display(),
        "service started"
    );
    consumer.run(cancel).await;

    Ok(())
}
