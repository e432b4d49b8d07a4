use std::path::PathBuf;

use clap::Parser;

use lbot_core::{
    config::{parse_storage_kind, Config},
    Result,
};

/// Telegram bot that keeps a reading list of links per user.
#[derive(Debug, Parser)]
#[command(name = "lbot", version)]
pub struct Cli {
    /// Telegram bot token (falls back to TELEGRAM_BOT_TOKEN).
    #[arg(long)]
    pub token: Option<String>,

    /// Directory holding saved pages (falls back to LBOT_STORAGE_PATH).
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Page store backend: `files` or `memory` (falls back to LBOT_STORAGE).
    #[arg(long)]
    pub storage: Option<String>,

    /// Updates requested per poll, 1..=100 (falls back to LBOT_BATCH_SIZE).
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl Cli {
    /// Layer flags over environment-derived config. Flags win.
    pub fn apply(self, mut cfg: Config) -> Result<Config> {
        if let Some(token) = self.token {
            cfg.telegram_bot_token = token;
        }
        if let Some(path) = self.storage_path {
            cfg.storage_path = path;
        }
        if let Some(kind) = self.storage {
            cfg.storage = parse_storage_kind(&kind)?;
        }
        if let Some(n) = self.batch_size {
            cfg.batch_size = n;
        }
        Ok(cfg)
    }
}
