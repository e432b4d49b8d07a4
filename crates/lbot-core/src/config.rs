use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Hard cap of the Bot API `getUpdates` limit parameter.
pub const MAX_BATCH_SIZE: usize = 100;

/// Which page store backend to run with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Files,
    Memory,
}

/// Typed runtime configuration.
///
/// Loaded from the environment (and an optional `.env` file); the binary
/// layers CLI flags on top before calling [`Config::validate`].
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub storage: StorageKind,
    pub storage_path: PathBuf,
    pub batch_size: usize,
    pub idle_interval: Duration,
    pub poll_timeout: Duration,
    pub random_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            storage: StorageKind::Files,
            storage_path: PathBuf::from("storage"),
            batch_size: MAX_BATCH_SIZE,
            idle_interval: Duration::from_secs(1),
            poll_timeout: Duration::ZERO,
            random_seed: None,
        }
    }
}

impl Config {
    /// Read `.env` (if present) and the `LBOT_*` / `TELEGRAM_BOT_TOKEN` variables.
    ///
    /// Does not validate; a missing token is only an error once CLI flags had
    /// their chance to supply it.
    pub fn from_env() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let defaults = Self::default();

        let storage = match env_str("LBOT_STORAGE").and_then(non_empty) {
            None => defaults.storage,
            Some(s) => parse_storage_kind(&s)?,
        };

        Ok(Self {
            telegram_bot_token: env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            storage,
            storage_path: env_path("LBOT_STORAGE_PATH").unwrap_or(defaults.storage_path),
            batch_size: env_usize("LBOT_BATCH_SIZE").unwrap_or(defaults.batch_size),
            idle_interval: env_u64("LBOT_IDLE_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.idle_interval),
            poll_timeout: env_u64("LBOT_POLL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_timeout),
            random_seed: env_u64("LBOT_RANDOM_SEED"),
        })
    }

    /// Check required values and clamp the batch size into `1..=100`.
    pub fn validate(mut self) -> Result<Self> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "bot token is required (--token or TELEGRAM_BOT_TOKEN)".to_string(),
            ));
        }
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
        Ok(self)
    }
}

pub fn parse_storage_kind(s: &str) -> Result<StorageKind> {
    match s.trim().to_lowercase().as_str() {
        "files" | "fs" => Ok(StorageKind::Files),
        "memory" | "mem" => Ok(StorageKind::Memory),
        other => Err(Error::Config(format!("unknown storage backend: {other}"))),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
