//! Telegram adapter (teloxide).
//!
//! This crate implements the `lbot-core` TransportClient over the Telegram Bot API.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{Update, UpdateKind},
};

use tokio::time::sleep;

use lbot_core::{
    domain::{ChatId, RawChat, RawMessage, RawSender, RawUpdate},
    errors::Error,
    ports::TransportClient,
    Result,
};

/// Slack on top of the long-poll timeout before the HTTP client gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(17);

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    poll_timeout: Duration,
}

impl TelegramTransport {
    /// `poll_timeout` is the `getUpdates` long-poll timeout; zero means short polling.
    pub fn new(token: impl Into<String>, poll_timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(poll_timeout + HTTP_TIMEOUT_SLACK)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            bot: Bot::with_client(token, client),
            poll_timeout,
        })
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }
}

fn map_err(e: teloxide::RequestError) -> Error {
    Error::Transport(format!("telegram error: {e}"))
}

/// Run `op`, retrying once when Telegram answers with flood control.
async fn with_retry<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match e {
                teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(wait = ?d, "telegram flood control, retrying");
                    sleep(d).await;
                    continue;
                }
                other => return Err(map_err(other)),
            },
        }
    }
}

#[async_trait]
impl TransportClient for TelegramTransport {
    async fn fetch_updates(&self, offset: i64, limit: usize) -> Result<Vec<RawUpdate>> {
        let offset = tg_offset(offset)?;
        let limit = u8::try_from(limit.clamp(1, 100)).unwrap_or(100);
        let timeout = u32::try_from(self.poll_timeout.as_secs()).unwrap_or(u32::MAX);

        let updates = with_retry(|| {
            self.bot
                .get_updates()
                .offset(offset)
                .limit(limit)
                .timeout(timeout)
        })
        .await?;

        Ok(updates.iter().map(raw_update).collect())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
        })
        .await?;
        Ok(())
    }

    async fn ack(&self, offset: i64) -> Result<()> {
        let offset = tg_offset(offset)?;
        // A zero-timeout poll at `offset` is how the Bot API confirms earlier updates.
        with_retry(|| self.bot.get_updates().offset(offset).limit(1).timeout(0)).await?;
        tracing::debug!(offset, "updates confirmed");
        Ok(())
    }
}

fn tg_offset(offset: i64) -> Result<i32> {
    i32::try_from(offset)
        .map_err(|_| Error::Transport(format!("update offset out of range: {offset}")))
}

/// Flatten a teloxide update into the shape the core consumes.
///
/// Anything but a plain new message (edits, callbacks, channel posts) carries
/// no message payload.
pub fn raw_update(u: &Update) -> RawUpdate {
    let message = match &u.kind {
        UpdateKind::Message(m) => Some(RawMessage {
            text: m.text().unwrap_or_default().to_string(),
            from: RawSender {
                username: m
                    .from()
                    .and_then(|u| u.username.clone())
                    .unwrap_or_default(),
            },
            chat: RawChat { id: m.chat.id.0 },
        }),
        _ => None,
    };

    RawUpdate {
        id: i64::from(u.id),
        message,
    }
}
