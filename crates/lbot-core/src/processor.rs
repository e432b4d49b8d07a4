//! Telegram-shaped event processor.
//!
//! Owns the update cursor, turns raw updates into [`Event`]s and runs the bot
//! commands against a [`PageStore`]. Implements both [`Fetcher`] and
//! [`Processor`] so one instance can feed and drain the consumer loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    commands::Command,
    domain::{ChatId, Event, EventKind, Page},
    errors::Error,
    messages,
    ports::{Fetcher, Processor, TransportClient},
    storage::PageStore,
    Result,
};

pub struct EventProcessor {
    transport: Arc<dyn TransportClient>,
    store: Arc<dyn PageStore>,
    cursor: Mutex<i64>,
}

impl EventProcessor {
    pub fn new(transport: Arc<dyn TransportClient>, store: Arc<dyn PageStore>) -> Self {
        Self {
            transport,
            store,
            cursor: Mutex::new(0),
        }
    }

    /// Offset the next fetch will start from.
    pub async fn cursor(&self) -> i64 {
        *self.cursor.lock().await
    }

    async fn process_message(&self, event: Event) -> Result<()> {
        let meta = event.meta.ok_or(Error::MalformedMeta)?;
        self.do_cmd(&event.text, meta.chat_id, &meta.username).await
    }

    async fn do_cmd(&self, text: &str, chat_id: ChatId, username: &str) -> Result<()> {
        let text = text.trim();
        tracing::info!(command = %text, username = %username, chat_id = chat_id.0, "got command");

        let cmd = Command::parse(text);
        if username.is_empty() && matches!(cmd, Command::AddPage(_) | Command::Random) {
            self.transport
                .send_message(chat_id, messages::NO_USERNAME)
                .await?;
            return Err(Error::MalformedMeta);
        }

        match cmd {
            Command::AddPage(url) => self.save_page(chat_id, url, username).await,
            Command::Random => self.send_random(chat_id, username).await,
            Command::Help => self.transport.send_message(chat_id, messages::HELP).await,
            Command::Start => {
                self.transport
                    .send_message(chat_id, &messages::hello())
                    .await
            }
            Command::Unknown => {
                self.transport
                    .send_message(chat_id, messages::UNKNOWN_COMMAND)
                    .await
            }
        }
    }

    async fn save_page(&self, chat_id: ChatId, url: String, username: &str) -> Result<()> {
        let page = Page::new(url, username);

        if self.store.exists(&page).await? {
            return self
                .transport
                .send_message(chat_id, messages::ALREADY_EXISTS)
                .await;
        }

        self.store.save(&page).await?;
        self.transport.send_message(chat_id, messages::SAVED).await
    }

    /// Draw a page and hand it to the user. The page is removed only after the
    /// send succeeded; a failed send leaves it for a later `/rnd`.
    async fn send_random(&self, chat_id: ChatId, username: &str) -> Result<()> {
        let page = match self.store.pick_random(username).await {
            Ok(page) => page,
            Err(Error::NotFound) => {
                self.transport
                    .send_message(chat_id, messages::NO_SAVED_PAGES)
                    .await?;
                return Err(Error::NotFound);
            }
            Err(e) => return Err(e),
        };

        self.transport.send_message(chat_id, &page.url).await?;
        self.store.remove(&page).await
    }
}

#[async_trait]
impl Fetcher for EventProcessor {
    async fn fetch(&self, limit: usize) -> Result<Vec<Event>> {
        // Held across the remote call so concurrent fetches cannot reuse an offset.
        let mut cursor = self.cursor.lock().await;

        let updates = self.transport.fetch_updates(*cursor, limit).await?;
        let Some(last_id) = updates.iter().map(|u| u.id).max() else {
            return Ok(Vec::new());
        };

        *cursor = (*cursor).max(last_id + 1);
        Ok(updates.into_iter().map(Event::from).collect())
    }

    /// Updates below the cursor stay pending on the server until a request
    /// carries a higher offset, so confirm them before going away.
    async fn commit(&self) -> Result<()> {
        let cursor = self.cursor.lock().await;
        if *cursor == 0 {
            return Ok(());
        }
        self.transport.ack(*cursor).await
    }
}

#[async_trait]
impl Processor for EventProcessor {
    async fn process(&self, event: Event) -> Result<()> {
        match event.kind {
            EventKind::Message => self.process_message(event).await,
            EventKind::Unknown => Err(Error::UnknownEventKind),
        }
    }
}
