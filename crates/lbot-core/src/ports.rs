use async_trait::async_trait;

use crate::{
    domain::{ChatId, Event, RawUpdate},
    Result,
};

/// Hexagonal port for the remote messaging API.
///
/// Telegram is the only implementation today (`lbot-telegram`). Updates are
/// returned in ascending id order; ids are treated as opaque but ordered.
#[async_trait]
pub trait TransportClient: Send + Sync {
    async fn fetch_updates(&self, offset: i64, limit: usize) -> Result<Vec<RawUpdate>>;

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Confirm every update below `offset` without waiting for new ones.
    async fn ack(&self, offset: i64) -> Result<()>;
}

/// Source side of the consumer loop.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Pull up to `limit` events. An empty batch means "nothing new".
    async fn fetch(&self, limit: usize) -> Result<Vec<Event>>;

    /// Tell the source everything fetched so far has been handled.
    /// Called once when the consumer loop stops.
    async fn commit(&self) -> Result<()> {
        Ok(())
    }
}

/// Sink side of the consumer loop.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, event: Event) -> Result<()>;
}
