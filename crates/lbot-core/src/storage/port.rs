use async_trait::async_trait;

use crate::{domain::Page, Result};

/// Persistence backend for saved pages.
///
/// Deduplication is the caller's job: `save` never checks for an existing
/// record, it simply overwrites the one keyed by the same fingerprint.
/// Backends assume a single writer; nothing here is atomic across processes.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn exists(&self, page: &Page) -> Result<bool>;

    async fn save(&self, page: &Page) -> Result<()>;

    /// Uniform pick among the owner's pages. `Error::NotFound` when there are none.
    async fn pick_random(&self, owner: &str) -> Result<Page>;

    /// `Error::NotFound` when the page is not stored.
    async fn remove(&self, page: &Page) -> Result<()>;
}
