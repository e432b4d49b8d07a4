//! Content-addressed page storage.
//!
//! Pages are grouped per owner and keyed by [`Page::fingerprint`], which makes
//! `save` idempotent and `exists` a single lookup.
//!
//! [`Page::fingerprint`]: crate::domain::Page::fingerprint

pub mod files;
pub mod memory;
pub mod port;

pub use files::FsPageStore;
pub use memory::MemoryPageStore;
pub use port::PageStore;

use std::io;

use crate::{errors::Error, Result};

/// Owner names become path components in [`FsPageStore`]; every backend
/// rejects the same set.
pub(crate) fn check_owner(owner: &str) -> Result<()> {
    if owner.is_empty() || owner.starts_with('.') || owner.contains(['/', '\\']) {
        return Err(Error::Storage(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid owner name: {owner:?}"),
        )));
    }
    Ok(())
}
