use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::Mutex;

use crate::{
    domain::Page,
    errors::Error,
    storage::{check_owner, port::PageStore},
    Result,
};

#[derive(Default)]
struct MemoryState {
    // owner -> fingerprint -> page
    pages: HashMap<String, BTreeMap<String, Page>>,
}

/// Process-local page store. Nothing survives a restart.
pub struct MemoryPageStore {
    state: Mutex<MemoryState>,
    rng: Mutex<StdRng>,
}

impl Default for MemoryPageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            rng: Mutex::new(rng),
        }
    }

    pub async fn count(&self, owner: &str) -> usize {
        let st = self.state.lock().await;
        st.pages.get(owner).map(|m| m.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn exists(&self, page: &Page) -> Result<bool> {
        check_owner(&page.owner)?;
        let st = self.state.lock().await;
        Ok(st
            .pages
            .get(&page.owner)
            .is_some_and(|m| m.contains_key(&page.fingerprint())))
    }

    async fn save(&self, page: &Page) -> Result<()> {
        check_owner(&page.owner)?;
        let mut st = self.state.lock().await;
        st.pages
            .entry(page.owner.clone())
            .or_default()
            .insert(page.fingerprint(), page.clone());
        Ok(())
    }

    async fn pick_random(&self, owner: &str) -> Result<Page> {
        check_owner(owner)?;
        let st = self.state.lock().await;
        let Some(pages) = st.pages.get(owner).filter(|m| !m.is_empty()) else {
            return Err(Error::NotFound);
        };

        let idx = { self.rng.lock().await.gen_range(0..pages.len()) };
        pages.values().nth(idx).cloned().ok_or(Error::NotFound)
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        check_owner(&page.owner)?;
        let mut st = self.state.lock().await;
        st.pages
            .get_mut(&page.owner)
            .and_then(|m| m.remove(&page.fingerprint()))
            .map(|_| ())
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn behaves_like_a_page_store() {
        let s = MemoryPageStore::with_seed(1);
        let page = Page::new("http://example.com/a", "alice");

        assert!(s.pick_random("alice").await.unwrap_err().is_not_found());
        assert!(!s.exists(&page).await.unwrap());

        s.save(&page).await.unwrap();
        s.save(&page).await.unwrap();
        assert_eq!(s.count("alice").await, 1);
        assert!(s.exists(&page).await.unwrap());

        assert_eq!(s.pick_random("alice").await.unwrap(), page);
        s.remove(&page).await.unwrap();
        assert!(s.remove(&page).await.unwrap_err().is_not_found());
        assert!(s.pick_random("alice").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn rejects_the_same_owner_names_as_the_filesystem_store() {
        let s = MemoryPageStore::with_seed(1);

        for owner in ["", "..", "../x", "a/b"] {
            let err = s.save(&Page::new("http://example.com", owner)).await;
            assert!(matches!(err, Err(Error::Storage(_))), "owner {owner:?}");
            assert!(matches!(s.pick_random(owner).await, Err(Error::Storage(_))));
        }
        assert_eq!(s.count("").await, 0);
    }
}
