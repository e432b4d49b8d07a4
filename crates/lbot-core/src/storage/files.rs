use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{fs, sync::Mutex};

use crate::{
    domain::Page,
    errors::Error,
    storage::{check_owner, port::PageStore},
    Result,
};

/// Filesystem page store.
///
/// Layout: `<base>/<owner>/<fingerprint>`, one JSON-encoded [`Page`] per file.
/// Writes go through a dot-prefixed temp file and a rename, so a listing never
/// sees a half-written record.
pub struct FsPageStore {
    base: PathBuf,
    rng: Mutex<StdRng>,
}

impl FsPageStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_rng(base, StdRng::from_entropy())
    }

    /// Deterministic picks, for tests and reproducible runs.
    pub fn with_seed(base: impl Into<PathBuf>, seed: u64) -> Self {
        Self::with_rng(base, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base: impl Into<PathBuf>, rng: StdRng) -> Self {
        Self {
            base: base.into(),
            rng: Mutex::new(rng),
        }
    }

    fn owner_dir(&self, owner: &str) -> Result<PathBuf> {
        check_owner(owner)?;
        Ok(self.base.join(owner))
    }

    fn record_path(&self, page: &Page) -> Result<PathBuf> {
        Ok(self.owner_dir(&page.owner)?.join(page.fingerprint()))
    }

    async fn list_records(dir: &Path) -> Result<Vec<String>> {
        let mut rd = match fs::read_dir(dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue; // in-flight temp file
            }
            names.push(name);
        }

        // read_dir order is platform-defined; sort so seeded picks are reproducible.
        names.sort();
        Ok(names)
    }

    async fn decode_page(path: &Path) -> Result<Page> {
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PageStore for FsPageStore {
    async fn exists(&self, page: &Page) -> Result<bool> {
        let path = self.record_path(page)?;
        match fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, page: &Page) -> Result<()> {
        let dir = self.owner_dir(&page.owner)?;
        fs::create_dir_all(&dir).await?;

        let name = page.fingerprint();
        let tmp = dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, serde_json::to_vec(page)?).await?;
        fs::rename(&tmp, dir.join(&name)).await?;

        tracing::debug!(owner = %page.owner, fingerprint = %name, "page saved");
        Ok(())
    }

    async fn pick_random(&self, owner: &str) -> Result<Page> {
        let dir = self.owner_dir(owner)?;
        let names = Self::list_records(&dir).await?;
        if names.is_empty() {
            return Err(Error::NotFound);
        }

        let idx = { self.rng.lock().await.gen_range(0..names.len()) };
        Self::decode_page(&dir.join(&names[idx])).await
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        let path = self.record_path(page)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
