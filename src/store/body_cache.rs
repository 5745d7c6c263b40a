use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::app::{Result, TributaryError};

/// Last-known raw feed body per URL, one file each.
///
/// Files are named after the SHA-256 of the URL and replaced wholesale on
/// every write.
#[derive(Debug, Clone)]
pub struct BodyCache {
    dir: PathBuf,
}

impl BodyCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{}.feed", hex::encode(hasher.finalize())))
    }

    /// Reads the cached body for `url`.
    pub async fn open(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.path_for(url);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TributaryError::FeedParse(format!("no cached body for {url}"))
            } else {
                TributaryError::Io(e)
            }
        })
    }

    /// Replaces the cached body for `url`. The new body is written to a
    /// sibling temp file first so readers never see a partial write.
    pub async fn write(&self, url: &str, body: &[u8]) -> Result<()> {
        let path = self.path_for(url);
        let tmp = path.with_extension("feed.tmp");
        let persist = |e: std::io::Error| {
            TributaryError::Persistence(format!("failed to cache body for {url}: {e}"))
        };
        tokio::fs::write(&tmp, body).await.map_err(persist)?;
        tokio::fs::rename(&tmp, &path).await.map_err(persist)?;
        Ok(())
    }
}
