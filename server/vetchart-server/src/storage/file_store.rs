use std::io;
use std::path::{Path, PathBuf};

use database_layer::UPLOAD_LOCATOR_PREFIX;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Extensions longer than this are dropped rather than trusted
const MAX_EXTENSION_CHARS: usize = 10;

/// Where a stored blob can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub url: String,
    pub key: String,
}

/// Flat directory of uploaded blobs, each under a fresh random name
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if needed
    pub async fn initialize(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!(path = %self.root.display(), "File store ready");
        Ok(())
    }

    /// Write `data` as `<uuid-hex><ext>`, keeping the extension of `original_name`
    pub async fn save(&self, data: &[u8], original_name: &str) -> io::Result<StoredFile> {
        let key = format!("{}{}", Uuid::new_v4().simple(), safe_extension(original_name));
        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(&key), data).await?;

        debug!(key = %key, size = data.len(), "Stored upload");
        Ok(StoredFile {
            url: format!("{}{}", UPLOAD_LOCATOR_PREFIX, key),
            key,
        })
    }

    /// Remove uploads whose owning entity was never stored; failures are only logged
    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            match fs::remove_file(self.root.join(&file.key)).await {
                Ok(()) => debug!(key = %file.key, "Discarded upload"),
                Err(e) => warn!(key = %file.key, error = %e, "Failed to discard upload"),
            }
        }
    }
}

/// Lower-cased `.ext` of the file name, or nothing if it looks unusual
fn safe_extension(filename: &str) -> String {
    let Some((stem, ext)) = filename.rsplit_once('.') else {
        return String::new();
    };
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_CHARS
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return String::new();
    }
    format!(".{}", ext.to_ascii_lowercase())
}
