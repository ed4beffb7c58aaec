use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{TokenStore, TOKEN_KEY};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            saved_at: Utc::now(),
        }
    }

    /// Age of the stored token in minutes (for display only, tokens never expire here)
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes().max(0)
    }
}

/// Token store backed by a JSON file in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    /// Load session from disk
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    /// Save session to disk
    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        write_private(&path, &contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match self.load() {
            Ok(data) => data.map(|d| d.token),
            Err(e) => {
                warn!(error = %e, key = TOKEN_KEY, "Unreadable session, treating as signed out");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.save(&SessionData::new(token))?;
        debug!(path = ?self.path(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!(path = ?path, "Session cleared");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert_eq!(store.get(), None);
        store.set("abc").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        FileTokenStore::new(dir.path()).set("persisted").unwrap();

        let reopened = FileTokenStore::new(dir.path());
        assert_eq!(reopened.get().as_deref(), Some("persisted"));
        let data = reopened.load().unwrap().unwrap();
        assert!(data.age_minutes() <= 1);
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.get(), None);
        assert!(store.load().is_err());
        // A new sign-in overwrites the corrupt file
        store.set("fresh").unwrap();
        assert_eq!(store.get().as_deref(), Some("fresh"));
    }
}
