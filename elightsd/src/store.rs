//! Flat string key-value persistence.
//!
//! Each key is a file under `<root>/<namespace>/`; values are written to
//! a temporary file and renamed into place so a crash never leaves a
//! half-written value behind.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Namespace holding all of this application's keys.
pub const APP_NAMESPACE: &str = "elights";

#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open (creating if necessary) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, namespace: &str) -> Result<Self> {
        let dir = root.into().join(namespace);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create store directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Read a value. Any failure (missing key, unreadable file) reads as
    /// `None`; callers fall back to defaults.
    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    /// Write a value atomically.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.dir.join(key);
        let tmp = self.dir.join(format!("{key}.tmp"));
        fs::write(&tmp, value)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to rename {} into place", tmp.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path(), APP_NAMESPACE).unwrap();

        store.set("light_groups", "kitchen|SN1,SN2;").unwrap();
        assert_eq!(
            store.get("light_groups").as_deref(),
            Some("kitchen|SN1,SN2;")
        );

        // Overwrite.
        store.set("light_groups", "office|SN3;").unwrap();
        assert_eq!(store.get("light_groups").as_deref(), Some("office|SN3;"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path(), APP_NAMESPACE).unwrap();
        assert_eq!(store.get("WIFI_SSID"), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = KvStore::open(dir.path(), APP_NAMESPACE).unwrap();
            store.set("MDNS_HOSTNAME", "custom.local").unwrap();
        }
        let store = KvStore::open(dir.path(), APP_NAMESPACE).unwrap();
        assert_eq!(store.get("MDNS_HOSTNAME").as_deref(), Some("custom.local"));
    }
}
