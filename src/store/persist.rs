//! Store persistence
//!
//! The store is written as one JSON document. Before each save the previous
//! file is renamed to a timestamped backup so no generation is overwritten.

use super::Store;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors saving the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The previous store file could not be moved aside
    #[error("Failed to back up {from:?} to {to:?}: {source}")]
    Backup {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// The store file could not be written
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The store could not be encoded
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Store {
    /// Load a store from `path`.
    ///
    /// A missing, unreadable or unparsable file yields an empty store: a first
    /// run and a corrupt file both start from scratch.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::info!(path = ?path, error = %e, "No readable store, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Store file unparsable, starting empty");
                Self::new()
            }
        }
    }

    /// Save the store to `path`, backing up any existing file first.
    ///
    /// Returns the backup path when a previous generation was moved aside.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<Option<PathBuf>, StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self)?;

        let backup = if path.exists() {
            let to = unused_backup_path(path, Utc::now().timestamp());
            std::fs::rename(path, &to).map_err(|source| StoreError::Backup {
                from: path.to_path_buf(),
                to: to.clone(),
                source,
            })?;
            tracing::debug!(backup = ?to, "Previous store backed up");
            Some(to)
        } else {
            None
        };

        std::fs::write(path, json).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = ?path,
            fixtures = self.fixture_count(),
            "Store saved"
        );

        Ok(backup)
    }
}

/// `<stem>_<unixtime>.<ext>` next to the store file, or
/// `<stem>_<unixtime>_<n>.<ext>` with a sequence number
pub(crate) fn backup_path(path: &Path, unix_time: i64, sequence: Option<u32>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tag = match sequence {
        Some(n) => format!("{}_{}", unix_time, n),
        None => unix_time.to_string(),
    };

    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}_{}", stem, tag),
    };

    path.with_file_name(name)
}

/// First backup path for `unix_time` that does not exist yet
fn unused_backup_path(path: &Path, unix_time: i64) -> PathBuf {
    let mut candidate = backup_path(path, unix_time, None);
    let mut sequence = 1;
    while candidate.exists() {
        candidate = backup_path(path, unix_time, Some(sequence));
        sequence += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Event;
    use crate::store::tests::price;
    use crate::store::FixturePrices;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_store() -> Store {
        let mut fixture = FixturePrices::scheduled(&Event {
            id: "fixture1".to_string(),
            name: "Mainz v Dortmund".to_string(),
            country_code: Some("DE".to_string()),
            timezone: Some("GMT".to_string()),
            open_date: Utc.with_ymd_and_hms(2022, 4, 6, 16, 30, 0).unwrap(),
        });
        fixture.bind_market("1.195693926", 64374, 44785);
        fixture.record(64374, price(dec!(3.7), dec!(3.75)));
        fixture.record(64374, price(dec!(3.75), dec!(3.8)));
        fixture.record(44785, price(dec!(2.86), dec!(2.9)));

        let mut store = Store::new();
        store.insert_if_absent("league1", fixture);
        store
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = sample_store();

        let backup = store.save(&path).unwrap();
        assert!(backup.is_none());

        let loaded = Store::load(&path);
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::load(temp_dir.path().join("store.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, r#"{"league1": {"fixture1": "#).unwrap();

        let store = Store::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_backs_up_previous_generation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{}").unwrap();

        let backup = sample_store().save(&path).unwrap().unwrap();

        assert!(backup.exists());
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{}");
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("store_"));
        assert!(name.ends_with(".json"));
        assert_eq!(Store::load(&path).fixture_count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("store.json");

        let result = sample_store().save(&path);
        assert!(matches!(result, Err(StoreError::Write { .. })));
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/data/store.json"), 1649262600, None),
            PathBuf::from("/data/store_1649262600.json")
        );
        assert_eq!(
            backup_path(Path::new("/data/store.json"), 1649262600, Some(2)),
            PathBuf::from("/data/store_1649262600_2.json")
        );
        assert_eq!(
            backup_path(Path::new("store"), 42, None),
            PathBuf::from("store_42")
        );
    }

    #[test]
    fn test_unused_backup_path_skips_taken_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        assert_eq!(
            unused_backup_path(&path, 42),
            temp_dir.path().join("store_42.json")
        );

        std::fs::write(temp_dir.path().join("store_42.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("store_42_1.json"), "{}").unwrap();
        assert_eq!(
            unused_backup_path(&path, 42),
            temp_dir.path().join("store_42_2.json")
        );
    }

    #[test]
    fn test_saves_within_one_second_keep_every_generation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "gen0").unwrap();

        let store = sample_store();
        let first = store.save(&path).unwrap().unwrap();
        let second = store.save(&path).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "gen0");
        assert_eq!(Store::load(&second), store);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 3);
    }
}
