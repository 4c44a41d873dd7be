//! File Store Module
//!
//! Directory-backed `KvStore` that survives process restarts. Each key lives
//! in its own file named after the percent-encoded key. Keys whose encoded
//! form does not fit in a file name are stored under a readable prefix plus
//! the SHA-256 of the key.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cache::KvStore;
use crate::error::StoreError;

const FILE_EXTENSION: &str = "json";

/// Longest file name most filesystems accept.
const MAX_FILE_NAME_BYTES: usize = 255;

/// Encoded-key bytes kept in front of the digest for hashed names.
const HASHED_PREFIX_BYTES: usize = 64;

// == File Store ==
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    // == Constructor ==
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    /// Directory holding the entry files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name_for(key))
    }
}

// "." and ".." survive encoding, the extension keeps them ordinary names.
// Encoded keys never contain '+', so hashed names cannot clash with plain ones.
fn file_name_for(key: &str) -> String {
    let encoded = urlencoding::encode(key);
    if encoded.len() + FILE_EXTENSION.len() + 1 <= MAX_FILE_NAME_BYTES {
        return format!("{}.{}", encoded, FILE_EXTENSION);
    }

    // Encoded output is ASCII, any byte offset is a char boundary
    let prefix = &encoded[..HASHED_PREFIX_BYTES];
    let digest = Sha256::digest(key.as_bytes());
    format!("{}+{:x}.{}", prefix, digest, FILE_EXTENSION)
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Unique temp file per write, dropped (and removed) on any failure
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.path_for(key))
            .map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MAX_KEY_LENGTH;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_read_write_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.read("partners_all").unwrap(), None);

        store.write("partners_all", r#"{"data":[],"timestamp":1}"#).unwrap();
        assert_eq!(
            store.read("partners_all").unwrap(),
            Some(r#"{"data":[],"timestamp":1}"#.to_string())
        );

        store.delete("partners_all").unwrap();
        assert_eq!(store.read("partners_all").unwrap(), None);
    }

    #[test]
    fn test_file_store_delete_absent_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.delete("never_written").is_ok());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();

        FileStore::open(dir.path())
            .unwrap()
            .write("events_upcoming", "payload")
            .unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.read("events_upcoming").unwrap(),
            Some("payload".to_string())
        );
    }

    #[test]
    fn test_file_store_awkward_keys_stay_inside_root() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        for key in ["../escape", "a/b", ".", "..", "lecturers_department-électronique"] {
            store.write(key, key).unwrap();
            assert_eq!(store.read(key).unwrap(), Some(key.to_string()));
        }

        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 5);
    }

    #[test]
    fn test_file_store_keys_at_max_length() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let ascii = "k".repeat(MAX_KEY_LENGTH);
        let ascii_twin = format!("{}j", "k".repeat(MAX_KEY_LENGTH - 1));
        let accented = "é".repeat(MAX_KEY_LENGTH / 2);

        for key in [&ascii, &ascii_twin, &accented] {
            store.write(key, key).unwrap();
        }
        for key in [&ascii, &ascii_twin, &accented] {
            assert_eq!(store.read(key).unwrap(), Some(key.to_string()));
        }

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(name.len() <= MAX_FILE_NAME_BYTES);
        }

        store.delete(&ascii).unwrap();
        assert_eq!(store.read(&ascii).unwrap(), None);
        assert_eq!(store.read(&ascii_twin).unwrap(), Some(ascii_twin.clone()));
    }

    #[test]
    fn test_file_name_switches_to_digest_only_when_needed() {
        let short = file_name_for("partners_all");
        assert_eq!(short, "partners_all.json");

        let fits = "k".repeat(MAX_FILE_NAME_BYTES - 5);
        assert_eq!(file_name_for(&fits), format!("{}.json", fits));

        let long = "k".repeat(MAX_FILE_NAME_BYTES - 4);
        let hashed = file_name_for(&long);
        assert!(hashed.contains('+'));
        assert!(hashed.len() <= MAX_FILE_NAME_BYTES);
        assert_eq!(hashed, file_name_for(&long));
    }

    #[test]
    fn test_concurrent_writes_to_one_key_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|n| {
                    let store = &store;
                    scope.spawn(move || {
                        for _ in 0..20 {
                            store.write("events_all", &n.to_string())?;
                        }
                        Ok::<_, StoreError>(())
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });

        let stored: u32 = store.read("events_all").unwrap().unwrap().parse().unwrap();
        assert!(stored < 8);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_store_creates_nested_root() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = FileStore::open(&nested).unwrap();
        assert_eq!(store.root(), nested.as_path());
        assert!(nested.is_dir());
    }
}
