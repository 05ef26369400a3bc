use crate::domain::model::StoredValue;
use crate::domain::ports::{BlobStore, PersistenceBackend};
use crate::utils::error::{ProfileError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process key-value backend, used by tests and previews.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Key-value backend persisted as a single JSON document.
///
/// Entries are kept as raw JSON so one bad entry never hides the others;
/// each `get` decodes only the requested key.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        "Settings file {} is not a JSON object, starting empty: {}",
                        path.display(),
                        e
                    );
                    Map::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Settings file {} does not exist yet", path.display());
                Map::new()
            }
            Err(e) => return Err(ProfileError::IoError(e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // 先寫暫存檔再改名，避免寫到一半的檔案
        let tmp_path = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(entries)?;
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl PersistenceBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let entries = lock(&self.entries);
        match entries.get(key) {
            None => Ok(None),
            Some(raw) => serde_json::from_value::<StoredValue>(raw.clone())
                .map(Some)
                .map_err(|e| ProfileError::MalformedEntry {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        let mut entries = lock(&self.entries);
        let previous = entries.insert(key.to_string(), serde_json::to_value(&value)?);

        if let Err(e) = self.flush(&entries) {
            // 寫檔失敗時還原記憶體內容，讓讀取結果與磁碟一致
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        if let Some(old) = entries.remove(key) {
            if let Err(e) = self.flush(&entries) {
                entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.blobs).contains_key(name)
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_blob(&self, name: &str) -> Result<Vec<u8>> {
        lock(&self.blobs)
            .get(name)
            .cloned()
            .ok_or_else(|| ProfileError::MissingEntry {
                key: name.to_string(),
            })
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        lock(&self.blobs).insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove_blob(&self, name: &str) -> Result<()> {
        lock(&self.blobs).remove(name);
        Ok(())
    }
}

/// Blob store rooted at the application's private directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl BlobStore for LocalBlobStore {
    fn read_blob(&self, name: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(name);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    fn remove_blob(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.base_path.join(name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_memory_backend_last_write_wins() {
        let backend = MemoryBackend::new();
        backend
            .set("birthdayName", StoredValue::Text("Mia".to_string()))
            .unwrap();
        backend
            .set("birthdayName", StoredValue::Text("Noa".to_string()))
            .unwrap();

        assert_eq!(
            backend.get("birthdayName").unwrap(),
            Some(StoredValue::Text("Noa".to_string()))
        );
        assert_eq!(backend.len(), 1);

        backend.remove("birthdayName").unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_json_backend_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        {
            let backend = JsonFileBackend::open(&path).unwrap();
            backend
                .set("birthdayName", StoredValue::Text("Mia".to_string()))
                .unwrap();
            backend
                .set("birthdayDate", StoredValue::Timestamp(ts))
                .unwrap();
        }

        let reopened = JsonFileBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("birthdayName").unwrap(),
            Some(StoredValue::Text("Mia".to_string()))
        );
        assert_eq!(
            reopened.get("birthdayDate").unwrap(),
            Some(StoredValue::Timestamp(ts))
        );
        assert_eq!(reopened.get("missing").unwrap(), None);
    }

    #[test]
    fn test_json_backend_isolates_malformed_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "birthdayName": {"type": "text", "value": "Mia"},
                "birthdayDate": {"type": "timestamp", "value": "not a date"}
            }"#,
        )
        .unwrap();

        let backend = JsonFileBackend::open(&path).unwrap();
        assert_eq!(
            backend.get("birthdayName").unwrap(),
            Some(StoredValue::Text("Mia".to_string()))
        );
        assert!(matches!(
            backend.get("birthdayDate"),
            Err(ProfileError::MalformedEntry { .. })
        ));
    }

    #[test]
    fn test_json_backend_starts_empty_on_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        let backend = JsonFileBackend::open(&path).unwrap();
        assert_eq!(backend.get("birthdayName").unwrap(), None);
    }

    #[test]
    fn test_local_blob_store_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path());

        store.write_blob("birthday.png", b"first").unwrap();
        store.write_blob("birthday.png", b"second").unwrap();

        assert_eq!(store.read_blob("birthday.png").unwrap(), b"second");
        assert!(store.read_blob("other.png").is_err());

        store.remove_blob("birthday.png").unwrap();
        assert!(store.read_blob("birthday.png").is_err());
        assert!(store.remove_blob("birthday.png").is_ok());
    }

    #[test]
    fn test_memory_blob_store_missing_blob() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.read_blob("birthday.png"),
            Err(ProfileError::MissingEntry { .. })
        ));
        store.write_blob("birthday.png", &[1, 2, 3]).unwrap();
        assert!(store.contains("birthday.png"));

        store.remove_blob("birthday.png").unwrap();
        assert!(!store.contains("birthday.png"));
    }
}
