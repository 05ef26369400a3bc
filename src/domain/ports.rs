use crate::domain::model::{PortraitImage, StoredValue};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Keyed settings store (one value per key, last write wins).
pub trait PersistenceBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;
    fn set(&self, key: &str, value: StoredValue) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Named blobs inside the application's private storage.
pub trait BlobStore: Send + Sync {
    fn read_blob(&self, name: &str) -> Result<Vec<u8>>;
    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()>;
    /// Removing a blob that does not exist is not an error.
    fn remove_blob(&self, name: &str) -> Result<()>;
}

pub trait ImageCodec: Send + Sync {
    fn encode(&self, portrait: &PortraitImage) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<PortraitImage>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

impl<T: PersistenceBackend + ?Sized> PersistenceBackend for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    fn read_blob(&self, name: &str) -> Result<Vec<u8>> {
        (**self).read_blob(name)
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        (**self).write_blob(name, data)
    }

    fn remove_blob(&self, name: &str) -> Result<()> {
        (**self).remove_blob(name)
    }
}

impl<T: ImageCodec + ?Sized> ImageCodec for std::sync::Arc<T> {
    fn encode(&self, portrait: &PortraitImage) -> Result<Vec<u8>> {
        (**self).encode(portrait)
    }

    fn decode(&self, data: &[u8]) -> Result<PortraitImage> {
        (**self).decode(data)
    }
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
