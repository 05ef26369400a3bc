use crate::domain::model::{PortraitImage, Profile, ProfileField, SaveOutcome, StoredValue};
use crate::domain::ports::{BlobStore, ImageCodec, PersistenceBackend};
use crate::utils::error::{ProfileError, Result};
use crate::utils::validation;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Mutex;

pub const NAME_KEY: &str = "birthdayName";
pub const BIRTH_DATE_KEY: &str = "birthdayDate";
pub const IMAGE_FILE_NAME_KEY: &str = "birthdayImageFileName";
/// Historical name; the blob holds whatever the codec writes (PNG by default,
/// JPEG when configured).
pub const DEFAULT_IMAGE_FILE_NAME: &str = "birthday.png";

/// Owns the single persisted profile.
///
/// Reads and writes never fail towards the caller: problems are logged and
/// the affected field falls back to absent (on load) or keeps its previous
/// value (on save).
pub struct ProfileStore<B: PersistenceBackend, S: BlobStore, C: ImageCodec> {
    backend: B,
    blobs: S,
    codec: C,
    image_file_name: String,
    portrait_lock: Mutex<()>,
}

impl<B: PersistenceBackend, S: BlobStore, C: ImageCodec> ProfileStore<B, S, C> {
    pub fn new(backend: B, blobs: S, codec: C) -> Self {
        Self {
            backend,
            blobs,
            codec,
            image_file_name: DEFAULT_IMAGE_FILE_NAME.to_string(),
            portrait_lock: Mutex::new(()),
        }
    }

    pub fn with_image_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.image_file_name = file_name.into();
        self
    }

    pub fn image_file_name(&self) -> &str {
        &self.image_file_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn load(&self) -> Profile {
        let name = self.load_name().unwrap_or_else(|e| {
            log_load_failure("name", &e);
            None
        });
        let birth_date = self.load_birth_date().unwrap_or_else(|e| {
            log_load_failure("birth date", &e);
            None
        });
        let portrait_image = self.load_portrait().unwrap_or_else(|e| {
            log_load_failure("portrait", &e);
            None
        });

        let profile = Profile {
            name: name.unwrap_or_default(),
            birth_date,
            portrait_image,
        };
        tracing::debug!(
            "Loaded profile: name={:?}, birth_date={:?}, portrait={}",
            profile.name,
            profile.birth_date,
            profile.has_portrait()
        );
        profile
    }

    pub fn load_name(&self) -> Result<Option<String>> {
        match self.backend.get(NAME_KEY)? {
            None => Ok(None),
            Some(StoredValue::Text(name)) => Ok(Some(name)),
            Some(other) => Err(unexpected_kind(NAME_KEY, "text", &other)),
        }
    }

    pub fn load_birth_date(&self) -> Result<Option<NaiveDate>> {
        match self.backend.get(BIRTH_DATE_KEY)? {
            None => Ok(None),
            Some(StoredValue::Timestamp(ts)) => Ok(Some(ts.date_naive())),
            Some(other) => Err(unexpected_kind(BIRTH_DATE_KEY, "timestamp", &other)),
        }
    }

    pub fn load_portrait(&self) -> Result<Option<PortraitImage>> {
        let file_name = match self.backend.get(IMAGE_FILE_NAME_KEY)? {
            None => return Ok(None),
            Some(StoredValue::Text(file_name)) => file_name,
            Some(other) => return Err(unexpected_kind(IMAGE_FILE_NAME_KEY, "text", &other)),
        };
        // 只允許私有目錄內的單一檔名
        validation::validate_file_name(IMAGE_FILE_NAME_KEY, &file_name).map_err(|e| {
            ProfileError::MalformedEntry {
                key: IMAGE_FILE_NAME_KEY.to_string(),
                reason: e.to_string(),
            }
        })?;

        let data = self.blobs.read_blob(&file_name)?;
        let portrait = self.codec.decode(&data)?;
        Ok(Some(portrait))
    }

    pub fn save(&self, field: ProfileField) -> SaveOutcome {
        match field {
            ProfileField::Name(name) => self.save_name(&name),
            ProfileField::BirthDate(date) => self.save_birth_date(date),
            ProfileField::Portrait(portrait) => self.save_portrait(&portrait),
        }
    }

    pub fn save_name(&self, name: &str) -> SaveOutcome {
        let result = self
            .backend
            .set(NAME_KEY, StoredValue::Text(name.to_string()));
        report_save("name", result)
    }

    pub fn save_birth_date(&self, date: NaiveDate) -> SaveOutcome {
        let timestamp = date.and_time(NaiveTime::MIN).and_utc();
        let result = self
            .backend
            .set(BIRTH_DATE_KEY, StoredValue::Timestamp(timestamp));
        report_save("birth date", result)
    }

    /// Encodes the portrait, overwrites the fixed blob, and only then
    /// records the blob name. Calls are serialized. If the reference cannot
    /// be recorded the previous blob contents are put back.
    pub fn save_portrait(&self, portrait: &PortraitImage) -> SaveOutcome {
        let _guard = self
            .portrait_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let data = match self.codec.encode(portrait) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Unable to encode portrait, keeping previous image: {}", e);
                return SaveOutcome::Failed;
            }
        };

        let previous = self.blobs.read_blob(&self.image_file_name).ok();

        if let Err(e) = self.blobs.write_blob(&self.image_file_name, &data) {
            tracing::warn!(
                "Unable to write portrait to {}, keeping previous image: {}",
                self.image_file_name,
                e
            );
            return SaveOutcome::Failed;
        }

        let result = self.backend.set(
            IMAGE_FILE_NAME_KEY,
            StoredValue::Text(self.image_file_name.clone()),
        );
        match &result {
            Ok(()) => tracing::info!(
                "Portrait saved to {} ({} bytes)",
                self.image_file_name,
                data.len()
            ),
            Err(_) => self.restore_blob(previous),
        }
        report_save("portrait reference", result)
    }

    fn restore_blob(&self, previous: Option<Vec<u8>>) {
        let restored = match previous {
            Some(bytes) => self.blobs.write_blob(&self.image_file_name, &bytes),
            None => self.blobs.remove_blob(&self.image_file_name),
        };
        if let Err(e) = restored {
            tracing::error!(
                "Unable to restore previous portrait at {}: {}",
                self.image_file_name,
                e
            );
        }
    }
}

fn unexpected_kind(key: &str, expected: &str, found: &StoredValue) -> ProfileError {
    ProfileError::MalformedEntry {
        key: key.to_string(),
        reason: format!("expected {}, found {}", expected, found.kind()),
    }
}

fn log_load_failure(field: &str, error: &ProfileError) {
    if error.is_data_issue() {
        tracing::warn!("Load {} failed, treating as absent: {}", field, error);
    } else {
        tracing::error!("Load {} failed, treating as absent: {}", field, error);
    }
}

fn report_save(field: &str, result: Result<()>) -> SaveOutcome {
    match result {
        Ok(()) => {
            tracing::debug!("Saved {}", field);
            SaveOutcome::Saved
        }
        Err(e) => {
            tracing::warn!("Unable to save {}: {}", field, e);
            SaveOutcome::Failed
        }
    }
}
