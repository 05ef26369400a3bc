use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image codec error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Persisted entry '{key}' is malformed: {reason}")]
    MalformedEntry { key: String, reason: String },

    #[error("Persisted entry '{key}' not found")]
    MissingEntry { key: String },

    #[error("Unknown asset category: {category}")]
    UnknownCategory { category: String },

    #[error("Background worker error: {message}")]
    WorkerError { message: String },
}

impl ProfileError {
    /// Absent and malformed entries are expected on a fresh install and after
    /// manual edits; everything else points at the environment.
    pub fn is_data_issue(&self) -> bool {
        matches!(
            self,
            ProfileError::MalformedEntry { .. }
                | ProfileError::MissingEntry { .. }
                | ProfileError::ImageError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
