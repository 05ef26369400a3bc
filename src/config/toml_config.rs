use crate::adapters::{JsonFileBackend, LocalBlobStore, PortraitFormat, StandardCodec};
use crate::core::profile_store::{ProfileStore, DEFAULT_IMAGE_FILE_NAME};
use crate::core::variant_selector::{VariantPolicy, VariantSelector};
use crate::domain::ports::PersistenceBackend;
use crate::utils::error::{ProfileError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type FileProfileStore = ProfileStore<Arc<JsonFileBackend>, LocalBlobStore, StandardCodec>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BirthdayConfig {
    pub storage: StorageConfig,
    pub image: ImageConfig,
    pub variant: VariantConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub defaults_file: String,
    pub image_file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./birthday-data".to_string(),
            defaults_file: "settings.json".to_string(),
            image_file_name: DEFAULT_IMAGE_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub format: PortraitFormat,
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            format: PortraitFormat::Png,
            jpeg_quality: crate::adapters::codec::DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct VariantConfig {
    pub policy: VariantPolicy,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl BirthdayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProfileError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::info!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProfileError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HOME})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProfileError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_file_name("storage.defaults_file", &self.storage.defaults_file)?;
        validation::validate_file_name("storage.image_file_name", &self.storage.image_file_name)?;

        if self.storage.defaults_file == self.storage.image_file_name {
            return Err(ProfileError::ConfigValidationError {
                field: "storage.image_file_name".to_string(),
                message: "must differ from storage.defaults_file".to_string(),
            });
        }

        validation::validate_range("image.jpeg_quality", self.image.jpeg_quality, 1, 100)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.defaults_file)
    }

    pub fn codec(&self) -> StandardCodec {
        StandardCodec::new(self.image.format, self.image.jpeg_quality)
    }

    /// Opens the on-disk store described by this configuration.
    pub fn open_store(&self) -> Result<FileProfileStore> {
        let backend = Arc::new(JsonFileBackend::open(self.settings_path())?);
        let blobs = LocalBlobStore::new(self.data_dir());

        Ok(ProfileStore::new(backend, blobs, self.codec())
            .with_image_file_name(self.storage.image_file_name.clone()))
    }

    /// Seeded when `variant.seed` is set, otherwise seeded from OS entropy.
    pub fn variant_selector(&self, backend: Arc<dyn PersistenceBackend>) -> VariantSelector {
        let selector = match self.variant.seed {
            Some(seed) => VariantSelector::seeded(seed, self.variant.policy),
            None => VariantSelector::from_entropy(self.variant.policy),
        };
        selector.with_backend(backend)
    }
}

impl Validate for BirthdayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
