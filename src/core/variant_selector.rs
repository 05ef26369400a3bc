use crate::domain::model::StoredValue;
use crate::domain::ports::PersistenceBackend;
use crate::utils::error::{ProfileError, Result};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const VARIANT_KEY: &str = "birthdayVariant";

pub type AssetKey = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantBucket {
    Elephant,
    Fox,
    Pelican,
}

impl VariantBucket {
    pub const ALL: [VariantBucket; 3] = [
        VariantBucket::Elephant,
        VariantBucket::Fox,
        VariantBucket::Pelican,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VariantBucket::Elephant => "elephant",
            VariantBucket::Fox => "fox",
            VariantBucket::Pelican => "pelican",
        }
    }

    fn row(self) -> &'static AssetSet {
        match self {
            VariantBucket::Elephant => &ASSET_TABLE[0],
            VariantBucket::Fox => &ASSET_TABLE[1],
            VariantBucket::Pelican => &ASSET_TABLE[2],
        }
    }

    /// The full asset triple for this bucket.
    pub fn assets(self) -> AssetSet {
        *self.row()
    }
}

impl fmt::Display for VariantBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantBucket {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        VariantBucket::ALL
            .iter()
            .copied()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| ProfileError::MalformedEntry {
                key: VARIANT_KEY.to_string(),
                reason: format!("unknown variant bucket '{}'", s),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Background,
    PortraitPlaceholder,
    BadgeIcon,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Background,
        AssetCategory::PortraitPlaceholder,
        AssetCategory::BadgeIcon,
    ];
}

impl FromStr for AssetCategory {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "background" => Ok(AssetCategory::Background),
            "portrait_placeholder" | "portraitPlaceholder" => Ok(AssetCategory::PortraitPlaceholder),
            "badge_icon" | "badgeIcon" => Ok(AssetCategory::BadgeIcon),
            other => Err(ProfileError::UnknownCategory {
                category: other.to_string(),
            }),
        }
    }
}

/// One row of the asset table. Always taken whole from a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetSet {
    pub bucket: VariantBucket,
    pub background: AssetKey,
    pub portrait_placeholder: AssetKey,
    pub badge_icon: AssetKey,
}

impl AssetSet {
    pub fn get(&self, category: AssetCategory) -> AssetKey {
        match category {
            AssetCategory::Background => self.background,
            AssetCategory::PortraitPlaceholder => self.portrait_placeholder,
            AssetCategory::BadgeIcon => self.badge_icon,
        }
    }
}

const ASSET_TABLE: [AssetSet; 3] = [
    AssetSet {
        bucket: VariantBucket::Elephant,
        background: "iOsBgElephant",
        portrait_placeholder: "defaultPlaceHolderYellow",
        badge_icon: "cameraIconYellow",
    },
    AssetSet {
        bucket: VariantBucket::Fox,
        background: "iOsBgFox",
        portrait_placeholder: "defaultPlaceHolderGreen",
        badge_icon: "cameraIconGreen",
    },
    AssetSet {
        bucket: VariantBucket::Pelican,
        background: "iOsBgPelican",
        portrait_placeholder: "defaultPlaceHolderBlue",
        badge_icon: "cameraIconBlue",
    },
];

/// How long a sampled bucket stays in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantPolicy {
    /// Resample every time the birthday screen is shown.
    #[default]
    PerPresentation,
    /// Sample once and keep it for the lifetime of the selector.
    Session,
    /// Sample once and store it, so it survives restarts.
    Persisted,
}

impl FromStr for VariantPolicy {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per_presentation" => Ok(VariantPolicy::PerPresentation),
            "session" => Ok(VariantPolicy::Session),
            "persisted" => Ok(VariantPolicy::Persisted),
            other => Err(ProfileError::InvalidConfigValueError {
                field: "variant.policy".to_string(),
                value: other.to_string(),
                reason: "Valid policies: per_presentation, session, persisted".to_string(),
            }),
        }
    }
}

pub fn resolve(bucket: VariantBucket, category: AssetCategory) -> AssetKey {
    bucket.row().get(category)
}

pub fn resolve_named(bucket: VariantBucket, category: &str) -> Result<AssetKey> {
    let category = category.parse::<AssetCategory>()?;
    Ok(resolve(bucket, category))
}

pub struct VariantSelector<R: RngCore = ChaCha8Rng> {
    rng: R,
    policy: VariantPolicy,
    current: Option<VariantBucket>,
    backend: Option<Arc<dyn PersistenceBackend>>,
}

impl VariantSelector<ChaCha8Rng> {
    pub fn seeded(seed: u64, policy: VariantPolicy) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed), policy)
    }

    pub fn from_entropy(policy: VariantPolicy) -> Self {
        Self::new(ChaCha8Rng::from_entropy(), policy)
    }
}

impl<R: RngCore> VariantSelector<R> {
    pub fn new(rng: R, policy: VariantPolicy) -> Self {
        Self {
            rng,
            policy,
            current: None,
            backend: None,
        }
    }

    /// Backend used by `VariantPolicy::Persisted`; ignored by the other policies.
    pub fn with_backend(mut self, backend: Arc<dyn PersistenceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn policy(&self) -> VariantPolicy {
        self.policy
    }

    pub fn current(&self) -> Option<VariantBucket> {
        self.current
    }

    fn sample(&mut self) -> VariantBucket {
        VariantBucket::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(VariantBucket::Elephant)
    }

    pub fn select(&mut self) -> VariantBucket {
        let bucket = match (self.policy, self.current) {
            (VariantPolicy::PerPresentation, _) => self.sample(),
            (_, Some(bucket)) => bucket,
            (VariantPolicy::Session, None) => self.sample(),
            (VariantPolicy::Persisted, None) => self.restore_or_sample(),
        };

        tracing::debug!("Selected variant bucket {} ({:?})", bucket, self.policy);
        self.current = Some(bucket);
        bucket
    }

    /// Selects once and resolves every category from that single bucket.
    pub fn present(&mut self) -> AssetSet {
        self.select().assets()
    }

    pub fn resolve(&self, bucket: VariantBucket, category: AssetCategory) -> AssetKey {
        resolve(bucket, category)
    }

    fn restore_or_sample(&mut self) -> VariantBucket {
        let Some(backend) = self.backend.clone() else {
            tracing::warn!("Persisted variant policy without a backend, keeping bucket in memory");
            return self.sample();
        };

        match read_persisted(backend.as_ref()) {
            Ok(Some(bucket)) => return bucket,
            Ok(None) => tracing::debug!("No persisted variant bucket yet"),
            Err(e) => tracing::warn!("Ignoring persisted variant bucket: {}", e),
        }

        let bucket = self.sample();
        if let Err(e) = backend.set(VARIANT_KEY, StoredValue::Text(bucket.as_str().to_string())) {
            tracing::warn!("Unable to persist variant bucket {}: {}", bucket, e);
        }
        bucket
    }
}

fn read_persisted(backend: &dyn PersistenceBackend) -> Result<Option<VariantBucket>> {
    match backend.get(VARIANT_KEY)? {
        None => Ok(None),
        Some(StoredValue::Text(raw)) => raw.parse().map(Some),
        Some(other) => Err(ProfileError::MalformedEntry {
            key: VARIANT_KEY.to_string(),
            reason: format!("expected text, found {}", other.kind()),
        }),
    }
}
