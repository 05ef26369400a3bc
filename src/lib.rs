pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{
    FixedClock, JsonFileBackend, LocalBlobStore, MemoryBackend, MemoryBlobStore, PortraitFormat,
    StandardCodec, SystemClock,
};
pub use config::BirthdayConfig;
pub use crate::core::{
    age_calculator::{allowed_birth_date_range, compute_milestone},
    badge_layout::{badge_offset, BadgeLayoutCalculator},
    portrait_writer::PortraitWriter,
    presenter::{BirthdayPresenter, BirthdayScreen, PortraitSource},
    profile_store::ProfileStore,
    variant_selector::{AssetCategory, AssetSet, VariantBucket, VariantPolicy, VariantSelector},
};
pub use domain::model::{
    AgeMilestone, AgeUnit, AllowedDateRange, BadgeOffset, PortraitImage, Profile, ProfileField,
    SaveOutcome,
};
pub use utils::error::{ProfileError, Result};
