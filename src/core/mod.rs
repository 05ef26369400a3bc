pub mod age_calculator;
pub mod badge_layout;
pub mod portrait_writer;
pub mod presenter;
pub mod profile_store;
pub mod variant_selector;

pub use crate::domain::model::{
    AgeMilestone, AgeUnit, AllowedDateRange, BadgeOffset, PortraitImage, Profile, ProfileField,
    SaveOutcome, StoredValue,
};
pub use crate::domain::ports::{BlobStore, Clock, ImageCodec, PersistenceBackend};
pub use crate::utils::error::Result;
