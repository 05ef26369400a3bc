use crate::core::age_calculator::{allowed_birth_date_range, compute_milestone};
use crate::core::badge_layout::BadgeLayoutCalculator;
use crate::core::profile_store::ProfileStore;
use crate::core::variant_selector::{AssetKey, AssetSet, VariantSelector};
use crate::domain::model::{
    AgeMilestone, AllowedDateRange, BadgeOffset, PortraitImage, Profile, SaveOutcome,
};
use crate::domain::ports::{BlobStore, Clock, ImageCodec, PersistenceBackend};
use chrono::NaiveDate;
use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PortraitSource {
    Stored(PortraitImage),
    /// No portrait saved; show the bucket's placeholder artwork.
    Placeholder(AssetKey),
}

/// Everything the birthday screen needs, resolved from one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthdayScreen {
    pub headline: String,
    pub milestone: AgeMilestone,
    pub numeral_asset: String,
    pub caption: &'static str,
    pub assets: AssetSet,
    pub portrait: PortraitSource,
}

/// Glue between the UI layer and the engine components.
pub struct BirthdayPresenter<B, S, C, K, R = ChaCha8Rng>
where
    B: PersistenceBackend,
    S: BlobStore,
    C: ImageCodec,
    K: Clock,
    R: RngCore,
{
    store: Arc<ProfileStore<B, S, C>>,
    clock: K,
    selector: VariantSelector<R>,
    badge: BadgeLayoutCalculator,
}

impl<B, S, C, K, R> BirthdayPresenter<B, S, C, K, R>
where
    B: PersistenceBackend,
    S: BlobStore,
    C: ImageCodec,
    K: Clock,
    R: RngCore,
{
    pub fn new(store: Arc<ProfileStore<B, S, C>>, clock: K, selector: VariantSelector<R>) -> Self {
        Self {
            store,
            clock,
            selector,
            badge: BadgeLayoutCalculator::new(),
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore<B, S, C>> {
        &self.store
    }

    pub fn profile(&self) -> Profile {
        self.store.load()
    }

    pub fn allowed_range(&self) -> AllowedDateRange {
        allowed_birth_date_range(self.clock.today())
    }

    pub fn update_name(&self, name: &str) -> SaveOutcome {
        self.store.save_name(name)
    }

    /// Dates outside the picker range are still stored, with a warning.
    pub fn update_birth_date(&self, date: NaiveDate) -> SaveOutcome {
        let range = self.allowed_range();
        if !range.contains(date) {
            tracing::warn!(
                "Birth date {} is outside the allowed range {}..={}",
                date,
                range.lower,
                range.upper
            );
        }
        self.store.save_birth_date(date)
    }

    pub fn update_portrait(&self, portrait: &PortraitImage) -> SaveOutcome {
        self.store.save_portrait(portrait)
    }

    pub fn show_birthday(&mut self) -> Option<BirthdayScreen> {
        let profile = self.store.load();
        let Some(birth_date) = profile.birth_date() else {
            tracing::info!("Birthday screen unavailable: no birth date saved");
            return None;
        };
        if profile.name().is_empty() {
            tracing::info!("Birthday screen unavailable: no name saved");
            return None;
        }

        let milestone = compute_milestone(birth_date, self.clock.today());
        let assets = self.selector.present();
        let portrait = match profile.portrait_image {
            Some(image) => PortraitSource::Stored(image),
            None => PortraitSource::Placeholder(assets.portrait_placeholder),
        };

        tracing::info!(
            "Showing birthday for {}: {} ({} bucket)",
            profile.name,
            milestone,
            assets.bucket
        );

        Some(BirthdayScreen {
            headline: milestone.headline(&profile.name),
            numeral_asset: milestone.numeral_asset_key(),
            caption: milestone.caption(),
            milestone,
            assets,
            portrait,
        })
    }

    pub fn badge_offset(&mut self, portrait_diameter: f64) -> BadgeOffset {
        self.badge.compute_offset(portrait_diameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedClock, MemoryBackend, MemoryBlobStore, StandardCodec};
    use crate::core::variant_selector::VariantPolicy;
    use crate::domain::model::AgeUnit;

    fn presenter(
        today: NaiveDate,
    ) -> BirthdayPresenter<MemoryBackend, MemoryBlobStore, StandardCodec, FixedClock> {
        let store = Arc::new(ProfileStore::new(
            MemoryBackend::new(),
            MemoryBlobStore::new(),
            StandardCodec::png(),
        ));
        BirthdayPresenter::new(
            store,
            FixedClock::new(today),
            VariantSelector::seeded(9, VariantPolicy::Session),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_not_ready_without_name_and_date() {
        let mut presenter = presenter(date(2024, 1, 20));
        assert!(presenter.show_birthday().is_none());

        presenter.update_name("Mia");
        assert!(presenter.show_birthday().is_none());

        presenter.update_birth_date(date(2022, 1, 15));
        assert!(presenter.show_birthday().is_some());
    }

    #[test]
    fn test_screen_uses_placeholder_from_same_bucket() {
        let mut presenter = presenter(date(2024, 1, 20));
        presenter.update_name("Mia");
        presenter.update_birth_date(date(2022, 1, 15));

        let screen = presenter.show_birthday().unwrap();
        assert_eq!(screen.headline, "TODAY Mia IS");
        assert_eq!(
            screen.milestone,
            AgeMilestone {
                unit: AgeUnit::Year,
                count: 2
            }
        );
        assert_eq!(screen.numeral_asset, "2");
        assert_eq!(screen.caption, "YEAR OLD!");
        assert_eq!(
            screen.portrait,
            PortraitSource::Placeholder(screen.assets.portrait_placeholder)
        );
        assert_eq!(screen.assets, screen.assets.bucket.assets());
    }

    #[test]
    fn test_newborn_screen() {
        let mut presenter = presenter(date(2024, 3, 1));
        presenter.update_name("Ari");
        presenter.update_birth_date(date(2024, 3, 1));

        let screen = presenter.show_birthday().unwrap();
        assert_eq!(screen.numeral_asset, "1");
        assert_eq!(screen.caption, "MONTH OLD!");
    }

    #[test]
    fn test_stored_portrait_is_preferred() {
        let mut presenter = presenter(date(2024, 3, 1));
        presenter.update_name("Ari");
        presenter.update_birth_date(date(2023, 12, 1));
        let portrait = PortraitImage::from_rgb8(2, 2, vec![90; 12]).unwrap();
        presenter.update_portrait(&portrait);

        let screen = presenter.show_birthday().unwrap();
        assert_eq!(screen.portrait, PortraitSource::Stored(portrait));
    }

    #[test]
    fn test_out_of_range_date_still_saved() {
        let presenter = presenter(date(2024, 3, 1));
        let too_old = presenter.allowed_range().lower - chrono::Duration::days(1);

        assert!(presenter.update_birth_date(too_old).is_saved());
        assert_eq!(presenter.profile().birth_date(), Some(too_old));
    }

    #[test]
    fn test_badge_offset_is_cached() {
        let mut presenter = presenter(date(2024, 3, 1));
        let first = presenter.badge_offset(120.0);
        assert_eq!(presenter.badge_offset(120.0), first);
        assert!(first.x > 0.0 && first.y < 0.0);
    }
}
