use chrono::{DateTime, NaiveDate, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded portrait. Equality compares dimensions and RGBA pixels.
#[derive(Debug, Clone)]
pub struct PortraitImage {
    image: DynamicImage,
}

impl PortraitImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgb8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        image::RgbImage::from_raw(width, height, pixels)
            .map(|buffer| Self::new(DynamicImage::ImageRgb8(buffer)))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl PartialEq for PortraitImage {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.image.to_rgba8().as_raw() == other.image.to_rgba8().as_raw()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub portrait_image: Option<PortraitImage>,
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn portrait_image(&self) -> Option<&PortraitImage> {
        self.portrait_image.as_ref()
    }

    pub fn has_portrait(&self) -> bool {
        self.portrait_image.is_some()
    }

    /// The birthday screen needs both a name and a birth date.
    pub fn is_ready_for_birthday(&self) -> bool {
        !self.name.is_empty() && self.birth_date.is_some()
    }
}

/// A single field update handed to `ProfileStore::save`.
#[derive(Debug, Clone)]
pub enum ProfileField {
    Name(String),
    BirthDate(NaiveDate),
    Portrait(PortraitImage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
}

impl SaveOutcome {
    pub fn is_saved(self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Value shapes the key-value backend understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl StoredValue {
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredValue::Timestamp(ts) => Some(*ts),
            StoredValue::Text(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Text(_) => "text",
            StoredValue::Timestamp(_) => "timestamp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeUnit {
    Year,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeMilestone {
    pub unit: AgeUnit,
    pub count: u32,
}

impl AgeMilestone {
    pub fn headline(&self, name: &str) -> String {
        format!("TODAY {} IS", name)
    }

    pub fn caption(&self) -> &'static str {
        match self.unit {
            AgeUnit::Year => "YEAR OLD!",
            AgeUnit::Month => "MONTH OLD!",
        }
    }

    /// Numeral artwork is keyed by the bare count.
    pub fn numeral_asset_key(&self) -> String {
        self.count.to_string()
    }
}

impl fmt::Display for AgeMilestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.count, self.caption())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedDateRange {
    pub lower: NaiveDate,
    pub upper: NaiveDate,
}

impl AllowedDateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower <= date && date <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BadgeOffset {
    pub x: f64,
    pub y: f64,
}
