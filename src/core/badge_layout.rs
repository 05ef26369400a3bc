use crate::domain::model::BadgeOffset;
use std::f64::consts::FRAC_PI_4;

/// Offset of a badge sitting on the portrait circle, 45° clockwise from
/// vertical. Origin is the circle center, y grows downward.
pub fn badge_offset(diameter: f64) -> BadgeOffset {
    if !diameter.is_finite() || diameter <= 0.0 {
        return BadgeOffset::default();
    }

    let radius = diameter / 2.0;
    BadgeOffset {
        x: radius * FRAC_PI_4.sin(),
        y: -radius * FRAC_PI_4.cos(),
    }
}

/// Caches the last offset so repeated layout passes with an unchanged
/// diameter return the exact same value.
#[derive(Debug, Default)]
pub struct BadgeLayoutCalculator {
    cached: Option<(f64, BadgeOffset)>,
    recomputations: u64,
}

impl BadgeLayoutCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_offset(&mut self, diameter: f64) -> BadgeOffset {
        if let Some((measured, offset)) = self.cached {
            if measured == diameter {
                return offset;
            }
        }

        let offset = badge_offset(diameter);
        tracing::debug!(
            "Badge offset recomputed for diameter {}: ({:.2}, {:.2})",
            diameter,
            offset.x,
            offset.y
        );
        self.cached = Some((diameter, offset));
        self.recomputations += 1;
        offset
    }

    pub fn cached(&self) -> Option<BadgeOffset> {
        self.cached.map(|(_, offset)| offset)
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }
}
