use crate::domain::model::{AgeMilestone, AgeUnit, AllowedDateRange};
use chrono::{Datelike, Duration, Months, NaiveDate};

/// Birth dates may go back three 365-day years plus one day, so a child
/// turning exactly three today is still selectable.
pub const BIRTH_DATE_WINDOW_DAYS: i64 = 3 * 365 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarDifference {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

/// Whole calendar units between two dates.
///
/// A month counts once the reference day-of-month reaches the birth
/// day-of-month. A reference date before the birth date yields zero.
pub fn calendar_difference(birth_date: NaiveDate, reference_date: NaiveDate) -> CalendarDifference {
    if reference_date <= birth_date {
        return CalendarDifference::default();
    }

    let mut total_months = (reference_date.year() - birth_date.year()) * 12
        + (reference_date.month() as i32 - birth_date.month() as i32);
    if reference_date.day() < birth_date.day() {
        total_months -= 1;
    }
    let total_months = total_months.max(0) as u32;

    let anchor = birth_date
        .checked_add_months(Months::new(total_months))
        .unwrap_or(birth_date);
    let days = (reference_date - anchor).num_days().max(0) as u32;

    CalendarDifference {
        years: total_months / 12,
        months: total_months % 12,
        days,
    }
}

pub fn compute_milestone(birth_date: NaiveDate, reference_date: NaiveDate) -> AgeMilestone {
    if reference_date < birth_date {
        tracing::warn!(
            "Birth date {} is after reference date {}, treating as newborn",
            birth_date,
            reference_date
        );
    }

    let diff = calendar_difference(birth_date, reference_date);
    let milestone = if diff.years >= 1 {
        AgeMilestone {
            unit: AgeUnit::Year,
            count: diff.years,
        }
    } else {
        // 當月出生沒有日的解析度，顯示時進位為 1 個月
        AgeMilestone {
            unit: AgeUnit::Month,
            count: diff.months.max(1),
        }
    };

    tracing::debug!(
        "Age from {} to {}: {:?} -> {}",
        birth_date,
        reference_date,
        diff,
        milestone
    );
    milestone
}

pub fn allowed_birth_date_range(reference_date: NaiveDate) -> AllowedDateRange {
    AllowedDateRange {
        lower: reference_date
            .checked_sub_signed(Duration::days(BIRTH_DATE_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN),
        upper: reference_date,
    }
}
