// Solar <-> lunar date conversion over the 1900-2099 calendar table

use crate::calendar::{self, FIRST_YEAR, LAST_YEAR};
use crate::error::{BaziError, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

/// A date in the lunar calendar.
///
/// `month` is the 1-based calendar position inside the lunar year, so in a
/// year with a leap month it runs 1..=13 and stops matching the numeric month
/// once the leap slot has been passed. Use [`LunarDate::civil_month`] and
/// [`LunarDate::is_leap_month`] for the conventional reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl LunarDate {
    pub fn is_leap_month(&self) -> bool {
        calendar::year_info(self.year)
            .and_then(|info| info.slot(self.month))
            .map(|slot| slot.leap)
            .unwrap_or(false)
    }

    /// Numeric month the position denotes (a leap slot repeats the month it follows).
    pub fn civil_month(&self) -> u8 {
        calendar::year_info(self.year)
            .and_then(|info| info.slot(self.month))
            .map(|slot| slot.number)
            .unwrap_or(self.month)
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let leap = if self.is_leap_month() { "闰" } else { "" };
        write!(f, "{}年{}{}月{}日", self.year, leap, self.civil_month(), self.day)
    }
}

/// Convert a solar (Gregorian) date to its lunar date.
///
/// Fails with a range error for dates before lunar new year 1900
/// (1900-01-31) or on/after lunar new year 2100 (2100-02-09).
pub fn solar_to_lunar(solar: NaiveDate) -> Result<LunarDate> {
    let epoch = calendar::EPOCH;
    let mut days = (solar - epoch).num_days();
    if days < 0 {
        return Err(BaziError::range(format!(
            "{} precedes the calendar epoch {}",
            solar, epoch
        )));
    }

    let mut year = FIRST_YEAR;
    let info = loop {
        let info = calendar::year_info(year).ok_or_else(|| {
            BaziError::range(format!(
                "{} falls after lunar year {}",
                solar, LAST_YEAR
            ))
        })?;
        let total = i64::from(info.total_days());
        if days < total {
            break info;
        }
        days -= total;
        year += 1;
    };

    for (position, slot) in (1u8..).zip(info.months()) {
        let length = i64::from(slot.days);
        if days < length {
            return Ok(LunarDate {
                year,
                month: position,
                day: (days + 1) as u8,
            });
        }
        days -= length;
    }

    // The year walk above guarantees `days` is below the year's total.
    Err(BaziError::range(format!("{} could not be placed in lunar year {}", solar, year)))
}

/// Convert a lunar date (by calendar position) back to its solar date.
pub fn lunar_to_solar(lunar: &LunarDate) -> Result<NaiveDate> {
    let info = calendar::year_info(lunar.year).ok_or_else(|| {
        BaziError::range(format!(
            "lunar year {} outside {}-{}",
            lunar.year, FIRST_YEAR, LAST_YEAR
        ))
    })?;
    let slot = info.slot(lunar.month).ok_or_else(|| {
        BaziError::input(format!(
            "lunar year {} has no month position {}",
            lunar.year, lunar.month
        ))
    })?;
    if lunar.day == 0 || u32::from(lunar.day) > slot.days {
        return Err(BaziError::input(format!(
            "lunar month position {} of {} has {} days, got day {}",
            lunar.month, lunar.year, slot.days, lunar.day
        )));
    }

    let start = calendar::new_year(lunar.year)
        .ok_or_else(|| BaziError::range(format!("lunar year {} has no new year", lunar.year)))?;
    let before: u32 = info
        .months()
        .take(usize::from(lunar.month) - 1)
        .map(|s| s.days)
        .sum();

    Ok(start + Duration::days(i64::from(before) + i64::from(lunar.day) - 1))
}
