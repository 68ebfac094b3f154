// Four pillars (年月日时) derivation from a lunar date and birth hour

use crate::calendar::FIRST_YEAR;
use crate::error::{BaziError, Result};
use crate::lunar::{self, LunarDate};
use crate::symbols::{Branch, Stem};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

/// A stem/branch pair for one temporal unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pillar {
    pub stem: Stem,
    pub branch: Branch,
}

impl Pillar {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Self { stem, branch }
    }

    fn from_indices(stem: i64, branch: i64) -> Self {
        Self::new(Stem::from_index(stem), Branch::from_index(branch))
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

/// Year, month, day and hour pillars of one birth moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaziChart {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
}

impl BaziChart {
    pub fn pillars(&self) -> [Pillar; 4] {
        [self.year, self.month, self.day, self.hour]
    }
}

impl fmt::Display for BaziChart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.month, self.day, self.hour)
    }
}

/// Derive the chart for a lunar date and an hour of day (0..=23).
pub fn derive(lunar: &LunarDate, hour: u32) -> Result<BaziChart> {
    if hour > 23 {
        return Err(BaziError::input(format!("birth hour must be 0-23, got {}", hour)));
    }

    let year = year_pillar(lunar.year);
    let month = month_pillar(lunar, year.stem);
    let day = day_pillar(lunar)?;
    let hour = hour_pillar(day.stem, hour);

    Ok(BaziChart { year, month, day, hour })
}

/// Convert a solar birth date and derive its chart in one step.
pub fn chart_for_solar(solar: NaiveDate, hour: u32) -> Result<(LunarDate, BaziChart)> {
    let lunar = lunar::solar_to_lunar(solar)?;
    let chart = derive(&lunar, hour)?;
    Ok((lunar, chart))
}

fn year_pillar(lunar_year: i32) -> Pillar {
    let offset = i64::from(lunar_year - FIRST_YEAR);
    Pillar::from_indices(offset + 1, offset)
}

fn month_pillar(lunar: &LunarDate, year_stem: Stem) -> Pillar {
    // Positions past the threshold step back one so a leap slot shares its month's pillar.
    let mut month = i64::from(lunar.month);
    if month > i64::from(lunar.year.rem_euclid(12)) {
        month -= 1;
    }

    let stem = year_stem.index() as i64 + (month - 1) * 2;
    Pillar::from_indices(stem, month + 1)
}

fn day_pillar(lunar: &LunarDate) -> Result<Pillar> {
    let offset = day_offset(lunar)?;
    Ok(Pillar::from_indices(offset, offset))
}

fn hour_pillar(day_stem: Stem, hour: u32) -> Pillar {
    let hour = i64::from(hour);
    Pillar::from_indices(day_stem.index() as i64 + hour * 2, hour)
}

/// Days from 1900-01-01 to the lunar fields read as if they were a solar date.
///
/// This is an approximation: the lunar year/position/day are placed on the
/// solar calendar directly instead of converting back. Month 13 rolls into
/// January of the next year and days past a month's end roll forward.
fn day_offset(lunar: &LunarDate) -> Result<i64> {
    let base = NaiveDate::from_ymd_opt(1900, 1, 1)
        .ok_or_else(|| BaziError::range("invalid day pillar base date"))?;

    let months_from_january = i32::from(lunar.month.max(1)) - 1;
    let year = lunar.year + months_from_january / 12;
    let month = (months_from_january % 12 + 1) as u32;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        BaziError::range(format!("cannot place {}-{} on the solar calendar", year, month))
    })?;
    let date = first + Duration::days(i64::from(lunar.day.max(1)) - 1);

    Ok((date - base).num_days())
}
