// Bazi Fortune - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod calendar;   // Lunar calendar table 1900-2099
pub mod lunar;      // Solar <-> lunar conversion
pub mod symbols;    // Stems, branches, elements, polarity
pub mod bazi;       // Four pillars derivation
pub mod elements;   // Element / polarity tallies
pub mod fortune;    // Scores, advice, day master
pub mod history;    // Bounded JSON query log
pub mod config;
pub mod error;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use calendar::{year_info, YearInfo, MonthSlot, FIRST_YEAR, LAST_YEAR};
pub use lunar::{solar_to_lunar, lunar_to_solar, LunarDate};
pub use symbols::{Stem, Branch, Element, Polarity};
pub use bazi::{derive, chart_for_solar, BaziChart, Pillar};
pub use elements::{
    tally, tally_pillars, polarity_tally,
    ElementTally, ElementBalance, ElementShare, ElementRating, PolarityTally,
};
pub use fortune::{
    daily_fortune, wealth_index, advice, day_master_strength,
    FortuneReport, DayMaster, Gender,
};
pub use history::{
    HistoryStore, HistoryRecord, Statistics,
    HISTORY_CAPACITY, HISTORY_TAIL,
};
pub use config::Config;
pub use error::{BaziError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
