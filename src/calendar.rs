// Lunar calendar table for lunar years 1900-2099
//
// One packed word per year, decoded at compile time into `YearInfo`:
//   bits 0-3   leap month position (0 = no leap month)
//   bits 4-15  long-month flags, bit 15 = month 1 ... bit 4 = month 12
//   bit 16     leap month has 30 days

use chrono::{Duration, NaiveDate};

pub const FIRST_YEAR: i32 = 1900;
pub const LAST_YEAR: i32 = 2099;

const YEAR_COUNT: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

const SHORT_MONTH: u32 = 29;
const LONG_MONTH: u32 = 30;

#[rustfmt::skip]
const PACKED: [u32; YEAR_COUNT] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2, // 1900
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977, // 1910
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970, // 1920
    0x06566, 0x0d4a0, 0x0ea50, 0x16a95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950, // 1930
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557, // 1940
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0, // 1950
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0, // 1960
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b6a0, 0x195a6, // 1970
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570, // 1980
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x05ac0, 0x0ab60, 0x096d5, 0x092e0, // 1990
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5, // 2000
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930, // 2010
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530, // 2020
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45, // 2030
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0, // 2040
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0, // 2050
    0x092e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4, // 2060
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0, // 2070
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160, // 2080
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252, // 2090
];

/// Month layout of one lunar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearInfo {
    /// Numeric month after which the leap month is inserted.
    leap_month: Option<u8>,
    /// Bit `m - 1` set when regular month `m` has 30 days.
    long_months: u16,
    leap_long: bool,
}

/// One slot in a lunar year, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSlot {
    /// Numeric month this slot belongs to (a leap slot repeats its predecessor's number).
    pub number: u8,
    pub leap: bool,
    pub days: u32,
}

const fn decode(raw: u32) -> YearInfo {
    let leap = (raw & 0xf) as u8;
    let mut long_months = 0u16;
    let mut month = 1;
    while month <= 12 {
        if raw & (0x10000 >> month) != 0 {
            long_months |= 1 << (month - 1);
        }
        month += 1;
    }

    YearInfo {
        leap_month: if leap == 0 { None } else { Some(leap) },
        long_months,
        leap_long: raw & 0x10000 != 0,
    }
}

static TABLE: [YearInfo; YEAR_COUNT] = {
    let mut table = [YearInfo {
        leap_month: None,
        long_months: 0,
        leap_long: false,
    }; YEAR_COUNT];
    let mut i = 0;
    while i < YEAR_COUNT {
        table[i] = decode(PACKED[i]);
        i += 1;
    }
    table
};

impl YearInfo {
    pub fn leap_month(&self) -> Option<u8> {
        self.leap_month
    }

    /// Length of regular month `month` (1..=12). Out-of-range months read as short.
    pub fn month_days(&self, month: u8) -> u32 {
        if (1..=12).contains(&month) && self.long_months & (1 << (month - 1)) != 0 {
            LONG_MONTH
        } else {
            SHORT_MONTH
        }
    }

    /// Length of the leap month, or 0 when the year has none.
    pub fn leap_month_days(&self) -> u32 {
        match (self.leap_month, self.leap_long) {
            (None, _) => 0,
            (Some(_), true) => LONG_MONTH,
            (Some(_), false) => SHORT_MONTH,
        }
    }

    /// 12 or 13 month slots, the leap slot directly after the month it follows.
    pub fn months(&self) -> impl Iterator<Item = MonthSlot> + '_ {
        (1..=12u8).flat_map(move |number| {
            let regular = MonthSlot {
                number,
                leap: false,
                days: self.month_days(number),
            };
            let leap = (self.leap_month == Some(number)).then(|| MonthSlot {
                number,
                leap: true,
                days: self.leap_month_days(),
            });
            std::iter::once(regular).chain(leap)
        })
    }

    /// Slot at 1-based calendar position, if the year has that many slots.
    pub fn slot(&self, position: u8) -> Option<MonthSlot> {
        if position == 0 {
            return None;
        }
        self.months().nth(usize::from(position) - 1)
    }

    pub fn month_count(&self) -> u8 {
        if self.leap_month.is_some() {
            13
        } else {
            12
        }
    }

    pub fn total_days(&self) -> u32 {
        self.months().map(|slot| slot.days).sum()
    }
}

/// Layout for `year`, or `None` outside 1900-2099.
pub fn year_info(year: i32) -> Option<&'static YearInfo> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
        return None;
    }
    TABLE.get((year - FIRST_YEAR) as usize)
}

/// Solar date of lunar new year 1900, the anchor of the whole table.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 31) {
    Some(date) => date,
    None => panic!("invalid epoch"),
};

/// Solar date of the first day of lunar `year`.
pub fn new_year(year: i32) -> Option<NaiveDate> {
    year_info(year)?;
    let days: i64 = (FIRST_YEAR..year)
        .filter_map(year_info)
        .map(|info| i64::from(info.total_days()))
        .sum();
    Some(EPOCH + Duration::days(days))
}
