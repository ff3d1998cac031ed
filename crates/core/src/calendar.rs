//! Bikram Sambat / Anno Domini conversion and date rendering.
//!
//! The conversion is a fixed year shift: a BS date carries the same month and
//! day numbers as its AD counterpart, with the year moved forward by
//! [`BS_YEAR_OFFSET`]. This does not follow the real BS month tables (the BS new
//! year falls in mid-April and month lengths vary by year). It is kept as-is so
//! stored data and exported files stay comparable with existing records, but it
//! is strict: a BS date with no AD counterpart is an error rather than a
//! silently malformed value.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const BS_YEAR_OFFSET: i32 = 56;

/// Highest AD year whose BS rendering still has four digits.
pub const MAX_AD_YEAR: i32 = 9999 - BS_YEAR_OFFSET;
pub const MIN_AD_YEAR: i32 = 1;

pub const BS_MONTHS: [&str; 12] = [
    "बैशाख", "जेठ", "आषाढ", "श्रावण", "भाद्र", "आश्विन", "कार्तिक", "मंसिर", "पौष", "माघ",
    "फाल्गुन", "चैत्र",
];

pub const AD_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Invalid date format: '{0}' (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),
    #[error("No such date: {0}")]
    NoSuchDate(String),
    #[error("Date outside supported range: {0}")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calendar {
    /// Bikram Sambat.
    #[default]
    Bs,
    /// Anno Domini (Gregorian).
    Ad,
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calendar::Bs => write!(f, "BS"),
            Calendar::Ad => write!(f, "AD"),
        }
    }
}

impl FromStr for Calendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bs" => Ok(Calendar::Bs),
            "ad" => Ok(Calendar::Ad),
            other => Err(format!("Unknown calendar: '{other}'")),
        }
    }
}

impl Calendar {
    pub fn other(self) -> Calendar {
        match self {
            Calendar::Bs => Calendar::Ad,
            Calendar::Ad => Calendar::Bs,
        }
    }

    /// Renders a stored (AD) date as a zero-padded `YYYY-MM-DD` string in this
    /// calendar. Equal-width output keeps string ordering equal to date order.
    pub fn render(self, date: NaiveDate) -> Result<String, DateError> {
        match self {
            Calendar::Ad => Ok(format_iso(date)),
            Calendar::Bs => Ok(to_bs(date)?.to_string()),
        }
    }

    /// Parses a `YYYY-MM-DD` string written in this calendar into the stored
    /// (AD) date.
    pub fn parse(self, input: &str) -> Result<NaiveDate, DateError> {
        match self {
            Calendar::Ad => parse_ad(input),
            Calendar::Bs => to_ad(input.parse()?),
        }
    }

    /// Rewrites a date string in this calendar in the zero-padded form
    /// `render` produces, so `2080-1-5` becomes `2080-01-05`. BS input is
    /// only checked for shape, not for an AD counterpart.
    pub fn normalize(self, input: &str) -> Result<String, DateError> {
        match self {
            Calendar::Ad => parse_ad(input).map(format_iso),
            Calendar::Bs => input.parse::<BsDate>().map(|d| d.to_string()),
        }
    }

    /// Re-expresses a date string written in `from` as a string in `to`.
    /// Empty input stays empty.
    pub fn convert(input: &str, from: Calendar, to: Calendar) -> Result<String, DateError> {
        if input.trim().is_empty() {
            return Ok(String::new());
        }
        if from == to {
            return Ok(input.to_string());
        }
        to.render(from.parse(input)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BsDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BsDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        if !(1..=12).contains(&month) || !(1..=32).contains(&day) {
            return Err(DateError::InvalidDateFormat(format!(
                "{year:04}-{month:02}-{day:02}"
            )));
        }
        Ok(BsDate { year, month, day })
    }

    pub fn month_name(self) -> &'static str {
        (self.month as usize)
            .checked_sub(1)
            .and_then(|i| BS_MONTHS.get(i))
            .copied()
            .unwrap_or("?")
    }
}

impl fmt::Display for BsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for BsDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month, day) = split_ymd(s)?;
        BsDate::new(year, month, day)
    }
}

/// Splits a `YYYY-MM-DD` string into numeric components.
fn split_ymd(input: &str) -> Result<(i32, u32, u32), DateError> {
    let invalid = || DateError::InvalidDateFormat(input.to_string());

    let parts: Vec<&str> = input.trim().split('-').collect();
    let &[y, m, d] = parts.as_slice() else {
        return Err(invalid());
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(all_digits(y) && all_digits(m) && all_digits(d)) {
        return Err(invalid());
    }

    let year = y.parse().map_err(|_| invalid())?;
    let month = m.parse().map_err(|_| invalid())?;
    let day = d.parse().map_err(|_| invalid())?;
    Ok((year, month, day))
}

/// Parses a strict `YYYY-MM-DD` AD date.
pub fn parse_ad(input: &str) -> Result<NaiveDate, DateError> {
    let (year, month, day) = split_ymd(input)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(DateError::InvalidDateFormat(input.to_string()));
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateError::NoSuchDate(input.trim().to_string()))
}

pub fn format_iso(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// AD → BS.
pub fn to_bs(date: NaiveDate) -> Result<BsDate, DateError> {
    if !(MIN_AD_YEAR..=MAX_AD_YEAR).contains(&date.year()) {
        return Err(DateError::OutOfRange(format_iso(date)));
    }
    Ok(BsDate {
        year: date.year() + BS_YEAR_OFFSET,
        month: date.month(),
        day: date.day(),
    })
}

/// BS → AD. Fails when the shifted date does not exist (e.g. BS 2081-02-29,
/// since AD 2025 is not a leap year).
pub fn to_ad(date: BsDate) -> Result<NaiveDate, DateError> {
    let year = date.year - BS_YEAR_OFFSET;
    if !(MIN_AD_YEAR..=MAX_AD_YEAR).contains(&year) {
        return Err(DateError::OutOfRange(date.to_string()));
    }
    NaiveDate::from_ymd_opt(year, date.month, date.day)
        .ok_or_else(|| DateError::NoSuchDate(format!("{date} (BS)")))
}

/// `"पौष 15, 2080"`
pub fn format_bs(date: BsDate) -> String {
    format!("{} {}, {}", date.month_name(), date.day, date.year)
}

/// `"Dec 30, 2023"`
pub fn format_ad(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        AD_MONTHS[date.month0() as usize],
        date.day(),
        date.year()
    )
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn current_bs_date() -> Result<BsDate, DateError> {
    to_bs(today())
}
