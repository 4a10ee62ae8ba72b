//! Day-month-year dates used by yearly transactions
//!
//! Stored as `DD-MM-YYYY` text, which is not ISO-8601. Only the day and month
//! decide when a yearly transaction recurs; the year is kept for display.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Earliest year accepted in a yearly date
pub const MIN_YEAR: i32 = 2000;

/// A validated `DD-MM-YYYY` date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearlyDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl YearlyDate {
    /// Parse `DD-MM-YYYY`, validating ranges and the calendar
    pub fn parse(s: &str) -> Result<Self, YearlyDateError> {
        let invalid = || YearlyDateError::Format(s.to_string());

        let mut parts = s.trim().split('-');
        let (day, month, year) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(m), Some(y), None) => (d, m, y),
            _ => return Err(invalid()),
        };

        let day: u32 = day.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        if !(1..=31).contains(&day) {
            return Err(YearlyDateError::DayOutOfRange(day));
        }
        if !(1..=12).contains(&month) {
            return Err(YearlyDateError::MonthOutOfRange(month));
        }
        if year < MIN_YEAR {
            return Err(YearlyDateError::YearOutOfRange(year));
        }
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(YearlyDateError::NotACalendarDate(s.to_string()));
        }

        Ok(Self { day, month, year })
    }

    /// Whether `date` falls on this day and month, in any year
    pub fn recurs_on(&self, date: NaiveDate) -> bool {
        date.day() == self.day && date.month() == self.month
    }
}

impl fmt::Display for YearlyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.day, self.month, self.year)
    }
}

impl FromStr for YearlyDate {
    type Err = YearlyDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for YearlyDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }
}

/// Why a yearly date string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearlyDateError {
    Format(String),
    DayOutOfRange(u32),
    MonthOutOfRange(u32),
    YearOutOfRange(i32),
    NotACalendarDate(String),
}

impl fmt::Display for YearlyDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(s) => write!(f, "Expected DD-MM-YYYY, got '{}'", s),
            Self::DayOutOfRange(d) => write!(f, "Day {} is outside 1-31", d),
            Self::MonthOutOfRange(m) => write!(f, "Month {} is outside 1-12", m),
            Self::YearOutOfRange(y) => write!(f, "Year {} is before {}", y, MIN_YEAR),
            Self::NotACalendarDate(s) => write!(f, "'{}' is not a calendar date", s),
        }
    }
}

impl std::error::Error for YearlyDateError {}
