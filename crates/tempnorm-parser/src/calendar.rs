use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Builds a calendar date, returning `None` when the combination does not exist.
pub fn date_from_parts(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonthLabel {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthLabel {
    pub const ALL: [MonthLabel; 12] = [
        MonthLabel::January,
        MonthLabel::February,
        MonthLabel::March,
        MonthLabel::April,
        MonthLabel::May,
        MonthLabel::June,
        MonthLabel::July,
        MonthLabel::August,
        MonthLabel::September,
        MonthLabel::October,
        MonthLabel::November,
        MonthLabel::December,
    ];

    pub fn from_date(date: NaiveDate) -> Self {
        Self::ALL[date.month0() as usize]
    }

    /// Zero-based index, January = 0.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Calendar month number, January = 1.
    pub fn number(&self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonthLabel::January => "January",
            MonthLabel::February => "February",
            MonthLabel::March => "March",
            MonthLabel::April => "April",
            MonthLabel::May => "May",
            MonthLabel::June => "June",
            MonthLabel::July => "July",
            MonthLabel::August => "August",
            MonthLabel::September => "September",
            MonthLabel::October => "October",
            MonthLabel::November => "November",
            MonthLabel::December => "December",
        }
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
