use super::bar::Bar;
use anyhow::{Result, anyhow};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accepted lookback windows for historical bar requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackPeriod {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl LookbackPeriod {
    pub fn as_token(&self) -> &'static str {
        match self {
            LookbackPeriod::OneDay => "1d",
            LookbackPeriod::FiveDays => "5d",
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::ThreeYears => "3y",
            LookbackPeriod::FiveYears => "5y",
            LookbackPeriod::TenYears => "10y",
            LookbackPeriod::YearToDate => "ytd",
            LookbackPeriod::Max => "max",
        }
    }

    /// Returns all accepted periods, shortest first
    pub fn all() -> Vec<LookbackPeriod> {
        vec![
            LookbackPeriod::OneDay,
            LookbackPeriod::FiveDays,
            LookbackPeriod::OneMonth,
            LookbackPeriod::ThreeMonths,
            LookbackPeriod::SixMonths,
            LookbackPeriod::OneYear,
            LookbackPeriod::TwoYears,
            LookbackPeriod::ThreeYears,
            LookbackPeriod::FiveYears,
            LookbackPeriod::TenYears,
            LookbackPeriod::YearToDate,
            LookbackPeriod::Max,
        ]
    }

    /// First calendar date included in a window ending at `end`.
    ///
    /// Returns `None` for `Max` (no lower bound).
    pub fn start_date(&self, end: NaiveDate) -> Option<NaiveDate> {
        let months_back = |m: u32| end.checked_sub_months(Months::new(m));
        match self {
            LookbackPeriod::OneDay => Some(end),
            LookbackPeriod::FiveDays => end.checked_sub_days(chrono::Days::new(4)),
            LookbackPeriod::OneMonth => months_back(1),
            LookbackPeriod::ThreeMonths => months_back(3),
            LookbackPeriod::SixMonths => months_back(6),
            LookbackPeriod::OneYear => months_back(12),
            LookbackPeriod::TwoYears => months_back(24),
            LookbackPeriod::ThreeYears => months_back(36),
            LookbackPeriod::FiveYears => months_back(60),
            LookbackPeriod::TenYears => months_back(120),
            LookbackPeriod::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1),
            LookbackPeriod::Max => None,
        }
    }

    /// Trims an ascending bar slice to the window ending at its last bar.
    pub fn apply(&self, bars: &[Bar]) -> Vec<Bar> {
        let Some(last) = bars.last() else {
            return Vec::new();
        };
        match self.start_date(last.date) {
            Some(start) => bars.iter().filter(|b| b.date >= start).copied().collect(),
            None => bars.to_vec(),
        }
    }
}

impl FromStr for LookbackPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        LookbackPeriod::all()
            .into_iter()
            .find(|p| p.as_token() == s.trim().to_lowercase())
            .ok_or_else(|| {
                anyhow!(
                    "Invalid period: '{}'. Valid options: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 3y, 5y, 10y, ytd, max",
                    s
                )
            })
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}
