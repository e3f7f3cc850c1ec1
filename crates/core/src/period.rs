use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month a remittance file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Rejects months outside 1..=12 and years chrono cannot represent.
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(BillingMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        BillingMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn start_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive end).
    pub fn end_date(self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn range(self) -> DateRange {
        DateRange::new(self.start_date(), self.end_date())
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }
}

impl FromStr for BillingMonth {
    type Err = String;

    /// Accepts `YYYY-MM` and `MMYY` (the stamp used in SIMT file names).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some((y, m)) = s.split_once('-') {
            y.parse::<i32>().ok().zip(m.parse::<u32>().ok())
        } else if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            let m = s[..2].parse::<u32>().ok();
            let y = s[2..].parse::<i32>().ok().map(|y| 2000 + y);
            y.zip(m)
        } else {
            None
        };
        parsed
            .and_then(|(y, m)| BillingMonth::new(y, m))
            .ok_or_else(|| format!("Invalid billing month: '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
