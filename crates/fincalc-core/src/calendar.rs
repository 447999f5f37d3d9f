//! Calendar mapping for schedule rows.
//!
//! Schedules are simulated as 1-based month offsets from a start period;
//! this module maps offsets back to concrete (year, month-name) pairs and
//! handles fiscal-year bucketing.

use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::FinCalcResult;

/// A (year, month) pair. `month` is 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> FinCalcResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(FinCalcError::InvalidInput {
                field: "month".into(),
                reason: format!("month must be 1-12, got {month}"),
            });
        }
        Ok(Period { year, month })
    }

    /// Map a 1-based month offset from this period to a concrete period.
    /// Offset 1 is the start period itself. Roll-over is via integer
    /// division and modulo, never naive addition.
    pub fn offset(&self, month_offset: u32) -> Period {
        debug_assert!(month_offset >= 1, "month offsets are 1-based");
        let total = (self.month - 1) + month_offset.saturating_sub(1);
        Period {
            year: self.year + (total / 12) as i32,
            month: total % 12 + 1,
        }
    }

    /// Human month name ("January", ...).
    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    /// The calendar year in which the fiscal year containing this period
    /// begins. With an April start (fiscal_start_month = 4), January-March
    /// belong to the previous year's bucket.
    pub fn fiscal_year(&self, fiscal_start_month: u32) -> i32 {
        if self.month >= fiscal_start_month {
            self.year
        } else {
            self.year - 1
        }
    }
}

/// Month name for a 1-12 month number.
pub fn month_name(month: u32) -> &'static str {
    Month::try_from(month as u8)
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = FinCalcError;

    /// Parse a "YYYY-MM" string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s.split_once('-').ok_or_else(|| {
            FinCalcError::DateError(format!("expected YYYY-MM, got '{s}'"))
        })?;
        let year: i32 = y
            .parse()
            .map_err(|_| FinCalcError::DateError(format!("invalid year in '{s}'")))?;
        let month: u32 = m
            .parse()
            .map_err(|_| FinCalcError::DateError(format!("invalid month in '{s}'")))?;
        Period::new(year, month)
    }
}
