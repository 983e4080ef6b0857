use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// A calendar month. Aggregations treat it as the half-open date range
/// `[first_day, next.first_day)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }

        Some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::containing(today())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        first_of_month(self.year, self.month)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Start (inclusive) and end (exclusive) dates of the month.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.next().first_day())
    }

    /// The `count` months ending with this one, oldest first.
    pub fn trailing(&self, count: usize) -> Vec<MonthPeriod> {
        let mut periods = Vec::with_capacity(count);
        let mut period = *self;

        for _ in 0..count {
            periods.push(period);
            period = period.previous();
        }

        periods.reverse();
        periods
    }

    pub fn months_of_year(year: i32) -> Vec<MonthPeriod> {
        (1..=12).map(|month| MonthPeriod { year, month }).collect()
    }

    /// "Jan"
    pub fn short_label(&self) -> String {
        self.first_day().format("%b").to_string()
    }

    /// "January"
    pub fn long_label(&self) -> String {
        self.first_day().format("%B").to_string()
    }

    /// "January 2026"
    pub fn title(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Start (inclusive) and end (exclusive) dates of a calendar year.
pub fn year_range(year: i32) -> (NaiveDate, NaiveDate) {
    (first_of_month(year, 1), first_of_month(year + 1, 1))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Years reachable from a MonthPeriod are well inside chrono's supported range
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}
