use chrono::{Datelike, NaiveDate};

/// Calendar windows the dashboard reports against, anchored on `as_of`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportWindow {
    pub as_of: NaiveDate,
    pub month_start: NaiveDate,
}

impl ReportWindow {
    pub fn new(as_of: NaiveDate) -> Self {
        let month_start = as_of.with_day(1).unwrap_or(as_of);
        Self { as_of, month_start }
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.as_of
    }

    /// Same calendar month as `as_of`, including days after it.
    pub fn in_month(&self, date: NaiveDate) -> bool {
        date.year() == self.as_of.year() && date.month() == self.as_of.month()
    }
}
