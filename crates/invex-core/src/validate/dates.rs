//! Validation of canonical dates.

use chrono::{Datelike, NaiveDate, ParseResult};
use tracing::debug;

use super::Verdict;
use crate::models::config::DateConfig;

/// Validates normalized date strings.
#[derive(Debug, Clone)]
pub struct DateValidator {
    date_format: String,
    min_year: i32,
    max_year: i32,
}

impl DateValidator {
    pub fn new(config: &DateConfig) -> Self {
        debug!("DateValidator initialized");
        Self {
            date_format: config.output_format.clone(),
            min_year: config.min_year,
            max_year: config.max_year,
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        self.validate(value).0
    }

    /// Validate a date in the canonical output format.
    pub fn validate(&self, value: &str) -> Verdict {
        if value.is_empty() {
            return (false, "Date is empty".to_string());
        }

        match self.parse(value) {
            Ok(date) if date.year() < self.min_year => {
                (false, format!("Year {} is too old", date.year()))
            }
            Ok(date) if date.year() > self.max_year => {
                (false, format!("Year {} is too far in future", date.year()))
            }
            Ok(_) => (true, "Valid date".to_string()),
            Err(e) => (false, format!("Invalid date format: {e}")),
        }
    }

    /// Whether the date lies strictly after `today`.
    pub fn is_future_date(&self, value: &str, today: NaiveDate) -> bool {
        self.parse(value).is_ok_and(|date| date > today)
    }

    /// Whether the date lies strictly before `today`.
    pub fn is_past_date(&self, value: &str, today: NaiveDate) -> bool {
        self.parse(value).is_ok_and(|date| date < today)
    }

    /// Check that the due date is not before the invoice date.
    ///
    /// Dates that do not parse are not held against the record.
    pub fn is_due_after_invoice(&self, invoice_date: &str, due_date: &str) -> Verdict {
        match (self.parse(invoice_date), self.parse(due_date)) {
            (Ok(invoice), Ok(due)) if due < invoice => {
                (false, "Due date is before invoice date".to_string())
            }
            (Ok(_), Ok(_)) => (true, "Valid date relationship".to_string()),
            _ => (true, "Could not validate date relationship".to_string()),
        }
    }

    fn parse(&self, value: &str) -> ParseResult<NaiveDate> {
        NaiveDate::parse_from_str(value, &self.date_format)
    }
}

impl Default for DateValidator {
    fn default() -> Self {
        Self::new(&DateConfig::default())
    }
}
