//! Date normalization.
//!
//! Dates are first matched against an ordered list of explicit formats. When
//! none applies, a permissive parse picks numbers and month names out of the
//! text, once reading ambiguous numeric dates month-first and once day-first.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::patterns::{date_patterns, month_from_name, DATE_TOKEN, ORDINAL_SUFFIX, TIME_OF_DAY};
use super::{collapse_whitespace, strip_prefix_ignore_case, Normalizer};
use crate::models::config::DateConfig;

/// Labels commonly left in front of extracted dates.
const DATE_PREFIXES: [&str; 5] = ["date:", "dated:", "invoice date:", "due date:", "on"];

/// Date field normalizer.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    output_format: String,
    input_formats: Vec<String>,
}

impl DateNormalizer {
    pub fn new(config: &DateConfig) -> Self {
        debug!("DateNormalizer initialized (output: {})", config.output_format);
        Self {
            output_format: config.output_format.clone(),
            input_formats: config.input_formats.clone(),
        }
    }

    /// Canonical output format.
    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    /// Normalize a date string to the configured output format.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        match self.parse(raw) {
            Some(date) => self.format(date),
            None => {
                debug!("Could not parse date: {}", raw);
                None
            }
        }
    }

    /// Parse a date string into a calendar date without formatting it.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let cleaned = clean_date_string(raw);
        self.parse_explicit(&cleaned)
            .or_else(|| parse_fuzzy(&cleaned, DateOrder::MonthFirst))
            .or_else(|| parse_fuzzy(&cleaned, DateOrder::DayFirst))
    }

    /// Find the first normalizable date in free text.
    pub fn extract_date(&self, text: &str) -> Option<String> {
        for pattern in date_patterns() {
            if let Some(m) = pattern.find(text) {
                if let Some(normalized) = self.normalize(m.as_str()) {
                    return Some(normalized);
                }
            }
        }

        self.normalize(text)
    }

    /// Check if a string represents a valid date.
    pub fn is_valid_date(&self, raw: &str) -> bool {
        self.normalize(raw).is_some()
    }

    fn parse_explicit(&self, s: &str) -> Option<NaiveDate> {
        self.input_formats.iter().find_map(|fmt| {
            let date = NaiveDate::parse_from_str(s, fmt).ok()?;
            // %Y must have consumed a four-digit year
            if fmt.contains("%Y") && date.year() < 1000 {
                return None;
            }
            Some(date)
        })
    }

    fn format(&self, date: NaiveDate) -> Option<String> {
        let mut out = String::new();
        match write!(out, "{}", date.format(&self.output_format)) {
            Ok(()) => Some(out),
            Err(_) => {
                debug!("Date formatting failed for format {}", self.output_format);
                None
            }
        }
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(&DateConfig::default())
    }
}

impl Normalizer for DateNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        DateNormalizer::normalize(self, raw)
    }

    fn extract(&self, text: &str) -> Option<String> {
        self.extract_date(text)
    }
}

/// Remove whitespace runs, leading labels and ordinal suffixes.
fn clean_date_string(raw: &str) -> String {
    let mut s = collapse_whitespace(raw);

    for prefix in DATE_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(&s, prefix) {
            s = rest.trim().to_string();
        }
    }

    ORDINAL_SUFFIX.replace_all(&s, "${1}").trim().to_string()
}

/// Reading of an all-numeric date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateOrder {
    MonthFirst,
    DayFirst,
}

#[derive(Debug, Clone, Copy)]
struct Number {
    value: u32,
    digits: usize,
}

impl Number {
    fn is_year_like(self) -> bool {
        self.digits >= 3 || self.value > 31
    }
}

/// Permissive parse that ignores words it does not understand.
fn parse_fuzzy(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let without_time = TIME_OF_DAY.replace_all(s, " ");

    let mut numbers = Vec::new();
    let mut month_name = None;
    for token in DATE_TOKEN.find_iter(&without_time) {
        let token = token.as_str();
        if token.as_bytes()[0].is_ascii_digit() {
            let value = token.parse::<u32>().ok()?;
            numbers.push(Number {
                value,
                digits: token.len(),
            });
        } else if month_name.is_none() {
            month_name = month_from_name(token);
        }
    }

    let (year, month, day) = match month_name {
        Some(month) => {
            let (day, year) = match numbers.as_slice() {
                [a, b, ..] if a.is_year_like() && !b.is_year_like() => (*b, *a),
                [a, b, ..] => (*a, *b),
                _ => return None,
            };
            (expand_year(year), month, day.value)
        }
        None => match numbers.as_slice() {
            [a, b, c] => numeric_date(*a, *b, *c, order),
            [_, _, _, ..] => anchor_on_year(&numbers, order)?,
            _ => return None,
        },
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Read three numbers as year, month and day.
fn numeric_date(a: Number, b: Number, c: Number, order: DateOrder) -> (i32, u32, u32) {
    if a.is_year_like() {
        return (expand_year(a), b.value, c.value);
    }
    match order {
        DateOrder::MonthFirst => (expand_year(c), a.value, b.value),
        DateOrder::DayFirst => (expand_year(c), b.value, a.value),
    }
}

/// Pick the date out of surplus numbers around a single four-digit year.
///
/// The year must lead the two numbers after it or trail the two before it.
fn anchor_on_year(numbers: &[Number], order: DateOrder) -> Option<(i32, u32, u32)> {
    let mut years = numbers.iter().enumerate().filter(|(_, n)| n.digits == 4);
    let (index, _) = years.next()?;
    if years.next().is_some() {
        return None;
    }

    let window = if index >= 2 {
        &numbers[index - 2..=index]
    } else if index == 0 {
        &numbers[..3]
    } else {
        return None;
    };

    match window {
        [a, b, c] => Some(numeric_date(*a, *b, *c, order)),
        _ => None,
    }
}

fn expand_year(year: Number) -> i32 {
    let value = year.value as i32;
    if year.digits <= 2 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if value <= 50 { 2000 + value } else { 1900 + value }
    } else {
        value
    }
}
