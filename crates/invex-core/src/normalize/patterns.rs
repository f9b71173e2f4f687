//! Common regex patterns for date and amount normalization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dates embedded in free text, tried in this order
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(
        r"(?i)\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*)\s+(\d{2,4})\b"
    ).unwrap();

    // Date cleanup
    pub static ref ORDINAL_SUFFIX: Regex = Regex::new(
        r"(?i)(\d+)(st|nd|rd|th)"
    ).unwrap();

    pub static ref TIME_OF_DAY: Regex = Regex::new(
        r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\.?)?"
    ).unwrap();

    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"\d+|[A-Za-z]+"
    ).unwrap();

    // Amounts embedded in free text, tried in this order
    pub static ref AMOUNT_WITH_SYMBOL: Regex = Regex::new(
        r"[$€£¥₹]?\s*[\d,]+\.?\d*"
    ).unwrap();

    pub static ref AMOUNT_WITH_CODE: Regex = Regex::new(
        r"(?i)[\d,]+\.?\d*\s*(?:USD|EUR|GBP|INR)?"
    ).unwrap();

    // Amount cleanup
    pub static ref NON_AMOUNT_CHARS: Regex = Regex::new(
        r"[^0-9,.\-]"
    ).unwrap();

    // Comparison keys used by the metrics engine
    pub static ref NON_DECIMAL_CHARS: Regex = Regex::new(
        r"[^0-9.,]"
    ).unwrap();

    pub static ref NON_DIGITS: Regex = Regex::new(
        r"[^0-9]"
    ).unwrap();
}

/// Ordered patterns used to locate a date inside free text.
pub fn date_patterns() -> [&'static Regex; 4] {
    [
        &DATE_NUMERIC,
        &DATE_ISO,
        &DATE_MONTH_DAY_YEAR,
        &DATE_DAY_MONTH_YEAR,
    ]
}

/// Ordered patterns used to locate an amount inside free text.
pub fn amount_patterns() -> [&'static Regex; 2] {
    [&AMOUNT_WITH_SYMBOL, &AMOUNT_WITH_CODE]
}

/// Month number for an English month name or its abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    if name == "sept" {
        return Some(9);
    }

    MONTHS
        .iter()
        .position(|month| month.starts_with(name.as_str()))
        .map(|idx| idx as u32 + 1)
}
