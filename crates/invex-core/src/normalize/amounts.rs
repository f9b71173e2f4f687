//! Amount normalization.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::patterns::{amount_patterns, NON_AMOUNT_CHARS};
use super::{collapse_whitespace, strip_prefix_ignore_case, Normalizer};
use crate::models::config::{AmountConfig, AmountOutput};

/// Labels commonly left in front of extracted amounts.
const AMOUNT_PREFIXES: [&str; 5] = ["total:", "amount:", "total amount:", "due:", "balance:"];

/// Amount field normalizer.
#[derive(Debug, Clone)]
pub struct AmountNormalizer {
    currency_symbols: Vec<String>,
    currency_codes: Option<Regex>,
    decimal_separator: char,
    thousands_separator: char,
    output_format: AmountOutput,
}

impl AmountNormalizer {
    pub fn new(config: &AmountConfig) -> Self {
        let currency_codes = build_code_pattern(&config.currency_codes);
        debug!("AmountNormalizer initialized");
        Self {
            currency_symbols: config.currency_symbols.clone(),
            currency_codes,
            decimal_separator: config.decimal_separator,
            thousands_separator: config.thousands_separator,
            output_format: config.output_format,
        }
    }

    /// Normalize an amount string (e.g. "$1,234.56" becomes "1234.56").
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        let cleaned = self.clean_amount_string(raw);
        if cleaned.is_empty() {
            return None;
        }

        let numeric = self.canonical_separators(&cleaned);
        match numeric.parse::<f64>() {
            Ok(value) => Some(match self.output_format {
                AmountOutput::Float => format!("{value:.2}"),
                AmountOutput::String => numeric,
            }),
            Err(_) => {
                debug!("Could not parse amount: {}", numeric);
                None
            }
        }
    }

    /// Find the first positive amount in free text.
    pub fn extract_amount(&self, text: &str) -> Option<String> {
        for pattern in amount_patterns() {
            for m in pattern.find_iter(text) {
                let Some(normalized) = self.normalize(m.as_str()) else {
                    continue;
                };
                // Zero and negative tokens are rarely the amount of interest
                if normalized.parse::<f64>().is_ok_and(|value| value > 0.0) {
                    return Some(normalized);
                }
            }
        }

        self.normalize(text)
    }

    /// Check if a string represents a non-negative amount.
    pub fn is_valid_amount(&self, raw: &str) -> bool {
        self.to_f64(raw).is_some_and(|value| value >= 0.0)
    }

    /// Normalized amount as a float.
    pub fn to_f64(&self, raw: &str) -> Option<f64> {
        self.normalize(raw)?.parse().ok()
    }

    /// Normalized amount as an exact decimal.
    pub fn to_decimal(&self, raw: &str) -> Option<Decimal> {
        let normalized = self.normalize(raw)?;
        Decimal::from_str(&normalized)
            .ok()
            .or_else(|| normalized.parse::<f64>().ok().and_then(Decimal::from_f64))
    }

    fn clean_amount_string(&self, raw: &str) -> String {
        let mut s = collapse_whitespace(raw);

        for symbol in &self.currency_symbols {
            s = s.replace(symbol.as_str(), "");
        }

        if let Some(codes) = &self.currency_codes {
            s = codes.replace_all(&s, "").into_owned();
        }

        for prefix in AMOUNT_PREFIXES {
            if let Some(rest) = strip_prefix_ignore_case(&s, prefix) {
                s = rest.to_string();
            }
        }

        NON_AMOUNT_CHARS.replace_all(&s, "").trim().to_string()
    }

    /// Rewrite the cleaned string so that `.` is the only decimal mark.
    fn canonical_separators(&self, cleaned: &str) -> String {
        if self.decimal_separator == '.' {
            let us = convert_european(cleaned);
            us.replace(self.thousands_separator, "")
        } else {
            cleaned
                .replace(self.thousands_separator, "")
                .replace(self.decimal_separator, ".")
        }
    }
}

impl Default for AmountNormalizer {
    fn default() -> Self {
        Self::new(&AmountConfig::default())
    }
}

impl Normalizer for AmountNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        AmountNormalizer::normalize(self, raw)
    }

    fn extract(&self, text: &str) -> Option<String> {
        self.extract_amount(text)
    }
}

/// Convert "1.234,56" to "1234.56".
///
/// Applies only when there is exactly one comma, it comes after the last dot,
/// and it is followed by one or two digits.
fn convert_european(s: &str) -> String {
    if s.matches(',').count() == 1 {
        if let Some(comma) = s.rfind(',') {
            let after_last_dot = s.rfind('.').is_none_or(|dot| comma > dot);
            let fraction = &s[comma + 1..];
            let is_decimal = !fraction.is_empty()
                && fraction.len() <= 2
                && fraction.bytes().all(|b| b.is_ascii_digit());

            if after_last_dot && is_decimal {
                return s.replace('.', "").replace(',', ".");
            }
        }
    }
    s.to_string()
}

fn build_code_pattern(codes: &[String]) -> Option<Regex> {
    if codes.is_empty() {
        return None;
    }

    let alternatives: Vec<String> = codes.iter().map(|c| regex::escape(c)).collect();
    match Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Ignoring currency codes, pattern failed to compile: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizer() -> AmountNormalizer {
        AmountNormalizer::default()
    }

    #[test]
    fn test_normalize_us_format() {
        let n = normalizer();
        assert_eq!(n.normalize("$1,234.56").as_deref(), Some("1234.56"));
        assert_eq!(n.normalize("1234.5").as_deref(), Some("1234.50"));
        assert_eq!(n.normalize("USD 12,345,678.90").as_deref(), Some("12345678.90"));
        assert_eq!(n.normalize("Total: 99").as_deref(), Some("99.00"));
    }

    #[test]
    fn test_normalize_european_format() {
        let n = normalizer();
        assert_eq!(n.normalize("€ 1.234,56").as_deref(), Some("1234.56"));
        assert_eq!(n.normalize("1234,5 EUR").as_deref(), Some("1234.50"));
        assert_eq!(n.normalize("12.345.678,90").as_deref(), Some("12345678.90"));
    }

    #[test]
    fn test_comma_with_three_digits_is_thousands() {
        let n = normalizer();
        assert_eq!(n.normalize("1,234").as_deref(), Some("1234.00"));
        assert_eq!(n.normalize("£1,234,567").as_deref(), Some("1234567.00"));
    }

    #[test]
    fn test_currency_codes_are_whole_words() {
        let n = normalizer();
        assert_eq!(n.normalize("1,500.00 usd").as_deref(), Some("1500.00"));
        assert_eq!(n.normalize("Balance: inr 20").as_deref(), Some("20.00"));
    }

    #[test]
    fn test_negative_amounts_are_kept() {
        let n = normalizer();
        assert_eq!(n.normalize("-$50.00").as_deref(), Some("-50.00"));
        assert!(!n.is_valid_amount("-50"));
        assert!(n.is_valid_amount("$0.00"));
    }

    #[test]
    fn test_normalize_failures() {
        let n = normalizer();
        assert_eq!(n.normalize(""), None);
        assert_eq!(n.normalize("N/A"), None);
        assert_eq!(n.normalize("$"), None);
        assert_eq!(n.normalize("1.2.3"), None);
        assert_eq!(n.normalize("12-34"), None);
    }

    #[test]
    fn test_string_output_keeps_cleaned_number() {
        let config = AmountConfig {
            output_format: AmountOutput::String,
            ..AmountConfig::default()
        };
        let n = AmountNormalizer::new(&config);
        assert_eq!(n.normalize("$1,234.5").as_deref(), Some("1234.5"));
        assert_eq!(n.normalize("€ 1.234,56").as_deref(), Some("1234.56"));
    }

    #[test]
    fn test_configured_european_separators() {
        let config = AmountConfig {
            decimal_separator: ',',
            thousands_separator: '.',
            ..AmountConfig::default()
        };
        let n = AmountNormalizer::new(&config);
        assert_eq!(n.normalize("1.234.567,8").as_deref(), Some("1234567.80"));
    }

    #[test]
    fn test_extract_amount_from_text() {
        let n = normalizer();
        assert_eq!(
            n.extract_amount("Amount due: $1,234.56 by Friday").as_deref(),
            Some("1234.56")
        );
        assert_eq!(
            n.extract_amount("Pay 0 now, then 250.00 EUR later").as_deref(),
            Some("250.00")
        );
        assert_eq!(n.extract_amount("nothing to pay"), None);
    }

    #[test]
    fn test_to_decimal() {
        let n = normalizer();
        assert_eq!(n.to_decimal("$1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(n.to_decimal("abc"), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        for raw in ["$1,234.56", "€ 1.234,56", "-7", "0.5"] {
            let once = n.normalize(raw).unwrap();
            assert_eq!(n.normalize(&once), Some(once.clone()));
        }
    }
}
