//! Validation of canonical amounts.

use tracing::debug;

use super::Verdict;
use crate::models::config::AmountConfig;

/// Smallest and largest totals considered typical for an invoice.
const REASONABLE_TOTAL: std::ops::RangeInclusive<f64> = 10.0..=1_000_000.0;

/// Validates normalized amount strings.
#[derive(Debug, Clone)]
pub struct AmountValidator {
    max_amount: f64,
}

impl AmountValidator {
    pub fn new(config: &AmountConfig) -> Self {
        debug!("AmountValidator initialized (max: {})", config.max_amount);
        Self {
            max_amount: config.max_amount,
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        self.validate(value).0
    }

    /// Validate a normalized amount.
    pub fn validate(&self, value: &str) -> Verdict {
        if value.is_empty() {
            return (false, "Amount is empty".to_string());
        }

        let amount = match value.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() => amount,
            _ => return (false, format!("Could not parse amount: {value}")),
        };

        if amount < 0.0 {
            return (false, "Amount cannot be negative".to_string());
        }
        if amount > self.max_amount {
            return (false, format!("Amount {amount:?} exceeds maximum"));
        }

        (true, "Valid amount".to_string())
    }

    /// Whether the amount falls in the usual range of invoice totals.
    pub fn is_reasonable_total(&self, amount: f64) -> bool {
        REASONABLE_TOTAL.contains(&amount)
    }
}

impl Default for AmountValidator {
    fn default() -> Self {
        Self::new(&AmountConfig::default())
    }
}
