//! Configuration structures for post-processing and evaluation.

use serde::{Deserialize, Serialize};

use super::field::Field;
use crate::error::{InvexError, Result};

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Normalization and validation configuration.
    pub postprocessing: PostProcessingConfig,

    /// Ground truth comparison configuration.
    pub evaluation: EvaluationConfig,
}

/// Post-processing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessingConfig {
    pub date: DateConfig,
    pub amount: AmountConfig,
    pub validation: ValidationConfig,
}

/// Date normalization and validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Canonical output format (strftime syntax).
    pub output_format: String,

    /// Explicit input formats, tried in order.
    pub input_formats: Vec<String>,

    /// Earliest year a valid invoice date may have.
    pub min_year: i32,

    /// Latest year a valid invoice date may have.
    pub max_year: i32,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            output_format: "%Y-%m-%d".to_string(),
            input_formats: [
                "%m/%d/%Y",
                "%d/%m/%Y",
                "%Y-%m-%d",
                "%B %d, %Y",
                "%b %d, %Y",
                "%d %B %Y",
                "%d-%m-%Y",
                "%m-%d-%Y",
                "%d.%m.%Y",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_year: 2000,
            max_year: 2100,
        }
    }
}

/// How normalized amounts are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountOutput {
    /// Fixed point with two decimals.
    #[default]
    Float,
    /// The cleaned numeric string as found.
    String,
}

/// Amount normalization and validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountConfig {
    /// Currency symbols removed before parsing.
    pub currency_symbols: Vec<String>,

    /// Currency codes removed before parsing (whole words, any case).
    pub currency_codes: Vec<String>,

    /// Decimal separator of the canonical form.
    pub decimal_separator: char,

    /// Thousands separator removed before parsing.
    pub thousands_separator: char,

    /// Output rendering.
    pub output_format: AmountOutput,

    /// Largest amount accepted by validation.
    pub max_amount: f64,
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            currency_symbols: ["$", "€", "£", "¥", "₹", "₽", "₿", "฿", "₫", "₴", "₦"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            currency_codes: ["USD", "EUR", "GBP", "JPY", "INR", "CAD", "AUD", "CNY", "RUB"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            decimal_separator: '.',
            thousands_separator: ',',
            output_format: AmountOutput::Float,
            max_amount: 1_000_000_000.0,
        }
    }
}

/// Record validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fields that must be present.
    pub required_fields: Vec<Field>,

    /// Minimum acceptable model confidence (0.0 - 1.0).
    pub confidence_threshold: f64,

    /// Copy missing required fields into the record warnings.
    pub flag_missing: bool,

    /// Minimum trimmed length of identifiers and names.
    pub min_text_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: vec![Field::InvoiceNumber, Field::TotalAmount],
            confidence_threshold: 0.5,
            flag_missing: true,
            min_text_length: 2,
        }
    }
}

/// Ground truth comparison configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Fields to evaluate.
    pub fields: Vec<Field>,

    /// Compare values case-sensitively.
    pub case_sensitive: bool,

    /// Collapse whitespace runs before comparing.
    pub normalize_whitespace: bool,

    /// Similarity (0.0 - 1.0) from which a mismatch counts as a partial match.
    pub partial_match_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            fields: Field::ALL.to_vec(),
            case_sensitive: false,
            normalize_whitespace: true,
            partial_match_threshold: 0.8,
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let date = &self.postprocessing.date;
        if date.min_year > date.max_year {
            return Err(InvexError::Config(format!(
                "date.min_year ({}) is after date.max_year ({})",
                date.min_year, date.max_year
            )));
        }

        let amount = &self.postprocessing.amount;
        for (name, sep) in [
            ("decimal_separator", amount.decimal_separator),
            ("thousands_separator", amount.thousands_separator),
        ] {
            if sep != '.' && sep != ',' {
                return Err(InvexError::Config(format!(
                    "amount.{name} must be '.' or ',', got {sep:?}"
                )));
            }
        }
        if amount.decimal_separator == amount.thousands_separator {
            return Err(InvexError::Config(
                "amount.decimal_separator and amount.thousands_separator must differ".to_string(),
            ));
        }

        let threshold = self.postprocessing.validation.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InvexError::Config(format!(
                "validation.confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }

        let partial = self.evaluation.partial_match_threshold;
        if !(0.0..=1.0).contains(&partial) {
            return Err(InvexError::Config(format!(
                "evaluation.partial_match_threshold must be within [0, 1], got {partial}"
            )));
        }

        Ok(())
    }
}
