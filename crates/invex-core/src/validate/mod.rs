//! Semantic validation of normalized records.
//!
//! Validators return a [`Verdict`]: whether the value passed and a human
//! readable message. Per-record outcomes are collected in a
//! [`ValidationResult`].

pub mod amounts;
pub mod dates;

pub use amounts::AmountValidator;
pub use dates::DateValidator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::PostProcessingConfig;
use crate::models::record::is_blank;
use crate::models::{ConfidenceScores, Field, FieldValues};

/// Outcome of a single check: `(is_valid, message)`.
pub type Verdict = (bool, String);

/// Accumulated validation outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub field_results: BTreeMap<Field, Verdict>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            field_results: BTreeMap::new(),
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error and mark the result invalid.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    /// Add a warning. Warnings do not affect validity.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a field verdict. A failed verdict also becomes an error.
    pub fn add_field_result(&mut self, field: Field, is_valid: bool, message: impl Into<String>) {
        let message = message.into();
        if !is_valid {
            self.add_error(format!("{field}: {message}"));
        }
        self.field_results.insert(field, (is_valid, message));
    }
}

/// Per-field validation with dispatch on [`Field`].
#[derive(Debug, Clone)]
pub struct FieldValidator {
    required_fields: Vec<Field>,
    confidence_threshold: f64,
    min_text_length: usize,
    date_validator: DateValidator,
    amount_validator: AmountValidator,
}

impl FieldValidator {
    pub fn new(config: &PostProcessingConfig) -> Self {
        let validation = &config.validation;
        debug!(
            "FieldValidator initialized (required: {:?})",
            validation.required_fields
        );
        Self {
            required_fields: validation.required_fields.clone(),
            confidence_threshold: validation.confidence_threshold,
            min_text_length: validation.min_text_length,
            date_validator: DateValidator::new(&config.date),
            amount_validator: AmountValidator::new(&config.amount),
        }
    }

    pub fn date_validator(&self) -> &DateValidator {
        &self.date_validator
    }

    pub fn amount_validator(&self) -> &AmountValidator {
        &self.amount_validator
    }

    /// Validate a value according to the field it belongs to.
    pub fn validate_field(&self, field: Field, value: &str) -> Verdict {
        match field {
            Field::InvoiceNumber => self.validate_invoice_number(value),
            Field::InvoiceDate | Field::PaymentDueDate => self.date_validator.validate(value),
            Field::VendorName => self.validate_name("Vendor name", value),
            Field::CustomerName => self.validate_name("Customer name", value),
            Field::TotalAmount => self.amount_validator.validate(value),
        }
    }

    /// Validate a value keyed by name. Unknown names only need a value.
    pub fn validate_named(&self, name: &str, value: &str) -> Verdict {
        match name.parse::<Field>() {
            Ok(field) => self.validate_field(field, value),
            Err(_) if value.is_empty() => (false, "Field is empty".to_string()),
            Err(_) => (true, "Field has value".to_string()),
        }
    }

    pub fn validate_invoice_number(&self, value: &str) -> Verdict {
        if value.is_empty() {
            return (false, "Invoice number is empty".to_string());
        }
        if value.trim().chars().count() < self.min_text_length {
            return (false, "Invoice number too short".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_alphanumeric()) {
            return (
                false,
                "Invoice number must contain alphanumeric characters".to_string(),
            );
        }
        (true, "Valid invoice number".to_string())
    }

    fn validate_name(&self, label: &str, value: &str) -> Verdict {
        if value.is_empty() {
            return (false, format!("{label} is empty"));
        }
        if value.trim().chars().count() < self.min_text_length {
            return (false, format!("{label} too short"));
        }
        (true, format!("Valid {}", label.to_lowercase()))
    }

    /// Required fields that are absent or blank.
    pub fn check_required_fields(&self, record: &impl FieldValues) -> Vec<Field> {
        self.required_fields
            .iter()
            .copied()
            .filter(|field| is_blank(record.value(*field)))
            .collect()
    }

    /// Fields scored below the confidence threshold, as `"<field> (<score>)"`.
    pub fn check_confidence(&self, scores: &ConfidenceScores) -> Vec<String> {
        scores
            .iter()
            .filter(|(_, confidence)| **confidence < self.confidence_threshold)
            .map(|(field, confidence)| format!("{field} ({confidence:.2})"))
            .collect()
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new(&PostProcessingConfig::default())
    }
}
