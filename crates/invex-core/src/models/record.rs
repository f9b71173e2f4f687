//! Extraction and ground truth records.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::field::Field;

/// Per-field confidence scores (0.0 - 1.0).
pub type ConfidenceScores = BTreeMap<Field, f64>;

/// Read access to the six canonical field values of a record.
///
/// Implemented by everything the metrics engine can compare, so that
/// predictions and ground truth do not need to share a concrete type.
pub trait FieldValues {
    /// Raw value of a field, if present.
    fn value(&self, field: Field) -> Option<&str>;

    /// Source document the values belong to.
    fn source_file(&self) -> Option<&str> {
        None
    }
}

/// Whether a value counts as absent.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// The result of invoice field extraction for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRecord {
    /// Unique invoice identifier.
    pub invoice_number: Option<String>,

    /// Date the invoice was issued.
    pub invoice_date: Option<String>,

    /// Name of the seller.
    pub vendor_name: Option<String>,

    /// Name of the buyer.
    pub customer_name: Option<String>,

    /// Total amount due.
    pub total_amount: Option<String>,

    /// Payment due date.
    pub payment_due_date: Option<String>,

    /// Model confidence for each field. Unknown keys are dropped on load.
    #[serde(deserialize_with = "deserialize_scores")]
    pub confidence_scores: ConfidenceScores,

    /// Raw model outputs before post-processing.
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub raw_extractions: serde_json::Map<String, serde_json::Value>,

    /// Source filename.
    pub source_file: Option<String>,

    /// When extraction was performed (ISO 8601).
    pub extraction_timestamp: Option<String>,

    /// Name of the model used.
    pub model_name: Option<String>,

    /// Extraction time in seconds.
    pub processing_time: f64,

    /// Whether extraction was successful.
    pub success: bool,

    /// Errors encountered.
    pub errors: Vec<String>,

    /// Non-fatal issues encountered.
    pub warnings: Vec<String>,
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self {
            invoice_number: None,
            invoice_date: None,
            vendor_name: None,
            customer_name: None,
            total_amount: None,
            payment_due_date: None,
            confidence_scores: ConfidenceScores::new(),
            raw_extractions: serde_json::Map::new(),
            source_file: None,
            extraction_timestamp: None,
            model_name: None,
            processing_time: 0.0,
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ExtractionRecord {
    /// Create an empty record for a source file.
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: Some(source_file.into()),
            ..Self::default()
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Set a field confidence.
    pub fn with_confidence(mut self, field: Field, confidence: f64) -> Self {
        self.confidence_scores.insert(field, confidence);
        self
    }

    /// Value of a field.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Replace the value of a field.
    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::InvoiceNumber => &self.invoice_number,
            Field::InvoiceDate => &self.invoice_date,
            Field::VendorName => &self.vendor_name,
            Field::CustomerName => &self.customer_name,
            Field::TotalAmount => &self.total_amount,
            Field::PaymentDueDate => &self.payment_due_date,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::InvoiceNumber => &mut self.invoice_number,
            Field::InvoiceDate => &mut self.invoice_date,
            Field::VendorName => &mut self.vendor_name,
            Field::CustomerName => &mut self.customer_name,
            Field::TotalAmount => &mut self.total_amount,
            Field::PaymentDueDate => &mut self.payment_due_date,
        }
    }

    /// All field values in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        Field::ALL.into_iter().map(|field| (field, self.get(field)))
    }

    /// Fields without a value.
    pub fn missing_fields(&self) -> Vec<Field> {
        self.fields()
            .filter(|(_, value)| is_blank(*value))
            .map(|(field, _)| field)
            .collect()
    }

    /// Fields with a value.
    pub fn extracted_fields(&self) -> Vec<(Field, &str)> {
        self.fields()
            .filter_map(|(field, value)| value.filter(|v| !v.trim().is_empty()).map(|v| (field, v)))
            .collect()
    }

    /// Percentage (0 - 100) of fields that were extracted.
    pub fn extraction_rate(&self) -> f64 {
        let extracted = self.extracted_fields().len();
        extracted as f64 / Field::ALL.len() as f64 * 100.0
    }

    /// Mean confidence over extracted fields that carry a score.
    pub fn average_confidence(&self) -> f64 {
        let scores: Vec<f64> = self
            .extracted_fields()
            .into_iter()
            .filter_map(|(field, _)| self.confidence_scores.get(&field).copied())
            .collect();

        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// Confidence for a field, 0.0 when unknown.
    pub fn confidence(&self, field: Field) -> f64 {
        self.confidence_scores.get(&field).copied().unwrap_or(0.0)
    }

    /// Add an error and mark the record as unsuccessful.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }

    /// Add a warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

impl FieldValues for ExtractionRecord {
    fn value(&self, field: Field) -> Option<&str> {
        self.get(field)
    }

    fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}

/// Reference values for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroundTruthRecord {
    /// Source filename the record describes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Expected field values.
    #[serde(flatten)]
    pub values: BTreeMap<Field, String>,
}

impl GroundTruthRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    /// Whether every canonical field has a non-blank value.
    pub fn is_complete(&self) -> bool {
        Field::ALL
            .into_iter()
            .all(|field| !is_blank(self.value(field)))
    }
}

impl FieldValues for GroundTruthRecord {
    fn value(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}

impl FieldValues for BTreeMap<Field, String> {
    fn value(&self, field: Field) -> Option<&str> {
        self.get(&field).map(String::as_str)
    }
}

fn deserialize_scores<'de, D>(deserializer: D) -> Result<ConfidenceScores, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, f64>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, score)| name.parse::<Field>().ok().map(|field| (field, score)))
        .collect())
}
