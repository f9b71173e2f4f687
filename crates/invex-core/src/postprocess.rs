//! Post-processing of raw extraction records.
//!
//! A record moves through a fixed sequence of stages. Each stage consumes the
//! previous snapshot and returns a new one, so the caller's record is never
//! touched:
//!
//! ```text
//! Raw -> DatesNormalized -> AmountsNormalized -> TextCleaned -> Validated -> Done
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::config::PostProcessingConfig;
use crate::models::{ExtractionRecord, Field};
use crate::normalize::{collapse_whitespace, strip_prefix_ignore_case};
use crate::normalize::{AmountNormalizer, DateNormalizer};
use crate::validate::{FieldValidator, ValidationResult};

/// Labels commonly left in front of party names.
const NAME_PREFIXES: [&str; 6] = ["vendor:", "customer:", "bill to:", "ship to:", "from:", "to:"];

/// Punctuation trimmed from both ends of an invoice number.
const IDENTIFIER_TRIM: [char; 4] = ['.', ',', ';', ':'];

/// Maximum number of warnings echoed to the debug log per record.
const LOGGED_WARNINGS: usize = 5;

/// Processing stage of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    DatesNormalized,
    AmountsNormalized,
    TextCleaned,
    Validated,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Raw => "raw",
            Stage::DatesNormalized => "dates normalized",
            Stage::AmountsNormalized => "amounts normalized",
            Stage::TextCleaned => "text cleaned",
            Stage::Validated => "validated",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A normalized record together with its validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub record: ExtractionRecord,
    pub validation: ValidationResult,
}

/// Normalizes, cleans and validates extraction records.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    date_normalizer: DateNormalizer,
    amount_normalizer: AmountNormalizer,
    field_validator: FieldValidator,
    flag_missing: bool,
}

impl PostProcessor {
    pub fn new(config: &PostProcessingConfig) -> Self {
        info!("PostProcessor initialized");
        Self {
            date_normalizer: DateNormalizer::new(&config.date),
            amount_normalizer: AmountNormalizer::new(&config.amount),
            field_validator: FieldValidator::new(config),
            flag_missing: config.validation.flag_missing,
        }
    }

    /// Run the full pipeline on a copy of `record`.
    pub fn process(&self, record: &ExtractionRecord) -> ProcessedRecord {
        info!(
            "Processing extraction record for: {}",
            record.source_file.as_deref().unwrap_or("<unknown>")
        );

        let snapshot = record.clone();
        trace_stage(Stage::Raw);

        let snapshot = self.normalize_dates(snapshot);
        trace_stage(Stage::DatesNormalized);

        let snapshot = self.normalize_amounts(snapshot);
        trace_stage(Stage::AmountsNormalized);

        let snapshot = clean_text_fields(snapshot);
        trace_stage(Stage::TextCleaned);

        let validation = self.validate_record(&snapshot);
        trace_stage(Stage::Validated);

        let snapshot = if self.flag_missing {
            self.flag_missing_fields(snapshot)
        } else {
            snapshot
        };
        trace_stage(Stage::Done);

        log_summary(record, &snapshot, &validation);

        ProcessedRecord {
            record: snapshot,
            validation,
        }
    }

    /// Process several records, preserving input order.
    pub fn process_batch(&self, records: &[ExtractionRecord]) -> Vec<ProcessedRecord> {
        records.iter().map(|record| self.process(record)).collect()
    }

    pub fn normalize_date(&self, raw: &str) -> Option<String> {
        self.date_normalizer.normalize(raw)
    }

    pub fn normalize_amount(&self, raw: &str) -> Option<String> {
        self.amount_normalizer.normalize(raw)
    }

    pub fn date_normalizer(&self) -> &DateNormalizer {
        &self.date_normalizer
    }

    pub fn amount_normalizer(&self) -> &AmountNormalizer {
        &self.amount_normalizer
    }

    /// Validate a record as-is, without normalizing it first.
    pub fn validate_record(&self, record: &ExtractionRecord) -> ValidationResult {
        let mut validation = ValidationResult::new();

        for field in Field::ALL {
            let Some(value) = present(record, field) else {
                continue;
            };
            let (is_valid, message) = self.field_validator.validate_field(field, value);
            validation.add_field_result(field, is_valid, message);
        }

        for field in self.field_validator.check_required_fields(record) {
            validation.add_error(format!("Required field missing: {field}"));
        }

        for info in self.field_validator.check_confidence(&record.confidence_scores) {
            validation.add_warning(format!("Low confidence: {info}"));
        }

        if let (Some(invoice_date), Some(due_date)) = (
            present(record, Field::InvoiceDate),
            present(record, Field::PaymentDueDate),
        ) {
            let (is_valid, message) = self
                .field_validator
                .date_validator()
                .is_due_after_invoice(invoice_date, due_date);
            if !is_valid {
                validation.add_warning(message);
            }
        }

        validation
    }

    fn normalize_dates(&self, mut record: ExtractionRecord) -> ExtractionRecord {
        for field in [Field::InvoiceDate, Field::PaymentDueDate] {
            normalize_field(&mut record, field, |raw| self.date_normalizer.normalize(raw));
        }
        record
    }

    fn normalize_amounts(&self, mut record: ExtractionRecord) -> ExtractionRecord {
        normalize_field(&mut record, Field::TotalAmount, |raw| {
            self.amount_normalizer.normalize(raw)
        });
        record
    }

    fn flag_missing_fields(&self, mut record: ExtractionRecord) -> ExtractionRecord {
        for field in self.field_validator.check_required_fields(&record) {
            record.add_warning(format!("Missing required field: {field}"));
        }
        record
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(&PostProcessingConfig::default())
    }
}

fn trace_stage(stage: Stage) {
    debug!("Post-processing stage: {}", stage);
}

/// A non-empty value. Whitespace-only values still go through normalization
/// and validation so that they surface as warnings.
fn present(record: &ExtractionRecord, field: Field) -> Option<&str> {
    record.get(field).filter(|v| !v.is_empty())
}

/// Replace a field with its normalized form, or keep it and warn.
fn normalize_field(
    record: &mut ExtractionRecord,
    field: Field,
    normalize: impl Fn(&str) -> Option<String>,
) {
    let Some(original) = present(record, field).map(str::to_string) else {
        return;
    };

    match normalize(&original) {
        Some(normalized) => {
            if normalized != original {
                debug!("Normalized {}: '{}' -> '{}'", field, original, normalized);
            }
            record.set(field, Some(normalized));
        }
        None => record.add_warning(format!("Could not normalize {field}: '{original}'")),
    }
}

fn clean_text_fields(mut record: ExtractionRecord) -> ExtractionRecord {
    if let Some(number) = present(&record, Field::InvoiceNumber).map(clean_identifier) {
        record.set(Field::InvoiceNumber, Some(number));
    }

    for field in [Field::VendorName, Field::CustomerName] {
        if let Some(name) = present(&record, field).map(clean_name) {
            record.set(field, Some(name));
        }
    }

    record
}

/// Collapse whitespace and trim separator punctuation from both ends.
pub fn clean_identifier(text: &str) -> String {
    collapse_whitespace(text)
        .trim_matches(&IDENTIFIER_TRIM[..])
        .to_string()
}

/// Collapse whitespace, drop a leading label and fix shouting names.
///
/// All-caps names longer than five characters are title-cased. Shorter ones
/// are left alone since they are usually acronyms.
pub fn clean_name(name: &str) -> String {
    let mut name = collapse_whitespace(name);

    if let Some(rest) = NAME_PREFIXES
        .iter()
        .find_map(|prefix| strip_prefix_ignore_case(&name, prefix))
    {
        name = rest.trim().to_string();
    }

    if is_all_upper(&name) && name.chars().count() > 5 {
        name = title_case(&name);
    }

    name
}

fn is_all_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// Uppercase the first letter of every word and lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    out
}

fn log_summary(
    original: &ExtractionRecord,
    processed: &ExtractionRecord,
    validation: &ValidationResult,
) {
    let normalizations = [Field::InvoiceDate, Field::TotalAmount, Field::PaymentDueDate]
        .into_iter()
        .filter(|field| original.get(*field) != processed.get(*field))
        .count();

    info!(
        "Post-processing complete: {} normalizations, {} errors, {} warnings",
        normalizations,
        validation.errors.len(),
        validation.warnings.len()
    );

    for error in &validation.errors {
        warn!("Validation error: {}", error);
    }
    for warning in validation.warnings.iter().take(LOGGED_WARNINGS) {
        debug!("Validation warning: {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_record() -> ExtractionRecord {
        ExtractionRecord::new("invoice_001.pdf")
            .with_field(Field::InvoiceNumber, "  INV-2026-001: ")
            .with_field(Field::InvoiceDate, "January 15th, 2026")
            .with_field(Field::VendorName, "Vendor:  ACME   SUPPLIES LTD")
            .with_field(Field::CustomerName, "bill to: IBM")
            .with_field(Field::TotalAmount, "Total: $1,234.56")
            .with_field(Field::PaymentDueDate, "02/14/2026")
            .with_confidence(Field::InvoiceNumber, 0.92)
            .with_confidence(Field::TotalAmount, 0.88)
    }

    #[test]
    fn test_process_normalizes_and_cleans() {
        let processor = PostProcessor::default();
        let out = processor.process(&raw_record());

        assert_eq!(out.record.get(Field::InvoiceNumber), Some("INV-2026-001"));
        assert_eq!(out.record.get(Field::InvoiceDate), Some("2026-01-15"));
        assert_eq!(out.record.get(Field::VendorName), Some("Acme Supplies Ltd"));
        assert_eq!(out.record.get(Field::CustomerName), Some("IBM"));
        assert_eq!(out.record.get(Field::TotalAmount), Some("1234.56"));
        assert_eq!(out.record.get(Field::PaymentDueDate), Some("2026-02-14"));

        assert!(out.validation.is_valid);
        assert!(out.validation.errors.is_empty());
        assert!(out.validation.warnings.is_empty());
        assert_eq!(out.validation.field_results.len(), 6);
        assert!(out.record.warnings.is_empty());
    }

    #[test]
    fn test_whitespace_values_are_reported() {
        let processor = PostProcessor::default();
        let record = ExtractionRecord::new("blank.pdf")
            .with_field(Field::InvoiceNumber, "INV-1")
            .with_field(Field::InvoiceDate, "  ")
            .with_field(Field::TotalAmount, "  ")
            .with_field(Field::VendorName, "   ");
        let out = processor.process(&record);

        assert!(out
            .record
            .warnings
            .contains(&"Could not normalize invoice_date: '  '".to_string()));
        assert!(out
            .record
            .warnings
            .contains(&"Could not normalize total_amount: '  '".to_string()));
        assert!(!out.validation.field_results[&Field::InvoiceDate].0);
        assert!(!out.validation.field_results[&Field::TotalAmount].0);
        assert!(out
            .validation
            .errors
            .contains(&"Required field missing: total_amount".to_string()));

        // Cleaning empties the name, which is then skipped
        assert_eq!(out.record.get(Field::VendorName), Some(""));
        assert!(!out.validation.field_results.contains_key(&Field::VendorName));
    }

    #[test]
    fn test_process_does_not_touch_input() {
        let processor = PostProcessor::default();
        let input = raw_record();
        let before = input.clone();
        let _ = processor.process(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn test_unparsable_values_are_kept_with_warning() {
        let processor = PostProcessor::default();
        let record = ExtractionRecord::new("a.pdf")
            .with_field(Field::InvoiceNumber, "INV-9")
            .with_field(Field::InvoiceDate, "sometime soon")
            .with_field(Field::TotalAmount, "N/A");

        let out = processor.process(&record);
        assert_eq!(out.record.get(Field::InvoiceDate), Some("sometime soon"));
        assert_eq!(out.record.get(Field::TotalAmount), Some("N/A"));
        assert_eq!(
            out.record.warnings,
            vec![
                "Could not normalize invoice_date: 'sometime soon'".to_string(),
                "Could not normalize total_amount: 'N/A'".to_string(),
            ]
        );
        assert!(!out.validation.is_valid);
        assert!(out
            .validation
            .errors
            .contains(&"total_amount: Could not parse amount: N/A".to_string()));
    }

    #[test]
    fn test_missing_required_fields() {
        let processor = PostProcessor::default();
        let record = ExtractionRecord::new("b.pdf").with_field(Field::VendorName, "Globex");

        let out = processor.process(&record);
        assert_eq!(
            out.validation.errors,
            vec![
                "Required field missing: invoice_number".to_string(),
                "Required field missing: total_amount".to_string(),
            ]
        );
        assert_eq!(
            out.record.warnings,
            vec![
                "Missing required field: invoice_number".to_string(),
                "Missing required field: total_amount".to_string(),
            ]
        );
        assert!(out.record.success);
    }

    #[test]
    fn test_flag_missing_disabled() {
        let mut config = PostProcessingConfig::default();
        config.validation.flag_missing = false;
        let processor = PostProcessor::new(&config);

        let out = processor.process(&ExtractionRecord::new("c.pdf"));
        assert!(out.record.warnings.is_empty());
        assert_eq!(out.validation.errors.len(), 2);
    }

    #[test]
    fn test_low_confidence_and_date_order_warnings() {
        let processor = PostProcessor::default();
        let record = ExtractionRecord::new("d.pdf")
            .with_field(Field::InvoiceNumber, "INV-1")
            .with_field(Field::TotalAmount, "10")
            .with_field(Field::InvoiceDate, "2024-01-15")
            .with_field(Field::PaymentDueDate, "2024-01-10")
            .with_confidence(Field::TotalAmount, 0.2);

        let out = processor.process(&record);
        assert!(out.validation.is_valid);
        assert_eq!(
            out.validation.warnings,
            vec![
                "Low confidence: total_amount (0.20)".to_string(),
                "Due date is before invoice date".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_record_does_not_normalize() {
        let processor = PostProcessor::default();
        let record = ExtractionRecord::new("e.pdf")
            .with_field(Field::InvoiceNumber, "INV-1")
            .with_field(Field::TotalAmount, "$10");

        let validation = processor.validate_record(&record);
        assert_eq!(
            validation.field_results[&Field::TotalAmount],
            (false, "Could not parse amount: $10".to_string())
        );
    }

    #[test]
    fn test_process_batch_preserves_order() {
        let processor = PostProcessor::default();
        let records = vec![
            ExtractionRecord::new("1.pdf").with_field(Field::TotalAmount, "1"),
            ExtractionRecord::new("2.pdf").with_field(Field::TotalAmount, "2"),
        ];

        let out = processor.process_batch(&records);
        let sources: Vec<_> = out
            .iter()
            .map(|p| p.record.source_file.as_deref().unwrap())
            .collect();
        assert_eq!(sources, vec!["1.pdf", "2.pdf"]);
        assert_eq!(out[1].record.get(Field::TotalAmount), Some("2.00"));
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  From:   GLOBEX  CORPORATION "), "Globex Corporation");
        assert_eq!(clean_name("to: ACME"), "ACME");
        assert_eq!(clean_name("Initech LLC"), "Initech LLC");
        assert_eq!(clean_name("O'REILLY MEDIA"), "O'Reilly Media");
    }

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier(" ;INV  001. "), "INV 001");
        assert_eq!(clean_identifier("INV-001"), "INV-001");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("HELLO WORLD-WIDE"), "Hello World-Wide");
    }
}
