//! Field- and corpus-level extraction metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::similarity::similarity;
use crate::error::EvaluationError;
use crate::models::config::EvaluationConfig;
use crate::models::record::is_blank;
use crate::models::{ConfidenceScores, Field, FieldKind, FieldValues};
use crate::normalize::collapse_whitespace;
use crate::normalize::patterns::{NON_DECIMAL_CHARS, NON_DIGITS};

/// Metrics for one field across all samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetrics {
    pub field: Field,
    pub total_samples: usize,
    pub extracted_count: usize,
    pub correct_count: usize,
    pub partial_match_count: usize,
    pub missing_count: usize,
    /// Exact matches over all samples (0 - 1).
    pub accuracy: f64,
    /// Extracted samples over all samples (0 - 1).
    pub extraction_rate: f64,
    /// Exact or partial matches over all samples (0 - 1).
    pub partial_accuracy: f64,
    pub avg_confidence: f64,
}

impl FieldMetrics {
    pub fn new(field: Field, total_samples: usize) -> Self {
        Self {
            field,
            total_samples,
            extracted_count: 0,
            correct_count: 0,
            partial_match_count: 0,
            missing_count: 0,
            accuracy: 0.0,
            extraction_rate: 0.0,
            partial_accuracy: 0.0,
            avg_confidence: 0.0,
        }
    }

    fn finalize(&mut self) {
        if self.total_samples == 0 {
            return;
        }
        let total = self.total_samples as f64;
        self.extraction_rate = self.extracted_count as f64 / total;
        // Denominator is every sample, not just the extracted ones
        if self.extracted_count > 0 {
            self.accuracy = self.correct_count as f64 / total;
            self.partial_accuracy = self.partial_match_count as f64 / total;
        }
    }
}

/// Corpus-level evaluation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub field_metrics: BTreeMap<Field, FieldMetrics>,
    /// Unweighted mean of the per-field accuracies.
    pub overall_accuracy: f64,
    /// Unweighted mean of the per-field extraction rates.
    pub overall_extraction_rate: f64,
    /// Unweighted mean of the per-field confidences.
    pub avg_confidence: f64,
    pub total_samples: usize,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    /// A result for an empty corpus.
    pub fn empty() -> Self {
        Self {
            field_metrics: BTreeMap::new(),
            overall_accuracy: 0.0,
            overall_extraction_rate: 0.0,
            avg_confidence: 0.0,
            total_samples: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Comparison of one field of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub predicted: String,
    pub ground_truth: String,
    pub exact_match: bool,
    pub partial_match: bool,
    pub confidence: f64,
    pub extracted: bool,
}

/// Compares predictions with ground truth.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    fields: Vec<Field>,
    case_sensitive: bool,
    normalize_whitespace: bool,
    partial_match_threshold: f64,
}

impl MetricsCalculator {
    pub fn new(config: &EvaluationConfig) -> Self {
        let mut fields = Vec::with_capacity(config.fields.len());
        for field in &config.fields {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
        debug!("MetricsCalculator initialized (fields: {})", fields.len());

        Self {
            fields,
            case_sensitive: config.case_sensitive,
            normalize_whitespace: config.normalize_whitespace,
            partial_match_threshold: config.partial_match_threshold,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Evaluate predictions against ground truth, pairing them by position.
    pub fn evaluate<P, G>(
        &self,
        predictions: &[P],
        ground_truth: &[G],
        confidences: Option<&[ConfidenceScores]>,
    ) -> Result<EvaluationResult, EvaluationError>
    where
        P: FieldValues,
        G: FieldValues,
    {
        if predictions.len() != ground_truth.len() {
            return Err(EvaluationError::LengthMismatch {
                predictions: predictions.len(),
                ground_truth: ground_truth.len(),
            });
        }
        if let Some(confidences) = confidences {
            if confidences.len() != predictions.len() {
                return Err(EvaluationError::ConfidenceLengthMismatch {
                    predictions: predictions.len(),
                    confidences: confidences.len(),
                });
            }
        }

        let total_samples = predictions.len();
        if total_samples == 0 {
            return Ok(EvaluationResult::empty());
        }

        let mut field_metrics: BTreeMap<Field, FieldMetrics> = self
            .fields
            .iter()
            .map(|&field| (field, FieldMetrics::new(field, total_samples)))
            .collect();

        for (idx, (pred, gt)) in predictions.iter().zip(ground_truth).enumerate() {
            let scores = confidences.map(|c| &c[idx]);

            for &field in &self.fields {
                let Some(metrics) = field_metrics.get_mut(&field) else {
                    continue;
                };

                let confidence = scores
                    .and_then(|s| s.get(&field).copied())
                    .unwrap_or(0.0);
                if confidence > 0.0 {
                    // Running mean indexed by sample position
                    let i = idx as f64;
                    metrics.avg_confidence = (metrics.avg_confidence * i + confidence) / (i + 1.0);
                }

                let predicted = pred.value(field);
                if is_blank(predicted) {
                    metrics.missing_count += 1;
                    continue;
                }
                metrics.extracted_count += 1;

                let (exact, partial) = self.compare_values(
                    predicted.unwrap_or_default(),
                    gt.value(field).unwrap_or_default(),
                    field,
                );
                if exact {
                    metrics.correct_count += 1;
                }
                if partial {
                    metrics.partial_match_count += 1;
                }
            }
        }

        for metrics in field_metrics.values_mut() {
            metrics.finalize();
        }

        let num_fields = field_metrics.len().max(1) as f64;
        let mean = |f: fn(&FieldMetrics) -> f64| {
            field_metrics.values().map(f).sum::<f64>() / num_fields
        };

        let result = EvaluationResult {
            overall_accuracy: mean(|m| m.accuracy),
            overall_extraction_rate: mean(|m| m.extraction_rate),
            avg_confidence: mean(|m| m.avg_confidence),
            total_samples,
            timestamp: Utc::now(),
            field_metrics,
        };

        info!(
            "Evaluated {} samples: {:.1}% accuracy, {:.1}% extraction rate",
            result.total_samples,
            result.overall_accuracy * 100.0,
            result.overall_extraction_rate * 100.0
        );

        Ok(result)
    }

    /// Compare a single prediction with its ground truth, field by field.
    pub fn evaluate_single(
        &self,
        prediction: &impl FieldValues,
        ground_truth: &impl FieldValues,
        confidence: Option<&ConfidenceScores>,
    ) -> BTreeMap<Field, FieldComparison> {
        self.fields
            .iter()
            .map(|&field| {
                let predicted = prediction.value(field).unwrap_or_default();
                let expected = ground_truth.value(field).unwrap_or_default();
                let (exact_match, partial_match) = self.compare_values(predicted, expected, field);

                let comparison = FieldComparison {
                    predicted: predicted.to_string(),
                    ground_truth: expected.to_string(),
                    exact_match,
                    partial_match,
                    confidence: confidence
                        .and_then(|c| c.get(&field).copied())
                        .unwrap_or(0.0),
                    extracted: !is_blank(Some(predicted)),
                };
                (field, comparison)
            })
            .collect()
    }

    /// Compare two values of `field`, returning `(exact, partial)`.
    ///
    /// An exact match is always also a partial match.
    pub fn compare_values(
        &self,
        predicted: &str,
        ground_truth: &str,
        field: Field,
    ) -> (bool, bool) {
        if is_blank(Some(ground_truth)) {
            return (false, false);
        }

        let predicted = self.normalize_value(predicted, field);
        let ground_truth = self.normalize_value(ground_truth, field);

        if predicted == ground_truth {
            return (true, true);
        }

        let score = similarity(&predicted, &ground_truth);
        (false, score >= self.partial_match_threshold)
    }

    /// Comparison key of a value: case and whitespace folded, amounts reduced
    /// to a float representation and dates to their digits.
    pub fn normalize_value(&self, value: &str, field: Field) -> String {
        let mut value = value.trim().to_string();

        if !self.case_sensitive {
            value = value.to_lowercase();
        }
        if self.normalize_whitespace {
            value = collapse_whitespace(&value);
        }

        match field.kind() {
            FieldKind::Amount => {
                let numeric = NON_DECIMAL_CHARS.replace_all(&value, "").replace(',', ".");
                match numeric.parse::<f64>() {
                    Ok(amount) => format!("{amount:?}"),
                    Err(_) => numeric,
                }
            }
            FieldKind::Date => NON_DIGITS.replace_all(&value, "").into_owned(),
            FieldKind::Identifier | FieldKind::Name => value,
        }
    }
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new(&EvaluationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionRecord, GroundTruthRecord};
    use pretty_assertions::assert_eq;

    fn truth(number: &str, amount: &str) -> GroundTruthRecord {
        GroundTruthRecord::new()
            .with_field(Field::InvoiceNumber, number)
            .with_field(Field::TotalAmount, amount)
    }

    #[test]
    fn test_compare_values() {
        let calc = MetricsCalculator::default();
        assert_eq!(calc.compare_values("INV-001", "INV-001", Field::InvoiceNumber), (true, true));
        assert_eq!(calc.compare_values("INV-001", "", Field::InvoiceNumber), (false, false));
        assert_eq!(calc.compare_values("100.00", "100.50", Field::TotalAmount), (false, true));
        assert_eq!(calc.compare_values("$1,250.00", "1250", Field::TotalAmount), (false, false));
        assert_eq!(calc.compare_values("100", "100.00", Field::TotalAmount), (true, true));
        assert_eq!(calc.compare_values("ACME  Corp", "acme corp", Field::VendorName), (true, true));
        assert_eq!(calc.compare_values("2024-01-15", "2024/01/15", Field::InvoiceDate), (true, true));
        assert_eq!(calc.compare_values("Globex", "Initech", Field::VendorName), (false, false));
    }

    #[test]
    fn test_case_sensitive_comparison() {
        let config = EvaluationConfig {
            case_sensitive: true,
            ..EvaluationConfig::default()
        };
        let calc = MetricsCalculator::new(&config);
        assert_eq!(calc.compare_values("acme", "ACME", Field::VendorName), (false, false));
    }

    #[test]
    fn test_normalize_value() {
        let calc = MetricsCalculator::default();
        assert_eq!(calc.normalize_value(" $100.50 ", Field::TotalAmount), "100.5");
        assert_eq!(calc.normalize_value("1250", Field::TotalAmount), "1250.0");
        assert_eq!(calc.normalize_value("n/a", Field::TotalAmount), "");
        assert_eq!(calc.normalize_value("Jan 15, 2026", Field::InvoiceDate), "152026");
        assert_eq!(calc.normalize_value("  Big   Co ", Field::CustomerName), "big co");
    }

    #[test]
    fn test_accuracy_divides_by_all_samples() {
        let calc = MetricsCalculator::default();
        let predictions = vec![
            ExtractionRecord::default().with_field(Field::InvoiceNumber, "INV-1"),
            ExtractionRecord::default().with_field(Field::InvoiceNumber, "INV-X"),
            ExtractionRecord::default(),
            ExtractionRecord::default(),
        ];
        let truths = vec![
            truth("INV-1", "10"),
            truth("INV-2", "20"),
            truth("INV-3", "30"),
            truth("INV-4", "40"),
        ];

        let result = calc.evaluate(&predictions, &truths, None).unwrap();
        let m = &result.field_metrics[&Field::InvoiceNumber];
        assert_eq!(m.extracted_count, 2);
        assert_eq!(m.missing_count, 2);
        assert_eq!(m.correct_count, 1);
        // exact matches count as partial matches too
        assert_eq!(m.partial_match_count, 2);
        assert_eq!(m.accuracy, 0.25);
        assert_eq!(m.extraction_rate, 0.5);
        assert_eq!(m.partial_accuracy, 0.5);
        assert_eq!(result.total_samples, 4);
    }

    #[test]
    fn test_overall_accuracy_is_mean_of_fields() {
        let calc = MetricsCalculator::default();
        let predictions = vec![
            ExtractionRecord::default()
                .with_field(Field::InvoiceNumber, "INV-1")
                .with_field(Field::TotalAmount, "10.00"),
            ExtractionRecord::default().with_field(Field::InvoiceNumber, "INV-2"),
        ];
        let truths = vec![truth("INV-1", "10"), truth("INV-2", "20")];

        let result = calc.evaluate(&predictions, &truths, None).unwrap();
        let mean = result.field_metrics.values().map(|m| m.accuracy).sum::<f64>()
            / result.field_metrics.len() as f64;
        assert_eq!(result.overall_accuracy, mean);
        assert_eq!(result.field_metrics.len(), 6);
        assert_eq!(result.field_metrics[&Field::InvoiceNumber].accuracy, 1.0);
        assert_eq!(result.field_metrics[&Field::TotalAmount].accuracy, 0.5);
    }

    #[test]
    fn test_length_mismatch() {
        let calc = MetricsCalculator::default();
        let predictions = vec![ExtractionRecord::default(), ExtractionRecord::default()];
        let truths = vec![truth("a", "1"), truth("b", "2"), truth("c", "3")];

        let err = calc.evaluate(&predictions, &truths, None).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::LengthMismatch {
                predictions: 2,
                ground_truth: 3
            }
        );

        let truths = &truths[..2];
        let scores = vec![ConfidenceScores::new()];
        let err = calc.evaluate(&predictions, truths, Some(&scores)).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::ConfidenceLengthMismatch {
                predictions: 2,
                confidences: 1
            }
        );
    }

    #[test]
    fn test_empty_input() {
        let calc = MetricsCalculator::default();
        let result = calc
            .evaluate::<ExtractionRecord, GroundTruthRecord>(&[], &[], None)
            .unwrap();
        assert!(result.field_metrics.is_empty());
        assert_eq!(result.total_samples, 0);
        assert_eq!(result.overall_accuracy, 0.0);
    }

    #[test]
    fn test_running_confidence_mean() {
        let config = EvaluationConfig {
            fields: vec![Field::TotalAmount],
            ..EvaluationConfig::default()
        };
        let calc = MetricsCalculator::new(&config);
        let predictions = vec![ExtractionRecord::default(); 3];
        let truths = vec![GroundTruthRecord::new(); 3];
        let scores: Vec<ConfidenceScores> = [0.9, 0.0, 0.6]
            .into_iter()
            .map(|c| [(Field::TotalAmount, c)].into_iter().collect())
            .collect();

        let result = calc.evaluate(&predictions, &truths, Some(&scores)).unwrap();
        // (0.9 * 2 + 0.6) / 3, the zero score at index 1 is skipped
        let expected = (0.9 * 2.0 + 0.6) / 3.0;
        let m = &result.field_metrics[&Field::TotalAmount];
        assert!((m.avg_confidence - expected).abs() < 1e-12);
        assert_eq!(result.avg_confidence, m.avg_confidence);
    }

    #[test]
    fn test_evaluate_single() {
        let calc = MetricsCalculator::default();
        let prediction = ExtractionRecord::default()
            .with_field(Field::InvoiceNumber, "INV-001")
            .with_field(Field::TotalAmount, "100.00")
            .with_confidence(Field::InvoiceNumber, 0.9);
        let gt = truth("INV-001", "100.50");

        let comparison =
            calc.evaluate_single(&prediction, &gt, Some(&prediction.confidence_scores));
        let number = &comparison[&Field::InvoiceNumber];
        assert!(number.exact_match && number.partial_match && number.extracted);
        assert_eq!(number.confidence, 0.9);

        let amount = &comparison[&Field::TotalAmount];
        assert!(!amount.exact_match && amount.partial_match);

        let vendor = &comparison[&Field::VendorName];
        assert!(!vendor.extracted);
        assert_eq!(vendor.predicted, "");
    }
}
