//! Evaluation of extraction records against loaded ground truth.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ground_truth::GroundTruthSet;
use super::metrics::{EvaluationResult, FieldComparison, MetricsCalculator};
use crate::error::{EvaluationError, Result};
use crate::models::config::EvaluationConfig;
use crate::models::{ConfidenceScores, ExtractionRecord, Field, GroundTruthRecord};

/// Per-sample comparison used for detailed reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleComparison {
    pub sample_index: usize,
    pub source_file: String,
    pub extraction: ExtractionRecord,
    pub ground_truth: GroundTruthRecord,
    pub comparison: BTreeMap<Field, FieldComparison>,
}

/// Matches records with ground truth and scores them.
#[derive(Debug, Clone)]
pub struct Evaluator {
    calculator: MetricsCalculator,
    ground_truth: Option<GroundTruthSet>,
}

impl Evaluator {
    pub fn new(config: &EvaluationConfig) -> Self {
        debug!("Evaluator initialized");
        Self {
            calculator: MetricsCalculator::new(config),
            ground_truth: None,
        }
    }

    pub fn with_ground_truth(mut self, ground_truth: GroundTruthSet) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }

    /// Load ground truth from a file and report incomplete records.
    pub fn load_ground_truth(&mut self, path: &Path) -> Result<()> {
        let set = GroundTruthSet::load(path)?;
        let summary = set.validate();
        if summary.invalid_records > 0 {
            warn!(
                "Ground truth has {} incomplete records",
                summary.invalid_records
            );
        }
        self.ground_truth = Some(set);
        Ok(())
    }

    pub fn ground_truth(&self) -> Option<&GroundTruthSet> {
        self.ground_truth.as_ref()
    }

    pub fn calculator(&self) -> &MetricsCalculator {
        &self.calculator
    }

    /// Evaluate records against the loaded ground truth, matched by filename.
    pub fn evaluate(&self, records: &[ExtractionRecord]) -> Result<EvaluationResult> {
        let ground_truth = self.match_ground_truth(records)?;
        self.evaluate_against(records, &ground_truth)
    }

    /// Evaluate records against ground truth paired by position.
    pub fn evaluate_against(
        &self,
        records: &[ExtractionRecord],
        ground_truth: &[GroundTruthRecord],
    ) -> Result<EvaluationResult> {
        let confidences: Vec<ConfidenceScores> = records
            .iter()
            .map(|r| r.confidence_scores.clone())
            .collect();

        let result = self
            .calculator
            .evaluate(records, ground_truth, Some(&confidences))?;

        info!(
            "Evaluation complete: {:.1}% accuracy on {} samples",
            result.overall_accuracy * 100.0,
            result.total_samples
        );
        Ok(result)
    }

    /// Compare one record with its ground truth.
    ///
    /// Without an explicit reference the loaded set is searched by filename.
    pub fn evaluate_single(
        &self,
        record: &ExtractionRecord,
        ground_truth: Option<&GroundTruthRecord>,
    ) -> Result<BTreeMap<Field, FieldComparison>> {
        let matched;
        let ground_truth = match ground_truth {
            Some(gt) => gt,
            None => {
                matched = self.lookup(record)?;
                &matched
            }
        };

        Ok(self
            .calculator
            .evaluate_single(record, ground_truth, Some(&record.confidence_scores)))
    }

    /// Per-sample comparisons against the loaded ground truth.
    pub fn detailed_results(&self, records: &[ExtractionRecord]) -> Result<Vec<SampleComparison>> {
        records
            .iter()
            .enumerate()
            .map(|(sample_index, record)| {
                let ground_truth = self.lookup(record)?;
                let comparison = self.evaluate_single(record, Some(&ground_truth))?;
                Ok(SampleComparison {
                    sample_index,
                    source_file: record.source_file.clone().unwrap_or_default(),
                    extraction: record.clone(),
                    ground_truth,
                    comparison,
                })
            })
            .collect()
    }

    fn match_ground_truth(&self, records: &[ExtractionRecord]) -> Result<Vec<GroundTruthRecord>> {
        records.iter().map(|record| self.lookup(record)).collect()
    }

    /// Ground truth for a record, or an empty record when there is none.
    fn lookup(&self, record: &ExtractionRecord) -> Result<GroundTruthRecord> {
        let set = self
            .ground_truth
            .as_ref()
            .ok_or(EvaluationError::NoGroundTruth)?;

        let source = record.source_file.as_deref().unwrap_or_default();
        match set.get_by_filename(source) {
            Some(gt) => Ok(gt.clone()),
            None => {
                warn!("No ground truth for: {}", source);
                Ok(GroundTruthRecord::new())
            }
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(&EvaluationConfig::default())
    }
}
