//! Core library for invoice extraction post-processing.
//!
//! This crate provides:
//! - Date and amount normalization into canonical forms
//! - Per-field and cross-field validation of extraction records
//! - A post-processor that normalizes, cleans and validates records
//! - Metrics against ground truth (exact and edit-distance partial matching)
//! - Ground truth loading (JSON, CSV) and report rendering

pub mod error;
pub mod evaluation;
pub mod models;
pub mod normalize;
pub mod postprocess;
pub mod validate;

pub use error::{EvaluationError, GroundTruthError, InvexError, Result};
pub use evaluation::{
    EvaluationResult, Evaluator, FieldComparison, FieldMetrics, GroundTruthSet, MetricsCalculator,
    ReportFormat, SampleComparison,
};
pub use models::{
    ConfidenceScores, ExtractionRecord, Field, FieldKind, FieldValues, GroundTruthRecord,
    InvexConfig,
};
pub use normalize::{AmountNormalizer, DateNormalizer, Normalizer};
pub use postprocess::{PostProcessor, ProcessedRecord};
pub use validate::{AmountValidator, DateValidator, FieldValidator, ValidationResult, Verdict};
