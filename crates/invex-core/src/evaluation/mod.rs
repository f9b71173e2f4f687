//! Scoring extraction output against ground truth.

pub mod evaluator;
pub mod ground_truth;
pub mod metrics;
pub mod report;
pub mod similarity;

pub use evaluator::{Evaluator, SampleComparison};
pub use ground_truth::{GroundTruthSet, GroundTruthSummary};
pub use metrics::{EvaluationResult, FieldComparison, FieldMetrics, MetricsCalculator};
pub use report::ReportFormat;
