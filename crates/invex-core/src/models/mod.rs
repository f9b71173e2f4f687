//! Data models shared by the normalization, validation and evaluation layers.

pub mod config;
pub mod field;
pub mod record;

pub use config::InvexConfig;
pub use field::{Field, FieldKind};
pub use record::{ConfidenceScores, ExtractionRecord, FieldValues, GroundTruthRecord};
