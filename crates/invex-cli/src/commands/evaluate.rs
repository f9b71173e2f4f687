//! Evaluate command - score extraction records against ground truth.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invex_core::evaluation::report::{self, ReportFormat};
use invex_core::{Evaluator, PostProcessor};

use super::{load_config, read_records};

/// Arguments for the evaluate command.
#[derive(Args)]
pub struct EvaluateArgs {
    /// Predictions file (JSON record or array of records)
    #[arg(required = true)]
    predictions: PathBuf,

    /// Ground truth file (JSON or CSV)
    #[arg(short, long)]
    ground_truth: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportKind,

    /// Report file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write per-sample comparisons as JSON
    #[arg(long)]
    details: Option<PathBuf>,

    /// Post-process predictions before scoring
    #[arg(long)]
    postprocess: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportKind {
    /// Plain text report
    Text,
    /// JSON metrics
    Json,
    /// Standalone HTML page
    Html,
}

impl From<ReportKind> for ReportFormat {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Text => ReportFormat::Text,
            ReportKind::Json => ReportFormat::Json,
            ReportKind::Html => ReportFormat::Html,
        }
    }
}

pub fn run(args: EvaluateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.predictions.exists() {
        anyhow::bail!("Predictions file not found: {}", args.predictions.display());
    }

    let mut records = read_records(&args.predictions)?;
    info!("Loaded {} predictions", records.len());

    if args.postprocess {
        let processor = PostProcessor::new(&config.postprocessing);
        records = processor
            .process_batch(&records)
            .into_iter()
            .map(|processed| processed.record)
            .collect();
        debug!("Post-processed {} predictions", records.len());
    }

    let mut evaluator = Evaluator::new(&config.evaluation);
    evaluator.load_ground_truth(&args.ground_truth)?;

    let result = evaluator.evaluate(&records)?;
    let format = ReportFormat::from(args.format);

    match &args.output {
        Some(path) => {
            report::write_report(&result, format, path)?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", report::render(&result, format)?),
    }

    if let Some(path) = &args.details {
        let details = evaluator.detailed_results(&records)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&details)?)?;
        eprintln!(
            "{} Detailed results written to {}",
            style("✓").green(),
            path.display()
        );
    }

    eprintln!(
        "{} Overall accuracy: {:.1}% on {} samples",
        style("ℹ").blue(),
        result.overall_accuracy * 100.0,
        result.total_samples
    );

    Ok(())
}
