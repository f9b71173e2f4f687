//! Process command - normalize and validate extraction record files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use invex_core::{Field, PostProcessor, ProcessedRecord};

use super::{load_config, read_records};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input files or glob pattern (JSON extraction records)
    #[arg(required = true)]
    input: String,

    /// Output directory (default: stdout)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    records: Vec<ProcessedRecord>,
    error: Option<String>,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let processor = PostProcessor::new(&config.postprocessing);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    info!("Found {} files to process", files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        match read_records(&path) {
            Ok(mut records) => {
                // Records without a source are attributed to their file
                let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
                for record in records.iter_mut().filter(|r| r.source_file.is_none()) {
                    record.source_file = Some(file_name.to_string());
                }

                let records = processor.process_batch(&records);
                results.push(FileResult {
                    path,
                    records,
                    error: None,
                });
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), e);
                results.push(FileResult {
                    path,
                    records: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
            Err(e) => {
                pb.abandon();
                error!("Failed to process {}: {}", path.display(), e);
                anyhow::bail!("Processing failed for {}: {}", path.display(), e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    for result in results.iter().filter(|r| r.error.is_none()) {
        report_issues(result);

        let content = format_records(&result.records, args.format)?;
        match &args.output_dir {
            Some(output_dir) => {
                let stem = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("records");
                let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
            None => println!("{}", content),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let record_count: usize = results.iter().map(|r| r.records.len()).sum();
    let invalid_count = results
        .iter()
        .flat_map(|r| &r.records)
        .filter(|r| !r.validation.is_valid)
        .count();

    eprintln!(
        "{} Processed {} records from {} files in {:?}",
        style("✓").green(),
        record_count,
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} valid, {} invalid, {} files failed",
        style(record_count - invalid_count).green(),
        style(invalid_count).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn report_issues(result: &FileResult) {
    for processed in &result.records {
        let validation = &processed.validation;
        if validation.errors.is_empty() && validation.warnings.is_empty() {
            continue;
        }

        let source = processed
            .record
            .source_file
            .as_deref()
            .unwrap_or("<unknown>");
        eprintln!("{} {}", style("Validation issues:").yellow(), source);
        for issue in &validation.errors {
            eprintln!("  {} {}", style("✗").red(), issue);
        }
        for issue in &validation.warnings {
            eprintln!("  {} {}", style("!").yellow(), issue);
        }
    }
}

fn format_records(records: &[ProcessedRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => match records {
            [single] => Ok(serde_json::to_string_pretty(single)?),
            _ => Ok(serde_json::to_string_pretty(records)?),
        },
        OutputFormat::Csv => format_csv(records),
        OutputFormat::Text => Ok(format_text(records)),
    }
}

fn format_csv(records: &[ProcessedRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["source_file"];
    header.extend(Field::ALL.iter().map(|f| f.as_str()));
    header.extend(["is_valid", "errors", "warnings"]);
    wtr.write_record(&header)?;

    for processed in records {
        let record = &processed.record;
        let mut row = vec![record.source_file.clone().unwrap_or_default()];
        row.extend(
            Field::ALL
                .iter()
                .map(|&f| record.get(f).unwrap_or_default().to_string()),
        );
        row.push(processed.validation.is_valid.to_string());
        row.push(processed.validation.errors.join("; "));
        row.push(processed.validation.warnings.join("; "));
        wtr.write_record(&row)?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(records: &[ProcessedRecord]) -> String {
    let mut output = String::new();

    for processed in records {
        let record = &processed.record;
        output.push_str(&format!(
            "Record: {}\n",
            record.source_file.as_deref().unwrap_or("<unknown>")
        ));
        for (field, value) in record.fields() {
            output.push_str(&format!(
                "  {:<18} {}\n",
                format!("{}:", field.label()),
                value.unwrap_or("-")
            ));
        }

        let status = if processed.validation.is_valid {
            "valid"
        } else {
            "invalid"
        };
        output.push_str(&format!("  Status: {}\n", status));
        for issue in &processed.validation.errors {
            output.push_str(&format!("  Error: {}\n", issue));
        }
        for issue in &processed.validation.warnings {
            output.push_str(&format!("  Warning: {}\n", issue));
        }
        output.push('\n');
    }

    output
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(Field::ALL.iter().map(|f| f.as_str()));
    header.extend(["avg_confidence", "error_count", "warning_count", "error"]);
    wtr.write_record(&header)?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        if let Some(err) = &result.error {
            let mut row = vec![filename, "error".to_string()];
            row.extend(Field::ALL.iter().map(|_| String::new()));
            row.extend([String::new(), String::new(), String::new(), err.clone()]);
            wtr.write_record(&row)?;
            continue;
        }

        for processed in &result.records {
            let record = &processed.record;
            let status = if processed.validation.is_valid {
                "valid"
            } else {
                "invalid"
            };
            let mut row = vec![filename.clone(), status.to_string()];
            row.extend(
                Field::ALL
                    .iter()
                    .map(|&f| record.get(f).unwrap_or_default().to_string()),
            );
            row.push(format!("{:.2}", record.average_confidence()));
            row.push(processed.validation.errors.len().to_string());
            row.push(processed.validation.warnings.len().to_string());
            row.push(String::new());
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}
