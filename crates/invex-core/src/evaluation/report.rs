//! Rendering of evaluation results.

use std::path::Path;
use std::str::FromStr;

use tracing::info;

use super::metrics::EvaluationResult;
use crate::error::{InvexError, Result};

const RULE_WIDTH: usize = 60;

/// Output format of an evaluation report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl FromStr for ReportFormat {
    type Err = InvexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            other => Err(InvexError::Config(format!("unsupported report format: {other}"))),
        }
    }
}

/// Render a report in the requested format.
pub fn render(result: &EvaluationResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(result)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        ReportFormat::Html => Ok(render_html(result)),
    }
}

/// Render a report and write it to `path`, creating parent directories.
pub fn write_report(result: &EvaluationResult, format: ReportFormat, path: &Path) -> Result<()> {
    let report = render(result, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report)?;
    info!("Report saved to: {}", path.display());
    Ok(())
}

/// Plain-text report.
pub fn render_text(result: &EvaluationResult) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{heavy}\n"));
    out.push_str("EXTRACTION EVALUATION REPORT\n");
    out.push_str(&format!("{heavy}\n"));
    out.push_str(&format!("Timestamp: {}\n", result.timestamp.to_rfc3339()));
    out.push_str(&format!("Total Samples: {}\n", result.total_samples));
    out.push_str(&format!("{light}\n\n"));

    out.push_str("OVERALL METRICS:\n");
    out.push_str(&format!("  Accuracy:        {}\n", percent(result.overall_accuracy)));
    out.push_str(&format!(
        "  Extraction Rate: {}\n",
        percent(result.overall_extraction_rate)
    ));
    out.push_str(&format!("  Avg Confidence:  {:.2}\n\n", result.avg_confidence));

    out.push_str(&format!("{light}\n"));
    out.push_str("FIELD-LEVEL METRICS:\n\n");

    for (field, m) in &result.field_metrics {
        out.push_str(&format!("  {field}:\n"));
        out.push_str(&format!("    Accuracy:        {}\n", percent(m.accuracy)));
        out.push_str(&format!("    Extraction Rate: {}\n", percent(m.extraction_rate)));
        out.push_str(&format!("    Partial Match:   {}\n", percent(m.partial_accuracy)));
        out.push_str(&format!(
            "    Extracted/Total: {}/{}\n",
            m.extracted_count, m.total_samples
        ));
        out.push_str(&format!("    Avg Confidence:  {:.2}\n\n", m.avg_confidence));
    }

    out.push_str(&heavy);
    out
}

/// Self-contained HTML report.
pub fn render_html(result: &EvaluationResult) -> String {
    let mut out = String::from(HTML_HEAD);

    out.push_str(&format!(
        "    <p>Generated: {}</p>\n",
        result.timestamp.to_rfc3339()
    ));
    out.push_str("    <h2>Overall Metrics</h2>\n");
    for (value, label) in [
        (percent(result.overall_accuracy), "Accuracy"),
        (percent(result.overall_extraction_rate), "Extraction Rate"),
        (format!("{:.2}", result.avg_confidence), "Avg Confidence"),
        (result.total_samples.to_string(), "Total Samples"),
    ] {
        out.push_str("    <div class=\"metric-card\">\n");
        out.push_str(&format!("        <div class=\"metric-value\">{value}</div>\n"));
        out.push_str(&format!("        <div class=\"metric-label\">{label}</div>\n"));
        out.push_str("    </div>\n");
    }

    out.push_str(
        "    <h2>Field-Level Metrics</h2>\n    <table>\n        <tr>\n            \
         <th>Field</th>\n            <th>Accuracy</th>\n            <th>Extraction Rate</th>\n            \
         <th>Partial Match</th>\n            <th>Extracted</th>\n            <th>Correct</th>\n            \
         <th>Avg Confidence</th>\n        </tr>\n",
    );

    for (field, m) in &result.field_metrics {
        out.push_str("        <tr>\n");
        out.push_str(&format!("            <td>{}</td>\n", field.label()));
        out.push_str(&format!(
            "            <td class=\"{}\">{}</td>\n",
            accuracy_class(m.accuracy),
            percent(m.accuracy)
        ));
        out.push_str(&format!("            <td>{}</td>\n", percent(m.extraction_rate)));
        out.push_str(&format!("            <td>{}</td>\n", percent(m.partial_accuracy)));
        out.push_str(&format!(
            "            <td>{}/{}</td>\n",
            m.extracted_count, m.total_samples
        ));
        out.push_str(&format!("            <td>{}</td>\n", m.correct_count));
        out.push_str(&format!("            <td>{:.2}</td>\n", m.avg_confidence));
        out.push_str("        </tr>\n");
    }

    out.push_str("    </table>\n</body>\n</html>\n");
    out
}

/// CSS class for an accuracy cell.
pub fn accuracy_class(accuracy: f64) -> &'static str {
    if accuracy >= 0.9 {
        "good"
    } else if accuracy >= 0.7 {
        "medium"
    } else {
        "poor"
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Invoice Extraction Evaluation Report</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        h1 { color: #333; }
        h2 { color: #555; border-bottom: 2px solid #ddd; padding-bottom: 5px; }
        table { border-collapse: collapse; width: 100%; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 10px; text-align: left; }
        th { background-color: #4472C4; color: white; }
        tr:nth-child(even) { background-color: #f2f2f2; }
        .metric-card { display: inline-block; margin: 10px; padding: 15px;
                       background: #f8f9fa; border-radius: 5px; min-width: 150px; }
        .metric-value { font-size: 24px; font-weight: bold; color: #4472C4; }
        .metric-label { color: #666; }
        .good { color: #28a745; }
        .medium { color: #ffc107; }
        .poor { color: #dc3545; }
    </style>
</head>
<body>
    <h1>Invoice Extraction Evaluation Report</h1>
"#;
