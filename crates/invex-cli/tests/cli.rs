use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `invex` with the user config directory pointed at `home`.
fn invex(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("invex").unwrap();
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

const PREDICTIONS: &str = r#"[
  {
    "source_file": "inv_a.pdf",
    "invoice_number": "INV-001",
    "invoice_date": "01/15/2026",
    "vendor_name": "Acme Corp",
    "total_amount": "$1,234.56",
    "confidence_scores": {"invoice_number": 0.95, "total_amount": 0.9}
  },
  {
    "source_file": "inv_b.pdf",
    "invoice_number": "INV-002",
    "total_amount": "99.00"
  }
]"#;

const GROUND_TRUTH: &str = "source_file,invoice_number,invoice_date,vendor_name,customer_name,total_amount,payment_due_date
inv_a.pdf,INV-001,2026-01-15,Acme Corp,,1234.56,
inv_b.pdf,INV-003,,,,99.00,
";

#[test]
fn normalize_date() {
    let home = TempDir::new().unwrap();
    invex(home.path())
        .args(["normalize", "date", "January 15, 2026"])
        .assert()
        .success()
        .stdout("2026-01-15\n");
}

#[test]
fn normalize_amount() {
    let home = TempDir::new().unwrap();
    invex(home.path())
        .args(["normalize", "amount", "€ 1.234,56"])
        .assert()
        .success()
        .stdout("1234.56\n");
}

#[test]
fn normalize_extracts_from_text() {
    let home = TempDir::new().unwrap();
    invex(home.path())
        .args(["normalize", "amount", "--extract", "Total due: $450.00 by Friday"])
        .assert()
        .success()
        .stdout("450.00\n");
}

#[test]
fn normalize_rejects_garbage() {
    let home = TempDir::new().unwrap();
    invex(home.path())
        .args(["normalize", "date", "not a date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not normalize"));
}

#[test]
fn process_writes_normalized_records() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("batch.json");
    fs::write(&input, PREDICTIONS).unwrap();
    let out_dir = work.path().join("out");

    invex(home.path())
        .arg("process")
        .arg(input.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--summary")
        .assert()
        .success();

    let output = fs::read_to_string(out_dir.join("batch.json")).unwrap();
    assert!(output.contains(r#""total_amount": "1234.56""#));
    assert!(output.contains(r#""invoice_date": "2026-01-15""#));
    assert!(output.contains(r#""is_valid": true"#));

    let summary = fs::read_to_string(out_dir.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.lines().next().unwrap().starts_with("filename,status,invoice_number"));
}

#[test]
fn process_reports_missing_required_fields() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("single.json");
    fs::write(&input, r#"{"vendor_name": "Acme Corp"}"#).unwrap();

    invex(home.path())
        .args(["process", input.to_str().unwrap(), "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Record: single.json"))
        .stdout(predicate::str::contains("Status: invalid"))
        .stderr(predicate::str::contains("Required field missing: invoice_number"));
}

#[test]
fn process_fails_without_matches() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let pattern = work.path().join("*.json");

    invex(home.path())
        .args(["process", pattern.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn evaluate_text_report() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let predictions = work.path().join("predictions.json");
    let truth = work.path().join("truth.csv");
    let details = work.path().join("details.json");
    fs::write(&predictions, PREDICTIONS).unwrap();
    fs::write(&truth, GROUND_TRUTH).unwrap();

    invex(home.path())
        .arg("evaluate")
        .arg(&predictions)
        .arg("--ground-truth")
        .arg(&truth)
        .arg("--details")
        .arg(&details)
        .arg("--postprocess")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXTRACTION EVALUATION REPORT"))
        .stdout(predicate::str::contains("Total Samples: 2"))
        .stdout(predicate::str::contains(
            "  total_amount:\n    Accuracy:        100.0%",
        ))
        .stdout(predicate::str::contains(
            "  invoice_number:\n    Accuracy:        50.0%",
        ));

    let details: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&details).unwrap()).unwrap();
    assert_eq!(details.as_array().unwrap().len(), 2);
    assert_eq!(details[1]["source_file"], "inv_b.pdf");
    assert_eq!(details[0]["extraction"]["total_amount"], "1234.56");
}

#[test]
fn evaluate_html_report_to_file() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let predictions = work.path().join("predictions.json");
    let truth = work.path().join("truth.csv");
    let report = work.path().join("reports").join("eval.html");
    fs::write(&predictions, PREDICTIONS).unwrap();
    fs::write(&truth, GROUND_TRUTH).unwrap();

    invex(home.path())
        .arg("evaluate")
        .arg(&predictions)
        .arg("-g")
        .arg(&truth)
        .args(["-f", "html", "-o"])
        .arg(&report)
        .assert()
        .success();

    let html = fs::read_to_string(&report).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<td>Invoice Number</td>"));
}

#[test]
fn evaluate_missing_ground_truth_file() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let predictions = work.path().join("predictions.json");
    fs::write(&predictions, PREDICTIONS).unwrap();

    invex(home.path())
        .arg("evaluate")
        .arg(&predictions)
        .arg("-g")
        .arg(work.path().join("missing.csv"))
        .assert()
        .failure();
}

#[test]
fn config_init_get_set() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom").join("config.json");
    let config = config.to_str().unwrap();

    invex(home.path())
        .args(["--config", config, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config))
        .stdout(predicate::str::contains("not created"));

    invex(home.path())
        .args(["--config", config, "config", "init"])
        .assert()
        .success();

    invex(home.path())
        .args(["--config", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    invex(home.path())
        .args(["--config", config, "config", "get", "evaluation.partial_match_threshold"])
        .assert()
        .success()
        .stdout("0.8\n");

    invex(home.path())
        .args(["--config", config, "config", "set", "evaluation.case_sensitive", "true"])
        .assert()
        .success();

    invex(home.path())
        .args(["--config", config, "config", "get", "evaluation.case_sensitive"])
        .assert()
        .success()
        .stdout("true\n");

    invex(home.path())
        .args(["--config", config, "config", "set", "evaluation.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn config_rejects_out_of_range_value() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    let config = config.to_str().unwrap();

    invex(home.path())
        .args([
            "--config",
            config,
            "config",
            "set",
            "evaluation.partial_match_threshold",
            "1.5",
        ])
        .assert()
        .failure();
}
