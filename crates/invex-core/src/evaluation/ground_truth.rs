//! Ground truth loading and lookup.
//!
//! JSON files may hold an array of records, an object with a `records`
//! array, or an object keyed by source filename. CSV files and spreadsheets
//! (first worksheet) need a header row naming the fields.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{GroundTruthError, InvexError, Result};
use crate::models::record::is_blank;
use crate::models::{Field, FieldValues, GroundTruthRecord};

/// Keys naming the document a record belongs to, in order of preference.
const SOURCE_KEYS: [&str; 2] = ["source_file", "filename"];

/// Completeness summary of a ground truth set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroundTruthSummary {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// Number of records lacking each field.
    pub missing_fields: BTreeMap<Field, usize>,
}

/// Reference records with a filename index.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthSet {
    records: Vec<GroundTruthRecord>,
    index: HashMap<String, usize>,
}

impl GroundTruthSet {
    pub fn from_records(records: Vec<GroundTruthRecord>) -> Self {
        let mut set = Self {
            records,
            index: HashMap::new(),
        };
        set.build_index();
        set
    }

    /// Load ground truth from a `.json`, `.csv`, `.xlsx` or `.xls` file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GroundTruthError::NotFound(path.display().to_string()).into());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let set = match extension.as_str() {
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?)?,
            "xlsx" | "xls" => Self::from_spreadsheet(path)?,
            other => return Err(GroundTruthError::UnsupportedFormat(format!(".{other}")).into()),
        };

        info!(
            "Loaded {} ground truth records from {}",
            set.len(),
            path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
        );
        Ok(set)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;

        let objects: Vec<(Option<String>, Value)> = match value {
            Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
            Value::Object(mut map) => match map.remove("records") {
                Some(Value::Array(items)) => items.into_iter().map(|v| (None, v)).collect(),
                Some(_) => return Err(invalid(0, "\"records\" must be an array")),
                None => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            },
            _ => return Err(invalid(0, "expected an array or an object")),
        };

        let records = objects
            .into_iter()
            .enumerate()
            .map(|(index, (key, value))| {
                let Value::Object(object) = value else {
                    return Err(invalid(index, "record is not an object"));
                };
                let mut record = record_from_object(index, &object)?;
                if key.is_some() {
                    // The outer key names the document
                    record.source_file = key;
                }
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_records(records))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let cells = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header, cell.to_string()));
            records.push(build_record(cells));
        }

        Ok(Self::from_records(records))
    }

    /// Read the first worksheet of an Excel workbook.
    pub fn from_spreadsheet(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| GroundTruthError::Spreadsheet("workbook has no worksheets".to_string()))?
            .map_err(spreadsheet_error)?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        Ok(Self::from_rows(rows))
    }

    /// Build a set from a header row followed by data rows.
    ///
    /// Blank headers become `col_<n>` and so never name a field.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let Some(header_row) = rows.next() else {
            return Self::default();
        };

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, h)| match h.trim() {
                "" => format!("col_{i}"),
                h => h.to_string(),
            })
            .collect();

        let records = rows
            .map(|row| build_record(headers.iter().map(String::as_str).zip(row)))
            .collect();
        Self::from_records(records)
    }

    pub fn records(&self) -> &[GroundTruthRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroundTruthRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_by_index(&self, index: usize) -> Option<&GroundTruthRecord> {
        self.records.get(index)
    }

    /// Look a record up by source filename, then by its base name.
    pub fn get_by_filename(&self, filename: &str) -> Option<&GroundTruthRecord> {
        self.index
            .get(filename)
            .or_else(|| base_name(filename).and_then(|name| self.index.get(name)))
            .map(|&idx| &self.records[idx])
    }

    /// Count records that lack any canonical field.
    pub fn validate(&self) -> GroundTruthSummary {
        let mut summary = GroundTruthSummary {
            total_records: self.records.len(),
            ..GroundTruthSummary::default()
        };

        for record in &self.records {
            let missing: Vec<Field> = Field::ALL
                .into_iter()
                .filter(|field| is_blank(record.value(*field)))
                .collect();

            if missing.is_empty() {
                summary.valid_records += 1;
            } else {
                summary.invalid_records += 1;
            }
            for field in missing {
                *summary.missing_fields.entry(field).or_default() += 1;
            }
        }

        info!(
            "Ground truth validation: {}/{} valid",
            summary.valid_records, summary.total_records
        );
        summary
    }

    fn build_index(&mut self) {
        self.index.clear();
        for (idx, record) in self.records.iter().enumerate() {
            let Some(source) = record.source_file.as_deref() else {
                continue;
            };
            if let Some(name) = base_name(source) {
                self.index.insert(name.to_string(), idx);
            }
            self.index.insert(source.to_string(), idx);
        }
        debug!("Indexed {} ground truth filenames", self.index.len());
    }
}

impl<'a> IntoIterator for &'a GroundTruthSet {
    type Item = &'a GroundTruthRecord;
    type IntoIter = std::slice::Iter<'a, GroundTruthRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn base_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}

fn invalid(index: usize, reason: impl Into<String>) -> InvexError {
    GroundTruthError::InvalidRecord {
        index,
        reason: reason.into(),
    }
    .into()
}

fn spreadsheet_error(err: calamine::Error) -> InvexError {
    GroundTruthError::Spreadsheet(err.to_string()).into()
}

fn record_from_object(index: usize, object: &Map<String, Value>) -> Result<GroundTruthRecord> {
    let mut cells = Vec::with_capacity(object.len());

    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(invalid(index, format!("{key} must be a string or a number")));
            }
        };
        cells.push((key.as_str(), text));
    }

    Ok(build_record(cells))
}

/// Build a record from keyed cells. Unknown keys and blank cells are ignored.
fn build_record<'a>(cells: impl IntoIterator<Item = (&'a str, String)>) -> GroundTruthRecord {
    let mut record = GroundTruthRecord::new();
    let mut sources: [Option<String>; SOURCE_KEYS.len()] = Default::default();

    for (key, value) in cells {
        let key = key.trim();
        if value.trim().is_empty() {
            continue;
        }

        if let Some(rank) = SOURCE_KEYS.iter().position(|k| *k == key) {
            sources[rank] = Some(value);
        } else if let Ok(field) = key.parse::<Field>() {
            record.values.insert(field, value);
        }
    }

    record.source_file = sources.into_iter().flatten().next();
    record
}
