use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::common::RgbColor;
use crate::config::PaletteConfig;
use crate::error::DataLoadError;
use crate::pipeline::services::emotion::dataset_source::DatasetSource;
use crate::pipeline::services::emotion::reference_palette::{ReferenceEntry, ReferencePalette};

const HEX_COLUMN_HINTS: [&str; 2] = ["hex", "color"];
const EMOTION_COLUMN_HINTS: [&str; 2] = ["tag", "description"];

/// Column names plus rows of cells, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Reads a color/emotion dataset and turns it into a [`ReferencePalette`].
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    hex_column: Option<String>,
    emotion_column: Option<String>,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PaletteConfig) -> Self {
        Self {
            hex_column: config.hex_column.clone(),
            emotion_column: config.emotion_column.clone(),
        }
    }

    pub fn with_hex_column(mut self, column: impl Into<String>) -> Self {
        self.hex_column = Some(column.into());
        self
    }

    pub fn with_emotion_column(mut self, column: impl Into<String>) -> Self {
        self.emotion_column = Some(column.into());
        self
    }

    pub fn load(&self, path: &Path) -> Result<ReferencePalette, DataLoadError> {
        let table = read_table(path)?;
        let palette = self.build(&table)?;
        info!(
            "Loaded reference palette from {} with {} valid colors",
            path.display(),
            palette.len()
        );
        Ok(palette)
    }

    /// Reads a local file or fetches the named dataset, whichever the source points at.
    pub fn load_source(&self, source: &DatasetSource) -> Result<ReferencePalette, DataLoadError> {
        match source {
            DatasetSource::File(path) => self.load(path),
            DatasetSource::Hub(hub) => {
                let palette = self.build(&hub.fetch()?)?;
                info!(
                    "Loaded reference palette from dataset {} with {} valid colors",
                    hub.name,
                    palette.len()
                );
                Ok(palette)
            }
        }
    }

    pub fn build(&self, table: &RawTable) -> Result<ReferencePalette, DataLoadError> {
        let hex_index = pick_column(
            &table.columns,
            self.hex_column.as_deref(),
            &HEX_COLUMN_HINTS,
        )
        .ok_or_else(|| match &self.hex_column {
            Some(name) => DataLoadError::MissingColumn(name.clone()),
            None => DataLoadError::NoHexColumn(table.columns.clone()),
        })?;
        let emotion_index = pick_column(
            &table.columns,
            self.emotion_column.as_deref(),
            &EMOTION_COLUMN_HINTS,
        )
        .ok_or_else(|| match &self.emotion_column {
            Some(name) => DataLoadError::MissingColumn(name.clone()),
            None => DataLoadError::NoEmotionColumn(table.columns.clone()),
        })?;
        debug!(
            "Using column {:?} for colors and {:?} for emotions",
            table.columns[hex_index], table.columns[emotion_index]
        );

        let mut dropped = 0usize;
        let entries: Vec<ReferenceEntry> = table
            .rows
            .iter()
            .filter_map(|row| {
                let color = match row.get(hex_index) {
                    Some(Value::String(s)) => RgbColor::parse_hex(s),
                    _ => None,
                };
                if color.is_none() {
                    dropped += 1;
                }
                let label = row.get(emotion_index).map(label_text).unwrap_or_default();
                color.map(|c| ReferenceEntry::new(c, label))
            })
            .collect();

        if dropped > 0 {
            warn!("Dropped {} rows without a valid hex color", dropped);
        }

        ReferencePalette::new(entries)
    }
}

/// An explicit name must match exactly; otherwise the first column containing a hint wins.
fn pick_column(columns: &[String], explicit: Option<&str>, hints: &[&str]) -> Option<usize> {
    if let Some(name) = explicit {
        return columns.iter().position(|c| c == name);
    }

    let candidates: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            let lower = c.to_lowercase();
            hints.iter().any(|hint| lower.contains(hint))
        })
        .map(|(i, _)| i)
        .collect();

    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|&i| columns[i].as_str()).collect();
        warn!(
            "Several columns match {:?}: {:?}; using {:?}",
            hints, names, names[0]
        );
    }
    candidates.first().copied()
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(label_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

pub fn read_table(path: &Path) -> Result<RawTable, DataLoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => read_csv(path),
        Some("json") => {
            let text = read_text(path)?;
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| DataLoadError::ParseError(e.to_string(), path.to_path_buf()))?;
            records_to_table(json_records(value))
                .map_err(|reason| DataLoadError::ParseError(reason, path.to_path_buf()))
        }
        Some("jsonl") | Some("ndjson") => {
            let text = read_text(path)?;
            let mut records = Vec::new();
            for (line_no, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line).map_err(|e| {
                    DataLoadError::ParseError(format!("line {}: {}", line_no + 1, e), path.to_path_buf())
                })?;
                records.push(value);
            }
            records_to_table(records)
                .map_err(|reason| DataLoadError::ParseError(reason, path.to_path_buf()))
        }
        _ => Err(DataLoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_text(path: &Path) -> Result<String, DataLoadError> {
    fs::read_to_string(path).map_err(|e| DataLoadError::ReadError(e, path.to_path_buf()))
}

fn read_csv(path: &Path) -> Result<RawTable, DataLoadError> {
    let parse_error = |e: csv::Error| DataLoadError::ParseError(e.to_string(), path.to_path_buf());

    let file = fs::File::open(path).map_err(|e| DataLoadError::ReadError(e, path.to_path_buf()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        let row = (0..columns.len())
            .map(|i| {
                record
                    .get(i)
                    .map(|cell| Value::String(cell.to_string()))
                    .unwrap_or(Value::Null)
            })
            .collect();
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}

/// Accepts a bare array of records or a dataset export wrapping one under `train` or `rows`.
pub(crate) fn json_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(records) => records,
        Value::Object(mut map) => ["train", "rows"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(records)) => Some(records),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

pub(crate) fn records_to_table(records: Vec<Value>) -> Result<RawTable, String> {
    let objects: Vec<Map<String, Value>> = records
        .into_iter()
        .map(|record| match record {
            // Rows API wraps each record as {"row_idx": n, "row": {...}}.
            Value::Object(mut map) if matches!(map.get("row"), Some(Value::Object(_))) => {
                match map.remove("row") {
                    Some(Value::Object(inner)) => Ok(inner),
                    _ => Ok(map),
                }
            }
            Value::Object(map) => Ok(map),
            other => Err(format!("expected an object record, found {other}")),
        })
        .collect::<Result<_, _>>()?;

    let columns: Vec<String> = objects
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    let rows = objects
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|c| object.get(c).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}
