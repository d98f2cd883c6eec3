//! CSV dataset loading and preprocessing
//!
//! Reads a headed CSV file, keeps the numeric feature columns and the target
//! column, and provides deterministic shuffling and row selection.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::debug;

use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};

/// Training dataset with named numeric features and a numeric target
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    /// Load dataset from a CSV file with a header row.
    ///
    /// `target` names the predicted column; it is never used as a feature.
    /// Every column in `drop_columns` is skipped. All remaining cells must
    /// parse as finite numbers.
    pub fn from_csv<P: AsRef<Path>>(path: P, target: &str, drop_columns: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| TrainerError::io(path, err))?;
        Self::from_csv_str(&content, target, drop_columns)
    }

    /// Parse CSV text; see [`Dataset::from_csv`]
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn from_csv_str(content: &str, target: &str, drop_columns: &[&str]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".to_string()));
        }

        for dropped in drop_columns {
            if !columns.iter().any(|c| c == dropped) {
                return Err(TrainerError::Dataset(format!(
                    "column '{dropped}' not found in header"
                )));
            }
        }
        let target_idx = columns
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| TrainerError::Dataset(format!("target column '{target}' not found")))?;

        let feature_idx: Vec<usize> = (0..columns.len())
            .filter(|&i| i != target_idx && !drop_columns.contains(&columns[i].as_str()))
            .collect();
        let feature_names = feature_idx.iter().map(|&i| columns[i].clone()).collect();

        let mut features = Vec::new();
        let mut targets = Vec::new();

        for record in reader.records() {
            let record = record?;
            let line_no = line_of(&record);
            if record.len() != columns.len() {
                return Err(TrainerError::Dataset(format!(
                    "line {line_no}: expected {} columns, got {}",
                    columns.len(),
                    record.len()
                )));
            }

            let parse = |col: usize| -> Result<f64> {
                let cell = &record[col];
                match cell.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    Ok(_) => Err(TrainerError::Dataset(format!(
                        "line {line_no}, column '{}': non-finite value '{cell}'",
                        columns[col]
                    ))),
                    Err(_) => Err(TrainerError::Dataset(format!(
                        "line {line_no}, column '{}': invalid number '{cell}'",
                        columns[col]
                    ))),
                }
            };

            let row = feature_idx.iter().map(|&i| parse(i)).collect::<Result<Vec<f64>>>()?;
            targets.push(parse(target_idx)?);
            features.push(row);
        }

        if features.is_empty() {
            return Err(TrainerError::Dataset("dataset has no rows".to_string()));
        }

        debug!(rows = features.len(), "parsed dataset");

        Ok(Self {
            feature_names,
            target_name: target.to_string(),
            features,
            targets,
        })
    }

    /// Deterministically shuffle the rows using seed
    pub fn shuffle(&mut self, seed: i64) {
        let order = LcgRng::new(seed).permutation(self.len());
        *self = self.select(&order);
    }

    /// New dataset made of the given rows, in the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// 1-based line where a record starts
fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}
