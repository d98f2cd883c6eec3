//! Model record: the structured description of one training run
//!
//! A record is built once per run, receives scores through `add_score`, and
//! is written with `save_to_file` to `<dir>/<model stem>.metadata.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{MetadataError, Result};
use crate::naming::{metadata_file_name, model_stem};
use crate::serialization::canonical_json_string;
use crate::value::MetadataValue;

/// Schema version written into every metadata document
pub const RECORD_VERSION: &str = "1";

/// Descriptive view of a trained model.
///
/// The recorder only extracts these fields; the model itself is never
/// persisted through the record.
pub trait DescribeModel {
    /// Type name of the model (e.g. `RandomForestRegressor`)
    fn model_type(&self) -> String;

    /// Hyper-parameters worth recording alongside the run
    fn model_params(&self) -> BTreeMap<String, MetadataValue> {
        BTreeMap::new()
    }
}

/// Importance of one input feature, in training column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    #[serde(rename = "feature")]
    pub name: String,
    pub importance: f64,
}

/// Inputs for constructing a [`ModelRecord`]
pub struct RecordSpec<'a> {
    /// Where the fitted model artifact is stored
    pub model_location: PathBuf,
    /// Trained model, used only to extract its type and parameters
    pub model: &'a dyn DescribeModel,
    pub description: String,
    /// Dataset actually used for training
    pub source_data_location: PathBuf,
    pub target_name: Option<String>,
    /// Input columns, in training order
    pub feature_names: Vec<String>,
    /// `(feature, importance)` pairs; must follow `feature_names` exactly
    pub feature_importances: Vec<(String, f64)>,
    pub testing_strategy: String,
    pub holdout_info: Option<String>,
    pub extra_metadata: BTreeMap<String, MetadataValue>,
}

/// Persistence state of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordState {
    Unsaved,
    Saved(PathBuf),
}

/// Description of a single training run
#[derive(Debug, Clone)]
pub struct ModelRecord {
    model_location: PathBuf,
    model_stem: String,
    model_type: String,
    model_params: BTreeMap<String, MetadataValue>,
    description: String,
    source_data_location: PathBuf,
    target_name: Option<String>,
    feature_importances: Vec<FeatureImportance>,
    testing_strategy: String,
    holdout_info: Option<String>,
    scores: BTreeMap<String, BTreeMap<String, f64>>,
    extra_metadata: BTreeMap<String, MetadataValue>,
    created_at: DateTime<Utc>,
    state: RecordState,
}

/// On-disk form of a [`ModelRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub record_version: String,
    pub created_at: DateTime<Utc>,
    pub model_location: PathBuf,
    pub model_type: String,
    pub model_params: BTreeMap<String, MetadataValue>,
    pub description: String,
    pub source_data_location: PathBuf,
    pub target_name: Option<String>,
    pub feature_names: Vec<String>,
    pub feature_importances: Vec<FeatureImportance>,
    pub testing_strategy: String,
    pub holdout_info: Option<String>,
    /// metric -> phase -> value
    pub scores: BTreeMap<String, BTreeMap<String, f64>>,
    pub extra_metadata: BTreeMap<String, MetadataValue>,
}

impl ModelRecord {
    /// Build a record from the run's outputs.
    ///
    /// Fails with [`MetadataError::Validation`] when the importances do not
    /// pair 1:1 (same length, same names, same order) with `feature_names`,
    /// when an importance is not finite, or when the model location has no
    /// file stem to derive the metadata file name from.
    pub fn new(spec: RecordSpec<'_>) -> Result<Self> {
        let RecordSpec {
            model_location,
            model,
            description,
            source_data_location,
            target_name,
            feature_names,
            feature_importances,
            testing_strategy,
            holdout_info,
            extra_metadata,
        } = spec;

        if feature_names.len() != feature_importances.len() {
            return Err(MetadataError::Validation(format!(
                "{} feature names but {} feature importances",
                feature_names.len(),
                feature_importances.len()
            )));
        }

        let mut paired = Vec::with_capacity(feature_names.len());
        for (idx, (name, (imp_name, importance))) in feature_names
            .into_iter()
            .zip(feature_importances)
            .enumerate()
        {
            if name != imp_name {
                return Err(MetadataError::Validation(format!(
                    "feature {idx}: importance recorded for '{imp_name}' but feature is '{name}'"
                )));
            }
            if !importance.is_finite() {
                return Err(MetadataError::Validation(format!(
                    "feature '{name}': importance {importance} is not finite"
                )));
            }
            paired.push(FeatureImportance { name, importance });
        }

        let model_stem = model_stem(&model_location)
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                MetadataError::Validation(format!(
                    "model location '{}' has no file stem",
                    model_location.display()
                ))
            })?
            .to_string();

        Ok(Self {
            model_location,
            model_stem,
            model_type: model.model_type(),
            model_params: model.model_params(),
            description,
            source_data_location,
            target_name,
            feature_importances: paired,
            testing_strategy,
            holdout_info,
            scores: BTreeMap::new(),
            extra_metadata,
            created_at: Utc::now(),
            state: RecordState::Unsaved,
        })
    }

    /// Record a score for `(metric, phase)`.
    ///
    /// An existing score for the same pair is replaced; last write wins.
    pub fn add_score(&mut self, metric: impl Into<String>, phase: impl Into<String>, value: f64) {
        let metric = metric.into();
        let phase = phase.into();
        debug!(%metric, %phase, value, "recording score");
        self.scores.entry(metric).or_default().insert(phase, value);
    }

    /// Write the record as canonical JSON into `output_directory`.
    ///
    /// The file is named after the model stem (see [`metadata_file_name`]).
    /// The directory must already exist; it is never created here. The
    /// document is written to a temporary file in the same directory and
    /// renamed into place, so a failed save leaves no partial file. Saving
    /// again overwrites the previous file.
    ///
    /// A NaN or infinite score or metadata number fails with
    /// [`MetadataError::Validation`] before anything touches the disk.
    pub fn save_to_file(&mut self, output_directory: impl AsRef<Path>) -> Result<PathBuf> {
        self.check_finite()?;

        let dir = output_directory.as_ref();
        if !dir.exists() {
            return Err(MetadataError::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "metadata directory does not exist"),
            ));
        }
        if !dir.is_dir() {
            return Err(MetadataError::io(
                dir,
                io::Error::new(io::ErrorKind::Other, "metadata location is not a directory"),
            ));
        }

        let path = dir.join(self.metadata_file_name());
        let json = canonical_json_string(&self.to_document())?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| MetadataError::io(dir, err))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| MetadataError::io(tmp.path(), err))?;
        tmp.persist(&path)
            .map_err(|err| MetadataError::io(&path, err.error))?;

        info!(path = %path.display(), model_type = %self.model_type, "saved model metadata");
        self.state = RecordState::Saved(path.clone());
        Ok(path)
    }

    fn check_finite(&self) -> Result<()> {
        if let Some(((metric, phase), value)) = self.scores().find(|(_, v)| !v.is_finite()) {
            return Err(MetadataError::Validation(format!(
                "score {metric}/{phase} is not finite ({value})"
            )));
        }

        let entries = self
            .model_params
            .iter()
            .map(|(key, value)| ("model_params", key, value))
            .chain(
                self.extra_metadata
                    .iter()
                    .map(|(key, value)| ("extra_metadata", key, value)),
            );
        for (section, key, value) in entries {
            if !value.is_finite() {
                return Err(MetadataError::Validation(format!(
                    "{section} entry '{key}' holds a non-finite number"
                )));
            }
        }
        Ok(())
    }

    /// Flat document written by [`save_to_file`](Self::save_to_file)
    pub fn to_document(&self) -> MetadataDocument {
        MetadataDocument {
            record_version: RECORD_VERSION.to_string(),
            created_at: self.created_at,
            model_location: self.model_location.clone(),
            model_type: self.model_type.clone(),
            model_params: self.model_params.clone(),
            description: self.description.clone(),
            source_data_location: self.source_data_location.clone(),
            target_name: self.target_name.clone(),
            feature_names: self.feature_names(),
            feature_importances: self.feature_importances.clone(),
            testing_strategy: self.testing_strategy.clone(),
            holdout_info: self.holdout_info.clone(),
            scores: self.scores.clone(),
            extra_metadata: self.extra_metadata.clone(),
        }
    }

    /// Metadata file name paired with this record's model artifact
    pub fn metadata_file_name(&self) -> String {
        metadata_file_name(&self.model_stem)
    }

    pub fn model_location(&self) -> &Path {
        &self.model_location
    }

    pub fn model_stem(&self) -> &str {
        &self.model_stem
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn model_params(&self) -> &BTreeMap<String, MetadataValue> {
        &self.model_params
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_data_location(&self) -> &Path {
        &self.source_data_location
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Feature names in training order
    pub fn feature_names(&self) -> Vec<String> {
        self.feature_importances
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn feature_importances(&self) -> &[FeatureImportance] {
        &self.feature_importances
    }

    pub fn testing_strategy(&self) -> &str {
        &self.testing_strategy
    }

    pub fn holdout_info(&self) -> Option<&str> {
        self.holdout_info.as_deref()
    }

    /// Score for `(metric, phase)`, if recorded
    pub fn score(&self, metric: &str, phase: &str) -> Option<f64> {
        self.scores.get(metric).and_then(|phases| phases.get(phase)).copied()
    }

    /// All scores as `((metric, phase), value)`
    pub fn scores(&self) -> impl Iterator<Item = ((&str, &str), f64)> + '_ {
        self.scores.iter().flat_map(|(metric, phases)| {
            phases
                .iter()
                .map(move |(phase, value)| ((metric.as_str(), phase.as_str()), *value))
        })
    }

    pub fn extra_metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.extra_metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &RecordState {
        &self.state
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.state, RecordState::Saved(_))
    }

    /// Path of the last successful save
    pub fn saved_path(&self) -> Option<&Path> {
        match &self.state {
            RecordState::Saved(path) => Some(path),
            RecordState::Unsaved => None,
        }
    }
}
