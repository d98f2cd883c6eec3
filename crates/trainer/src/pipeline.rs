//! End-to-end training run
//!
//! load + shuffle -> cross-validate -> out-of-fold predictions -> fit on all
//! rows -> save model -> save metadata. Nothing is retried; the first error
//! aborts the run.

use iris_metadata::{MetadataValue, ModelRecord, RecordSpec};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cv::{cross_val_predict, cross_validate, KFold};
use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};
use crate::forest::{ForestConfig, RandomForest};
use crate::settings::Settings;
use crate::store::ModelStore;

/// Human summary written into every record
pub const MODEL_DESCRIPTION: &str = "Predicting petal length (regression)";

/// Knobs for a training run
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingParams {
    pub forest: ForestConfig,
    pub kfold: KFold,
    /// Seed for the initial row shuffle
    pub shuffle_seed: i64,
    pub target: String,
    /// Non-feature columns to ignore
    pub drop_columns: Vec<String>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            kfold: KFold::default(),
            shuffle_seed: 1,
            target: "petal_length".to_string(),
            drop_columns: vec!["species".to_string()],
        }
    }
}

/// What a completed run produced
#[derive(Debug)]
pub struct TrainOutcome {
    pub model_path: PathBuf,
    pub model_hash: String,
    pub metadata_path: PathBuf,
    pub r2_cv: f64,
    pub mse_cv: f64,
    pub record: ModelRecord,
}

/// Evaluation wording recorded with the run
pub fn testing_strategy(kfold: &KFold) -> String {
    format!(
        "{}-fold cross validation, using mean to aggregate fold metrics, no hold-out set.",
        kfold.n_splits
    )
}

/// Data type tag derived from the input file extension
fn data_type(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Train and save a model, compute evaluation metrics, write metadata.
///
/// `model_stem` names the model artifact (without extension) and, through
/// the naming convention, its metadata file. `input_data_filename` is
/// resolved inside the transformed-data directory.
///
/// The metadata directory must exist before anything is written. The model
/// is staged in a temporary file and only replaces `<stem>.json` once the
/// metadata file is in place, so a failed run leaves the previous run's
/// artifacts as they were.
pub fn train(
    settings: &Settings,
    model_stem: &str,
    input_data_filename: &str,
    params: &TrainingParams,
) -> Result<TrainOutcome> {
    let data_location = settings.data_location(input_data_filename);
    info!(path = %data_location.display(), "loading transformed dataset");

    let drop: Vec<&str> = params.drop_columns.iter().map(String::as_str).collect();
    let mut dataset = Dataset::from_csv(&data_location, &params.target, &drop)?;
    dataset.shuffle(params.shuffle_seed);
    info!(
        samples = dataset.len(),
        features = dataset.feature_count(),
        "dataset loaded"
    );

    let scores = cross_validate(&params.forest, &dataset, &params.kfold)?;
    let r2_cv = scores.mean_r2();
    let mse_cv = scores.mean_mse();
    info!(r2_cv, mse_cv, "cross validation complete");

    // out-of-fold predictions, to plot actual-vs-predicted later
    let predictions = cross_val_predict(&params.forest, &dataset, &params.kfold)?;

    info!(trees = params.forest.n_estimators, "fitting random forest on all rows");
    let model = RandomForest::fit(&params.forest, &dataset)?;

    if !settings.metadata_dir.is_dir() {
        return Err(TrainerError::io(
            &settings.metadata_dir,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "metadata directory does not exist",
            ),
        ));
    }

    let store = ModelStore::new(&settings.model_dir);
    let staged = store.stage(model_stem, &model)?;

    let mut extra_metadata: BTreeMap<String, MetadataValue> = BTreeMap::new();
    extra_metadata.insert("data_type".to_string(), data_type(&data_location).into());
    extra_metadata.insert(
        "actual_and_predicted".to_string(),
        MetadataValue::map([
            ("actual", MetadataValue::from(dataset.targets.clone())),
            ("predicted", MetadataValue::from(predictions)),
        ]),
    );
    extra_metadata.insert("model_hash".to_string(), staged.hash_hex().into());

    let mut record = ModelRecord::new(RecordSpec {
        model_location: staged.path().to_path_buf(),
        model: &model,
        description: MODEL_DESCRIPTION.to_string(),
        source_data_location: data_location,
        target_name: Some(dataset.target_name.clone()),
        feature_names: dataset.feature_names.clone(),
        feature_importances: model.named_importances(),
        testing_strategy: testing_strategy(&params.kfold),
        holdout_info: None,
        extra_metadata,
    })?;
    record.add_score("r2", "cv", r2_cv);
    record.add_score("mean_squared_error", "cv", mse_cv);

    // a failed save drops `staged`, which discards the temporary model file
    let metadata_path = record.save_to_file(&settings.metadata_dir)?;

    let saved = match staged.commit() {
        Ok(saved) => saved,
        Err(err) => {
            warn!(error = %err, "model commit failed, removing metadata file");
            if let Err(cleanup) = std::fs::remove_file(&metadata_path) {
                warn!(error = %cleanup, path = %metadata_path.display(), "could not remove metadata file");
            }
            return Err(err);
        }
    };

    Ok(TrainOutcome {
        model_path: saved.path,
        model_hash: saved.hash_hex,
        metadata_path,
        r2_cv,
        mse_cv,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_strategy_mentions_folds() {
        assert_eq!(
            testing_strategy(&KFold::default()),
            "5-fold cross validation, using mean to aggregate fold metrics, no hold-out set."
        );
    }

    #[test]
    fn test_data_type_from_extension() {
        assert_eq!(data_type(Path::new("data/iris.CSV")), "csv");
        assert_eq!(data_type(Path::new("data/iris")), "unknown");
    }
}
