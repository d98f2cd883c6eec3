//! Filesystem store for fitted model artifacts.
//!
//! A model is written as canonical JSON to `<model_dir>/<stem>.json`; the
//! BLAKE3 digest of those bytes identifies the artifact in run metadata.
//! Writes go through a temporary file in the model directory, and only a
//! commit replaces the artifact at its final path.

use iris_metadata::serialization::to_canonical_vec;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{Result, TrainerError};
use crate::forest::RandomForest;

/// Extension of model artifact files
pub const MODEL_EXTENSION: &str = "json";

/// Location and digest of a written model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedModel {
    pub path: PathBuf,
    pub hash_hex: String,
}

/// A serialized model held in a temporary file next to its final path.
///
/// Dropping it without [`commit`](Self::commit) deletes the temporary file
/// and leaves whatever sits at the final path untouched.
#[derive(Debug)]
pub struct StagedModel {
    tmp: NamedTempFile,
    path: PathBuf,
    hash_hex: String,
}

impl StagedModel {
    /// Final artifact path once committed
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hash_hex(&self) -> &str {
        &self.hash_hex
    }

    /// Move the staged bytes over the artifact path
    pub fn commit(self) -> Result<SavedModel> {
        let Self {
            tmp,
            path,
            hash_hex,
        } = self;
        tmp.persist(&path)
            .map_err(|err| TrainerError::io(&path, err.error))?;

        info!(path = %path.display(), hash = %hash_hex, "saved serialized model");
        Ok(SavedModel { path, hash_hex })
    }
}

/// Persist fitted models on the local filesystem.
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Artifact path for a model stem
    pub fn model_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{MODEL_EXTENSION}"))
    }

    /// Serialize and hash the model into a temporary file, creating the
    /// model directory if needed. Nothing is visible at the artifact path
    /// until the returned [`StagedModel`] is committed.
    pub fn stage(&self, stem: &str, model: &RandomForest) -> Result<StagedModel> {
        std::fs::create_dir_all(&self.root).map_err(|err| TrainerError::io(&self.root, err))?;

        let bytes = to_canonical_vec(model)?;
        let hash_hex = hex::encode(blake3::hash(&bytes).as_bytes());

        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|err| TrainerError::io(&self.root, err))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| TrainerError::io(tmp.path(), err))?;

        let path = self.model_path(stem);
        debug!(path = %path.display(), bytes = bytes.len(), "staged model artifact");
        Ok(StagedModel {
            tmp,
            path,
            hash_hex,
        })
    }

    /// Write the model straight to its artifact path
    pub fn save(&self, stem: &str, model: &RandomForest) -> Result<SavedModel> {
        self.stage(stem, model)?.commit()
    }

    /// Read a model back from its artifact file
    pub fn load(&self, stem: &str) -> Result<RandomForest> {
        let path = self.model_path(stem);
        let raw = std::fs::read_to_string(&path).map_err(|err| TrainerError::io(&path, err))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::forest::ForestConfig;
    use tempfile::tempdir;

    fn small_forest() -> RandomForest {
        let dataset = Dataset {
            feature_names: vec!["x".to_string()],
            target_name: "y".to_string(),
            features: (0..8).map(|i| vec![i as f64]).collect(),
            targets: (0..8).map(|i| (i % 3) as f64).collect(),
        };
        let config = ForestConfig {
            n_estimators: 3,
            ..ForestConfig::default()
        };
        RandomForest::fit(&config, &dataset).unwrap()
    }

    #[test]
    fn test_save_load_and_hash() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let forest = small_forest();

        let first = store.save("iris_rf", &forest).unwrap();
        let second = store.save("iris_rf", &forest).unwrap();

        assert_eq!(first.path, dir.path().join("models").join("iris_rf.json"));
        assert_eq!(first.hash_hex.len(), 64);
        assert_eq!(first, second, "Identical models should hash identically");

        let loaded = store.load("iris_rf").unwrap();
        assert_eq!(loaded.trees.len(), forest.trees.len());
        assert_eq!(loaded.feature_names, forest.feature_names);
    }

    #[test]
    fn test_dropped_stage_leaves_previous_artifact() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        std::fs::write(store.model_path("iris_rf"), "previous").unwrap();

        let staged = store.stage("iris_rf", &small_forest()).unwrap();
        assert_eq!(staged.path(), store.model_path("iris_rf"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        drop(staged);

        assert_eq!(
            std::fs::read_to_string(store.model_path("iris_rf")).unwrap(),
            "previous"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_commit_replaces_artifact() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        std::fs::write(store.model_path("iris_rf"), "previous").unwrap();

        let staged = store.stage("iris_rf", &small_forest()).unwrap();
        let hash = staged.hash_hex().to_string();
        let saved = staged.commit().unwrap();

        let bytes = std::fs::read(&saved.path).unwrap();
        assert_eq!(hex::encode(blake3::hash(&bytes).as_bytes()), hash);
        assert_eq!(saved.hash_hex, hash);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
