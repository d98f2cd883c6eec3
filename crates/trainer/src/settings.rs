//! Directory settings for a training run
//!
//! Resolved from an optional TOML file, then `IRIS_*` environment variables
//! (`IRIS_DATA_TRANSFORMED_DIR`, `IRIS_MODEL_DIR`, `IRIS_METADATA_DIR`),
//! on top of built-in defaults.

use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, TrainerError};
use crate::store::ModelStore;

/// Where input data, model artifacts and run metadata live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_transformed_dir: PathBuf,
    pub model_dir: PathBuf,
    pub metadata_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_transformed_dir: PathBuf::from("data/transformed"),
            model_dir: PathBuf::from("models"),
            metadata_dir: PathBuf::from("models/metadata"),
        }
    }
}

impl Settings {
    /// Load settings; an explicitly given file must exist
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(TrainerError::Config(config::ConfigError::NotFound(format!(
                    "configuration file {}",
                    path.display()
                ))));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(Environment::with_prefix("IRIS"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Settings with every directory under `root`, laid out like the defaults
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            data_transformed_dir: root.join(defaults.data_transformed_dir),
            model_dir: root.join(defaults.model_dir),
            metadata_dir: root.join(defaults.metadata_dir),
        }
    }

    /// Complete path of an input data file
    pub fn data_location(&self, input_data_filename: &str) -> PathBuf {
        self.data_transformed_dir.join(input_data_filename)
    }

    /// Complete path of a model artifact, from its stem
    pub fn model_location(&self, model_stem: &str) -> PathBuf {
        ModelStore::new(&self.model_dir).model_path(model_stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(
            settings.data_location("iris.csv"),
            PathBuf::from("data/transformed/iris.csv")
        );
        assert_eq!(
            settings.model_location("iris_rf"),
            PathBuf::from("models/iris_rf.json")
        );
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "model_dir = \"/srv/models\"").unwrap();
        writeln!(file, "metadata_dir = \"/srv/metadata\"").unwrap();
        file.flush().unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(settings.metadata_dir, PathBuf::from("/srv/metadata"));
        assert_eq!(
            settings.data_transformed_dir,
            Settings::default().data_transformed_dir
        );
    }

    #[test]
    fn test_missing_config_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/iris.toml"))).unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }

    #[test]
    fn test_rooted_at() {
        let settings = Settings::rooted_at(Path::new("/tmp/run"));
        assert_eq!(settings.model_dir, PathBuf::from("/tmp/run/models"));
        assert_eq!(settings.metadata_dir, PathBuf::from("/tmp/run/models/metadata"));
    }
}
