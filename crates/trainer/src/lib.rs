//! Iris regression trainer
//!
//! Loads a tabular dataset, evaluates a random forest regressor with k-fold
//! cross-validation, fits it on the full data, stores the model artifact and
//! writes a run metadata record next to it.

pub mod cart;
pub mod cv;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod settings;
pub mod store;

pub use cv::{cross_val_predict, cross_validate, CvScores, Estimator, KFold, Predictor};
pub use dataset::Dataset;
pub use deterministic::LcgRng;
pub use errors::{Result, TrainerError};
pub use forest::{ForestConfig, RandomForest};
pub use pipeline::{train, TrainOutcome, TrainingParams};
pub use settings::Settings;
pub use store::{ModelStore, SavedModel, StagedModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
