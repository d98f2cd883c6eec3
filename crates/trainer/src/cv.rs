//! K-fold cross-validation
//!
//! Splits a dataset into `n_splits` folds, fits on all-but-one fold and
//! scores on the held-out fold, once per fold.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};
use crate::metrics::{mean_squared_error, r2_score};

/// Something that can be trained on a dataset
pub trait Estimator {
    type Fitted: Predictor;

    fn fit(&self, dataset: &Dataset) -> Result<Self::Fitted>;
}

/// A fitted model producing one prediction per feature row
pub trait Predictor {
    fn predict(&self, features: &[Vec<f64>]) -> Vec<f64>;
}

/// K-fold splitter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: i64,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: true,
            seed: 0,
        }
    }
}

/// One fold: training rows and held-out test rows
#[derive(Clone, Debug, PartialEq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl KFold {
    /// Partition `0..n_samples` into folds.
    ///
    /// Fold sizes differ by at most one (the first `n % k` folds get the
    /// extra row) and every index lands in exactly one test fold.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(TrainerError::Training(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n_samples {
            return Err(TrainerError::Training(format!(
                "cannot split {n_samples} samples into {} folds",
                self.n_splits
            )));
        }

        let order = if self.shuffle {
            LcgRng::new(self.seed).permutation(n_samples)
        } else {
            (0..n_samples).collect()
        };

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for k in 0..self.n_splits {
            let size = base + usize::from(k < extra);
            let stop = start + size;
            let test = order[start..stop].to_vec();
            let train = order[..start]
                .iter()
                .chain(&order[stop..])
                .copied()
                .collect();
            folds.push(Fold { train, test });
            start = stop;
        }

        Ok(folds)
    }
}

/// Per-fold scores on the held-out folds
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CvScores {
    pub r2: Vec<f64>,
    pub mse: Vec<f64>,
}

impl CvScores {
    pub fn mean_r2(&self) -> f64 {
        mean(&self.r2)
    }

    pub fn mean_mse(&self) -> f64 {
        mean(&self.mse)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Fit on each training split and score R² and MSE on its test fold
pub fn cross_validate<E: Estimator>(
    estimator: &E,
    dataset: &Dataset,
    kfold: &KFold,
) -> Result<CvScores> {
    info!(folds = kfold.n_splits, "performing cross validation");
    let mut scores = CvScores::default();

    for (k, fold) in kfold.split(dataset.len())?.iter().enumerate() {
        let model = estimator.fit(&dataset.select(&fold.train))?;
        let test = dataset.select(&fold.test);
        let predicted = model.predict(&test.features);

        let r2 = r2_score(&test.targets, &predicted)?;
        let mse = mean_squared_error(&test.targets, &predicted)?;
        debug!(fold = k + 1, r2, mse, "fold scored");

        scores.r2.push(r2);
        scores.mse.push(mse);
    }

    Ok(scores)
}

/// Out-of-fold prediction for every sample, in dataset order
pub fn cross_val_predict<E: Estimator>(
    estimator: &E,
    dataset: &Dataset,
    kfold: &KFold,
) -> Result<Vec<f64>> {
    let mut predictions = vec![0.0; dataset.len()];

    for fold in kfold.split(dataset.len())? {
        let model = estimator.fit(&dataset.select(&fold.train))?;
        let test = dataset.select(&fold.test);
        for (&idx, prediction) in fold.test.iter().zip(model.predict(&test.features)) {
            predictions[idx] = prediction;
        }
    }

    Ok(predictions)
}
