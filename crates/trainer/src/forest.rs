//! Random forest regressor
//!
//! Bagged ensemble of CART regression trees. Each tree is grown on a
//! bootstrap sample drawn from one seeded [`LcgRng`] stream, so a seed
//! fully determines the forest. Predictions are the mean over trees.

use iris_metadata::{DescribeModel, MetadataValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::cart::{CartBuilder, Tree, TreeConfig};
use crate::cv::{Estimator, Predictor};
use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::{Result, TrainerError};

/// Random forest training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub seed: i64,
    /// Grow each tree on a bootstrap sample instead of the full data
    pub bootstrap: bool,
    pub tree: TreeConfig,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 20,
            seed: 1,
            bootstrap: true,
            tree: TreeConfig::default(),
        }
    }
}

/// Fitted random forest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Train a forest on the given dataset
    pub fn fit(config: &ForestConfig, dataset: &Dataset) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(TrainerError::Training(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if dataset.is_empty() {
            return Err(TrainerError::Training(
                "cannot fit on an empty dataset".to_string(),
            ));
        }
        if dataset.targets.len() != dataset.len() {
            return Err(TrainerError::Training(format!(
                "{} feature rows but {} targets",
                dataset.len(),
                dataset.targets.len()
            )));
        }
        if let Some(row) = dataset
            .features
            .iter()
            .position(|row| row.len() != dataset.feature_count())
        {
            return Err(TrainerError::Training(format!(
                "row {row} has {} features, expected {}",
                dataset.features[row].len(),
                dataset.feature_count()
            )));
        }

        let n_samples = dataset.len();
        let feature_count = dataset.feature_count();
        let mut rng = LcgRng::new(config.seed);
        let builder = CartBuilder::new(&dataset.features, &dataset.targets, config.tree.clone());

        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut importances = vec![0.0; feature_count];

        for tree_idx in 0..config.n_estimators {
            let indices: Vec<usize> = if config.bootstrap {
                (0..n_samples).map(|_| rng.next_index(n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let (tree, tree_importances) = builder.build(&indices);
            debug!(
                tree = tree_idx + 1,
                nodes = tree.nodes.len(),
                depth = tree.depth(),
                "grew tree"
            );

            // per-tree normalization, then averaged over the ensemble
            let total: f64 = tree_importances.iter().sum();
            if total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(&tree_importances) {
                    *acc += imp / total;
                }
            }

            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Ok(Self {
            config: config.clone(),
            feature_names: dataset.feature_names.clone(),
            trees,
            importances,
        })
    }

    /// Predict a single row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Normalized impurity-decrease importances, in feature order.
    ///
    /// Sums to 1, or is all zeros when no tree ever split.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// `(feature name, importance)` pairs in training order
    pub fn named_importances(&self) -> Vec<(String, f64)> {
        self.feature_names
            .iter()
            .cloned()
            .zip(self.importances.iter().copied())
            .collect()
    }
}

impl Predictor for RandomForest {
    fn predict(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features.iter().map(|row| self.predict_row(row)).collect()
    }
}

impl Estimator for ForestConfig {
    type Fitted = RandomForest;

    fn fit(&self, dataset: &Dataset) -> Result<RandomForest> {
        RandomForest::fit(self, dataset)
    }
}

impl DescribeModel for RandomForest {
    fn model_type(&self) -> String {
        "RandomForestRegressor".to_string()
    }

    fn model_params(&self) -> BTreeMap<String, MetadataValue> {
        let mut params: BTreeMap<String, MetadataValue> = BTreeMap::new();
        params.insert("n_estimators".to_string(), self.config.n_estimators.into());
        params.insert("random_state".to_string(), (self.config.seed as f64).into());
        params.insert("bootstrap".to_string(), self.config.bootstrap.into());
        params.insert(
            "max_depth".to_string(),
            match self.config.tree.max_depth {
                Some(depth) => depth.into(),
                None => "none".into(),
            },
        );
        params.insert(
            "min_samples_split".to_string(),
            self.config.tree.min_samples_split.into(),
        );
        params.insert(
            "min_samples_leaf".to_string(),
            self.config.tree.min_samples_leaf.into(),
        );
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset() -> Dataset {
        // target depends on the first feature only
        let features: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let targets = (0..40).map(|i| 2.0 * i as f64).collect();
        Dataset {
            feature_names: vec!["signal".to_string(), "noise".to_string()],
            target_name: "y".to_string(),
            features,
            targets,
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let dataset = linear_dataset();
        let forest = RandomForest::fit(&ForestConfig::default(), &dataset).unwrap();

        assert_eq!(forest.trees.len(), 20);
        let prediction = forest.predict_row(&[20.0, 0.0]);
        assert!((prediction - 40.0).abs() < 10.0, "prediction {prediction}");
    }

    #[test]
    fn test_importances_favour_signal() {
        let forest = RandomForest::fit(&ForestConfig::default(), &linear_dataset()).unwrap();
        let importances = forest.feature_importances();

        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);

        let named = forest.named_importances();
        assert_eq!(named[0].0, "signal");
        assert_eq!(named[1].0, "noise");
    }

    #[test]
    fn test_constant_target_has_zero_importances() {
        let mut dataset = linear_dataset();
        dataset.targets = vec![3.0; dataset.len()];
        let forest = RandomForest::fit(&ForestConfig::default(), &dataset).unwrap();

        assert!(forest.feature_importances().iter().all(|&v| v == 0.0));
        assert_eq!(forest.predict_row(&[1.0, 1.0]), 3.0);
    }

    #[test]
    fn test_determinism() {
        let dataset = linear_dataset();
        let config = ForestConfig {
            n_estimators: 5,
            ..ForestConfig::default()
        };

        let a = RandomForest::fit(&config, &dataset).unwrap();
        let b = RandomForest::fit(&config, &dataset).unwrap();
        assert_eq!(a, b);

        let other_seed = ForestConfig { seed: 2, ..config };
        let c = RandomForest::fit(&other_seed, &dataset).unwrap();
        assert_ne!(a.trees, c.trees);
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let config = ForestConfig {
            n_estimators: 0,
            ..ForestConfig::default()
        };
        assert!(RandomForest::fit(&config, &linear_dataset()).is_err());

        let mut empty = linear_dataset();
        empty.features.clear();
        empty.targets.clear();
        assert!(RandomForest::fit(&ForestConfig::default(), &empty).is_err());
    }

    #[test]
    fn test_rejects_misaligned_dataset() {
        let mut short_targets = linear_dataset();
        short_targets.targets.pop();
        let err = RandomForest::fit(&ForestConfig::default(), &short_targets).unwrap_err();
        assert!(matches!(err, TrainerError::Training(msg) if msg.contains("39 targets")));

        let mut ragged = linear_dataset();
        ragged.features[5].push(1.0);
        let err = RandomForest::fit(&ForestConfig::default(), &ragged).unwrap_err();
        assert!(matches!(err, TrainerError::Training(msg) if msg.contains("row 5")));
    }

    #[test]
    fn test_describes_itself() {
        let forest = RandomForest::fit(&ForestConfig::default(), &linear_dataset()).unwrap();
        assert_eq!(forest.model_type(), "RandomForestRegressor");
        let params = forest.model_params();
        assert_eq!(params["n_estimators"], MetadataValue::Number(20.0));
        assert_eq!(params["max_depth"], MetadataValue::Text("none".to_string()));
    }
}
