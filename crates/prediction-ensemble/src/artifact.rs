use serde::Deserialize;

/// Per-feature standardization parameters exported by the trainer.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerArtifact {
    /// Standardizes a feature row. Returns None on a width mismatch so a
    /// stale artifact cannot silently feed garbage into its model.
    pub fn transform(&self, features: &[f64]) -> Option<Vec<f64>> {
        if features.len() != self.mean.len() || features.len() != self.scale.len() {
            return None;
        }
        Some(
            features
                .iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
                .collect(),
        )
    }
}

/// A decision tree flattened into parallel node arrays. `feature < 0`
/// marks a leaf whose prediction sits in `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub value: Vec<f64>,
}

impl Tree {
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            if node >= self.feature.len() {
                return 0.0;
            }
            let feature_idx = self.feature[node];
            if feature_idx < 0 {
                return self.value[node];
            }
            let x = features.get(feature_idx as usize).copied().unwrap_or(0.0);
            node = if x <= self.threshold[node] {
                self.left[node]
            } else {
                self.right[node]
            };
        }
    }
}

/// How tree outputs combine: bagging averages, boosting sums onto a base
/// score.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Sum,
}

/// A serialized regressor in one of the exported forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        trees: Vec<Tree>,
        #[serde(default)]
        base_score: f64,
        aggregation: Aggregation,
    },
}

impl RegressorArtifact {
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            RegressorArtifact::Linear { coefficients, intercept } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(features)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
            RegressorArtifact::TreeEnsemble { trees, base_score, aggregation } => {
                if trees.is_empty() {
                    return *base_score;
                }
                let sum: f64 = trees.iter().map(|t| t.predict(features)).sum();
                match aggregation {
                    Aggregation::Mean => sum / trees.len() as f64,
                    Aggregation::Sum => base_score + sum,
                }
            }
        }
    }
}

/// Training metadata recorded alongside each model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelParams {
    #[serde(default)]
    pub test_rmse: Option<f64>,
    #[serde(default)]
    pub test_r2: Option<f64>,
    #[serde(default)]
    pub model_version: Option<String>,
}

impl ModelParams {
    /// Reliability weight favoring historically accurate models. Without
    /// a recorded test error every model weighs the same.
    pub fn reliability_weight(&self) -> f64 {
        match self.test_rmse {
            Some(rmse) => 1.0 / rmse.max(0.01),
            None => 1.0,
        }
    }
}
