pub mod artifact;
pub mod features;

pub use artifact::{ModelParams, RegressorArtifact, ScalerArtifact};
pub use features::{latest_features, MarketReturns, FEATURE_NAMES};

use std::path::Path;

use advisor_core::{AdvisorError, MlScore};
use technical_analysis::IndicatorFrame;
use tracing::{info, warn};


/// Model names the offline trainer exports.
const MODEL_NAMES: [&str; 3] = ["random_forest", "gradient_boosting", "xgboost"];

/// One fully loaded (regressor, scaler, weight) triple.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub regressor: RegressorArtifact,
    pub scaler: ScalerArtifact,
    pub weight: f64,
}

/// Reliability-weighted ensemble over whatever model artifacts loaded at
/// startup. Read-only after construction, safe to share across workers.
pub struct PredictionEnsemble {
    models: Vec<(String, LoadedModel)>,
}

impl PredictionEnsemble {
    /// Loads every model whose regressor and scaler both parse. A name
    /// missing either file is skipped, never an error; an empty directory
    /// yields a usable ensemble that always falls back.
    pub fn load(model_dir: &Path) -> Self {
        let mut models = Vec::new();

        for name in MODEL_NAMES {
            let regressor_path = model_dir.join(format!("{name}_model.json"));
            let scaler_path = model_dir.join(format!("{name}_scaler.json"));
            if !regressor_path.exists() || !scaler_path.exists() {
                info!(model = name, "model artifacts missing, skipping");
                continue;
            }

            let regressor: RegressorArtifact = match read_json(&regressor_path) {
                Ok(r) => r,
                Err(e) => {
                    warn!(model = name, error = %e, "failed to load regressor");
                    continue;
                }
            };
            let scaler: ScalerArtifact = match read_json(&scaler_path) {
                Ok(s) => s,
                Err(e) => {
                    warn!(model = name, error = %e, "failed to load scaler");
                    continue;
                }
            };

            let params_path = model_dir.join("params").join(format!("{name}_params.json"));
            let params: ModelParams = read_json(&params_path).unwrap_or_default();
            let weight = params.reliability_weight();

            info!(model = name, weight, "model loaded");
            models.push((name.to_string(), LoadedModel { regressor, scaler, weight }));
        }

        info!(active = models.len(), "prediction ensemble ready");
        Self { models }
    }

    /// Builds an ensemble from already-constructed models.
    pub fn from_models(models: Vec<(String, LoadedModel)>) -> Self {
        Self { models }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Scores the latest frame row. With at least one active model this is
    /// the reliability-weighted average of member predictions; with none
    /// it degrades to the supplied technical score, then to a closed-form
    /// heuristic. A frame too short for the feature lookbacks is an error
    /// in every mode. The returned mode tells the composer how to weight
    /// it.
    pub fn predict(
        &self,
        code: &str,
        frame: &IndicatorFrame,
        market: MarketReturns,
        fallback_score: Option<f64>,
    ) -> Result<MlScore, AdvisorError> {
        if frame.is_empty() {
            return Err(AdvisorError::InsufficientData(format!(
                "no indicator rows for {code}"
            )));
        }

        let features = match features::latest_features(frame, market) {
            Some(f) => f,
            None => {
                return Err(AdvisorError::InsufficientData(format!(
                    "not enough history to build features for {code}"
                )))
            }
        };

        if self.models.is_empty() {
            return Ok(self.fallback(frame, fallback_score));
        }

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut used = 0;
        for (name, model) in &self.models {
            let Some(scaled) = model.scaler.transform(&features) else {
                warn!(model = %name, "scaler width mismatch, skipping model");
                continue;
            };
            let prediction = model.regressor.predict(&scaled);
            weighted_sum += prediction * model.weight;
            weight_sum += model.weight;
            used += 1;
        }

        if used == 0 {
            return Ok(self.fallback(frame, fallback_score));
        }

        Ok(MlScore::Ensemble {
            score: (weighted_sum / weight_sum).clamp(0.0, 100.0),
            model_count: used,
        })
    }

    fn fallback(&self, frame: &IndicatorFrame, fallback_score: Option<f64>) -> MlScore {
        if let Some(score) = fallback_score {
            return MlScore::TechFallback { score: score.clamp(0.0, 100.0) };
        }
        // frame is non-empty here, checked by the caller.
        let row = frame.rows().last();
        let score = row.map(heuristic_score).unwrap_or(50.0);
        MlScore::Heuristic { score }
    }
}

/// Closed-form stand-in when neither models nor a technical score exist:
/// lean contrarian on RSI, follow the MACD sign, lean with the price/SMA20
/// stretch.
pub fn heuristic_score(row: &technical_analysis::IndicatorRow) -> f64 {
    let macd_term = if row.macd_diff > 0.0 { 10.0 } else { -10.0 };
    let stretch = if row.sma_20 != 0.0 {
        (row.close / row.sma_20 - 1.0) * 50.0
    } else {
        0.0
    };
    (50.0 + (50.0 - row.rsi) * 0.3 + macd_term + stretch).clamp(0.0, 100.0)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AdvisorError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AdvisorError::Parse(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| AdvisorError::Parse(format!("{}: {e}", path.display())))
}
