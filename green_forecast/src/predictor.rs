//! Predictors that turn a feature vector into a sales estimate

use crate::error::{ForecastError, PredictorError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A trained model consumed through a single predict call
///
/// The vector passed in holds exactly the features of the model's schema, in
/// schema order. Implementations should be free of side effects; the engine
/// never retries a failed call.
pub trait Predictor {
    /// Predict sales for one day
    fn predict(&self, features: &FeatureVector) -> std::result::Result<f64, PredictorError>;

    /// The feature schema the model was trained with, if it carries one
    fn schema(&self) -> Option<&FeatureSchema> {
        None
    }

    /// Name of the predictor
    fn name(&self) -> &str {
        "predictor"
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, features: &FeatureVector) -> std::result::Result<f64, PredictorError> {
        (**self).predict(features)
    }

    fn schema(&self) -> Option<&FeatureSchema> {
        (**self).schema()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adapts a closure into a [`Predictor`]
#[derive(Clone)]
pub struct FnPredictor<F> {
    name: String,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: Fn(&FeatureVector) -> std::result::Result<f64, PredictorError>,
{
    pub fn new(f: F) -> Self {
        Self {
            name: "closure".to_string(),
            f,
        }
    }

    pub fn named(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnPredictor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredictor").field("name", &self.name).finish()
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&FeatureVector) -> std::result::Result<f64, PredictorError>,
{
    fn predict(&self, features: &FeatureVector) -> std::result::Result<f64, PredictorError> {
        (self.f)(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Linear regression model exported from an offline training run
///
/// Stored on disk as JSON:
///
/// ```json
/// { "features": ["sales_lag1", "sales_lag7", "dayofweek"],
///   "intercept": 4.0,
///   "coefficients": [0.6, 0.3, -1.5] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    features: FeatureSchema,
    intercept: f64,
    coefficients: Vec<f64>,
}

#[derive(Deserialize)]
struct LinearModelFile {
    features: FeatureSchema,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Create a model, checking there is one coefficient per feature
    pub fn new(features: FeatureSchema, intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.len() != features.len() {
            return Err(ForecastError::ValidationError(format!(
                "Coefficients length ({}) doesn't match features length ({})",
                coefficients.len(),
                features.len()
            )));
        }

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Model weights must be finite".to_string(),
            ));
        }

        Ok(Self {
            features,
            intercept,
            coefficients,
        })
    }

    /// Load a model artifact from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let raw: LinearModelFile = serde_json::from_reader(BufReader::new(file))?;
        Self::new(raw.features, raw.intercept, raw.coefficients)
    }

    /// Parse a model artifact from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: LinearModelFile = serde_json::from_str(json)?;
        Self::new(raw.features, raw.intercept, raw.coefficients)
    }

    /// Serialize the model back to its JSON artifact form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn features(&self) -> &FeatureSchema {
        &self.features
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> std::result::Result<f64, PredictorError> {
        let values = features.values();
        if values.len() != self.coefficients.len() {
            return Err(PredictorError::SchemaMismatch {
                expected: self.coefficients.len(),
                actual: values.len(),
            });
        }

        if features.names() != self.features.names() {
            return Err(PredictorError::FeatureMismatch {
                expected: self.features.names().to_vec(),
                actual: features.names().to_vec(),
            });
        }

        let prediction = self.intercept
            + values
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();

        if prediction.is_finite() {
            Ok(prediction)
        } else {
            Err(PredictorError::NonFinite(prediction))
        }
    }

    fn schema(&self) -> Option<&FeatureSchema> {
        Some(&self.features)
    }

    fn name(&self) -> &str {
        "linear regression"
    }
}
