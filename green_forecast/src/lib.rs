//! # Green Forecast
//!
//! Daily retail sales forecasting with waste and CO2 estimates.
//!
//! ## Features
//!
//! - Historical sales loading and filtering by city, supermarket and product
//! - Autoregressive multi-day forecasts where each prediction feeds the next
//!   day's lag features
//! - Pluggable predictors, including a linear model loaded from JSON
//! - Waste and CO2 estimates derived from predicted sales
//! - Overview metrics, order suggestions and CSV export
//!
//! ## Quick Start
//!
//! ```no_run
//! use green_forecast::data::{HistoricalStore, StoreFilter};
//! use green_forecast::engine::{forecast, ForecastConfig};
//! use green_forecast::predictor::{LinearModel, Predictor};
//!
//! # fn main() -> green_forecast::Result<()> {
//! let store = HistoricalStore::from_csv("demo_german_sales.csv")?
//!     .filter(&StoreFilter::all().with_city("Berlin").with_product("Milk"));
//! let model = LinearModel::from_json_file("xgb_model.json")?;
//!
//! let start = chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//! let end = chrono::NaiveDate::from_ymd_opt(2024, 7, 7).unwrap();
//! let outcome = forecast(
//!     store.records(),
//!     start,
//!     end,
//!     &model,
//!     model.features(),
//!     ForecastConfig::default(),
//! )?;
//!
//! for point in &outcome.result {
//!     println!("{}: {:.1}", point.date, point.predicted_sales);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod features;
pub mod metrics;
pub mod optimize;
pub mod predictor;

// Re-export commonly used types
pub use crate::data::{HistoricalRecord, HistoricalStore, StoreFilter};
pub use crate::engine::{
    forecast, forecast_one, ForecastConfig, ForecastIter, ForecastOutcome, ForecastPoint,
    ForecastResult,
};
pub use crate::error::{ForecastError, PredictorError, Result};
pub use crate::features::{FeatureSchema, FeatureVector};
pub use crate::predictor::{FnPredictor, LinearModel, Predictor};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
