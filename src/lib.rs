//! # GreenForecast
//!
//! `greenforecast_workspace` bundles the GreenForecast crates behind a single
//! dependency. Everything is re-exported from [`green_forecast`].
//!
//! ## Example
//!
//! ```
//! use greenforecast_workspace::{forecast_one, FeatureSchema, FeatureVector, FnPredictor};
//! use greenforecast_workspace::{ForecastConfig, HistoricalRecord};
//!
//! let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let history = vec![HistoricalRecord::new(day, "Berlin", "Rewe", "Milk", 10.0)];
//! let schema = FeatureSchema::new(["sales_lag1"]).unwrap();
//! let predictor = FnPredictor::new(|fv: &FeatureVector| Ok(fv.values()[0] * 2.0));
//!
//! let next = day.succ_opt().unwrap();
//! let config = ForecastConfig::default();
//! let point = forecast_one(&history, next, &predictor, &schema, config).unwrap();
//! assert_eq!(point.predicted_sales, 20.0);
//! ```

pub use green_forecast::*;
