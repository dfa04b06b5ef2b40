//! Runtime configuration for the batch forecaster

use crate::data::StoreFilter;
use crate::engine::{ForecastConfig, DEFAULT_CO2_FACTOR, DEFAULT_WASTE_RATE};
use crate::error::{ForecastError, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// CSV with historical sales
    pub data_path: PathBuf,
    /// JSON model artifact
    pub model_path: PathBuf,
    /// Where the forecast CSV is written
    pub output_path: PathBuf,
    pub filter: StoreFilter,
    /// Days to forecast after the last observed date
    pub horizon_days: u32,
    pub forecast: ForecastConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let horizon_days: u32 = parse(&lookup, "GF_HORIZON_DAYS", 7)?;
        if horizon_days == 0 {
            return Err(ForecastError::ConfigError(
                "GF_HORIZON_DAYS must be at least 1".to_string(),
            ));
        }

        let forecast = ForecastConfig::new(
            parse(&lookup, "GF_WASTE_RATE", DEFAULT_WASTE_RATE)?,
            parse(&lookup, "GF_CO2_FACTOR", DEFAULT_CO2_FACTOR)?,
        )
        .map_err(|e| ForecastError::ConfigError(e.to_string()))?;

        Ok(Self {
            data_path: PathBuf::from(text("GF_DATA_PATH", "demo_german_sales.csv")),
            model_path: PathBuf::from(text("GF_MODEL_PATH", "xgb_model.json")),
            output_path: PathBuf::from(text("GF_OUTPUT_PATH", "forecast.csv")),
            filter: StoreFilter::from_selection(
                &text("GF_CITY", ""),
                &text("GF_SUPERMARKET", ""),
                &text("GF_PRODUCT", ""),
            ),
            horizon_days,
            forecast,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ForecastError::ConfigError(format!("{} has an invalid value '{}'", key, raw))
        }),
    }
}
