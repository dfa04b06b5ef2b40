//! Summary statistics over historical sales and forecasts

use crate::data::HistoricalStore;
use crate::engine::ForecastResult;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Total units sold across the store
pub fn total_sales(store: &HistoricalStore) -> f64 {
    store.records().iter().map(|r| r.sales).sum()
}

/// Mean of the per-date sales totals; 0 for an empty store
pub fn average_daily_sales(store: &HistoricalStore) -> f64 {
    let daily = store.daily_sales();
    if daily.is_empty() {
        return 0.0;
    }
    daily.values().mean()
}

/// Mean recorded waste, `None` when no record carries a waste value
pub fn average_waste(store: &HistoricalStore) -> Option<f64> {
    let waste: Vec<f64> = store.records().iter().filter_map(|r| r.waste).collect();
    if waste.is_empty() {
        None
    } else {
        Some(waste.mean())
    }
}

/// The `n` best-selling products, highest total first
pub fn top_products(store: &HistoricalStore, n: usize) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in store.records() {
        *totals.entry(record.product.as_str()).or_insert(0.0) += record.sales;
    }

    let mut ranked: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(product, total)| (product.to_string(), total))
        .collect();
    // Ties keep alphabetical order from the map
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Pearson correlation between temperature and sales
///
/// Only records with a temperature take part. `None` when fewer than two such
/// records exist or either side has no variance.
pub fn temp_sales_correlation(store: &HistoricalStore) -> Option<f64> {
    let (temps, sales): (Vec<f64>, Vec<f64>) = store
        .records()
        .iter()
        .filter_map(|r| r.temp.map(|t| (t, r.sales)))
        .unzip();

    if temps.len() < 2 {
        return None;
    }

    let temp_sd = temps.as_slice().std_dev();
    let sales_sd = sales.as_slice().std_dev();
    if temp_sd == 0.0 || sales_sd == 0.0 {
        return None;
    }

    let covariance = temps.as_slice().covariance(sales.as_slice());
    Some(covariance / (temp_sd * sales_sd))
}

/// Date-summed sales for the last `days` observed dates
pub fn recent_daily_sales(store: &HistoricalStore, days: usize) -> Vec<(NaiveDate, f64)> {
    let daily: Vec<(NaiveDate, f64)> = store.daily_sales().into_iter().collect();
    let start = daily.len().saturating_sub(days);
    daily[start..].to_vec()
}

/// One date of an actual-versus-predicted comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

/// Outer join of observed daily sales with a forecast, missing sides as 0
pub fn compare_with_actuals(
    store: &HistoricalStore,
    result: &ForecastResult,
) -> Vec<ComparisonRow> {
    let mut rows: BTreeMap<NaiveDate, ComparisonRow> = BTreeMap::new();

    for (date, actual) in store.daily_sales() {
        rows.insert(
            date,
            ComparisonRow {
                date,
                actual,
                predicted: 0.0,
            },
        );
    }

    for point in result {
        rows.entry(point.date)
            .or_insert(ComparisonRow {
                date: point.date,
                actual: 0.0,
                predicted: 0.0,
            })
            .predicted += point.predicted_sales;
    }

    rows.into_values().collect()
}

/// Headline figures for a forecast window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastSummary {
    /// Rounded sum of predicted sales
    pub predicted_total: i64,
    /// Rounded sum of observed sales inside the forecast window
    pub actual_total: i64,
    /// Rounded predicted total times the waste rate
    pub estimated_waste: i64,
}

impl ForecastSummary {
    pub fn new(store: &HistoricalStore, result: &ForecastResult, waste_rate: f64) -> Self {
        let predicted_total = result.total_predicted_sales().round() as i64;
        let actual_total = match (result.points().first(), result.points().last()) {
            (Some(first), Some(last)) => store
                .actuals_between(first.date, last.date)
                .values()
                .sum::<f64>()
                .round() as i64,
            _ => 0,
        };

        Self {
            predicted_total,
            actual_total,
            estimated_waste: (predicted_total as f64 * waste_rate).round() as i64,
        }
    }
}

/// Score a forecast against the sales that were actually observed
///
/// `mape` averages only over days with non-zero actual sales and is 0 when
/// every actual is zero.
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Cannot score {} predictions against {} actuals",
            forecast.len(),
            actual.len()
        )));
    }

    let pairs = || actual.iter().zip(forecast).map(|(&a, &f)| (a, f));

    let mae = pairs().map(|(a, f)| (a - f).abs()).mean();
    let mse = pairs().map(|(a, f)| (a - f).powi(2)).mean();

    let percentage: Vec<f64> = pairs()
        .filter(|(a, _)| *a != 0.0)
        .map(|(a, f)| (a - f).abs() / a.abs() * 100.0)
        .collect();
    let mape = if percentage.is_empty() {
        0.0
    } else {
        percentage.mean()
    };

    let smape = pairs()
        .map(|(a, f)| match a.abs() + f.abs() {
            denom if denom == 0.0 => 0.0,
            denom => 200.0 * (a - f).abs() / denom,
        })
        .mean();

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        smape,
    })
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}
