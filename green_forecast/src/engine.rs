//! Sequential day-by-day sales forecasting
//!
//! Each forecast day feeds its prediction into the next day's lag features,
//! so days are produced strictly in ascending date order. After day `d`:
//!
//! - `sales_lag7` takes the value `sales_lag1` had on day `d`
//! - `sales_lag1` takes the prediction for day `d`
//!
//! Note the `sales_lag7` rule is a one-day shift of `sales_lag1`, not a
//! trailing 7-day mean. Only the initial value is a mean over history.

use crate::data::HistoricalRecord;
use crate::error::{ForecastError, PredictorError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::predictor::Predictor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::iter::FusedIterator;
use tracing::{debug, info, warn};

/// Share of predicted sales expected to end up as waste
pub const DEFAULT_WASTE_RATE: f64 = 0.15;
/// kg of CO2 per unit of waste
pub const DEFAULT_CO2_FACTOR: f64 = 2.5;
/// Number of trailing records averaged for the initial `sales_lag7`
pub const LAG7_WINDOW: usize = 7;

/// Rates used to derive waste and CO2 from predicted sales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub waste_rate: f64,
    pub co2_factor: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            waste_rate: DEFAULT_WASTE_RATE,
            co2_factor: DEFAULT_CO2_FACTOR,
        }
    }
}

impl ForecastConfig {
    /// Create a config, rejecting negative or non-finite rates
    pub fn new(waste_rate: f64, co2_factor: f64) -> Result<Self> {
        if !waste_rate.is_finite() || waste_rate < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Waste rate must be a non-negative number, got {}",
                waste_rate
            )));
        }
        if !co2_factor.is_finite() || co2_factor < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "CO2 factor must be a non-negative number, got {}",
                co2_factor
            )));
        }

        Ok(Self {
            waste_rate,
            co2_factor,
        })
    }
}

/// Forecast for a single day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub derived_waste: f64,
    pub derived_co2: f64,
}

impl ForecastPoint {
    /// Derive waste and CO2 for a predicted sales value
    pub fn new(date: NaiveDate, predicted_sales: f64, config: &ForecastConfig) -> Self {
        let derived_waste = predicted_sales * config.waste_rate;
        Self {
            date,
            predicted_sales,
            derived_waste,
            derived_co2: derived_waste * config.co2_factor,
        }
    }
}

/// Forecast points in ascending date order, one per calendar day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Wrap points that already cover consecutive days in ascending order
    pub fn from_points(points: Vec<ForecastPoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[0].date.succ_opt() != Some(pair[1].date) {
                return Err(ForecastError::ValidationError(format!(
                    "Forecast points must cover consecutive days, found {} followed by {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<ForecastPoint> {
        self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn predicted_sales(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_sales).collect()
    }

    pub fn total_predicted_sales(&self) -> f64 {
        self.points.iter().map(|p| p.predicted_sales).sum()
    }

    pub fn total_waste(&self) -> f64 {
        self.points.iter().map(|p| p.derived_waste).sum()
    }

    pub fn total_co2(&self) -> f64 {
        self.points.iter().map(|p| p.derived_co2).sum()
    }

    /// Mean predicted sales per day, `None` for an empty forecast
    pub fn mean_predicted_sales(&self) -> Option<f64> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.total_predicted_sales() / self.points.len() as f64)
        }
    }
}

impl<'a> IntoIterator for &'a ForecastResult {
    type Item = &'a ForecastPoint;
    type IntoIter = std::slice::Iter<'a, ForecastPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Points computed by a forecast run, plus the prediction failure that stopped it early
#[derive(Debug)]
pub struct ForecastOutcome {
    /// Every point computed before the run stopped
    pub result: ForecastResult,
    /// Set when the predictor failed; `result` then holds the days before the failing one
    pub failure: Option<ForecastError>,
}

impl ForecastOutcome {
    /// True when every requested day was forecast
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Discard partial results, turning a failure into an error
    pub fn into_result(self) -> Result<ForecastResult> {
        match self.failure {
            None => Ok(self.result),
            Some(err) => Err(err),
        }
    }
}

/// Lazily produces forecast points one day at a time
///
/// Yields `Err` at most once, for the first day the predictor fails on, and
/// then stops.
pub struct ForecastIter<'a, P: ?Sized> {
    predictor: &'a P,
    schema: &'a FeatureSchema,
    config: ForecastConfig,
    template: HistoricalRecord,
    next_day: Option<NaiveDate>,
    end: NaiveDate,
    lag1: f64,
    lag7: f64,
}

impl<'a, P: Predictor + ?Sized> ForecastIter<'a, P> {
    /// Validate the inputs and prepare the lag state from `history`
    pub fn new(
        history: &[HistoricalRecord],
        start_date: NaiveDate,
        end_date: NaiveDate,
        predictor: &'a P,
        feature_schema: &'a FeatureSchema,
        config: ForecastConfig,
    ) -> Result<Self> {
        let (template, lag1, lag7) = baseline(history)?;

        if start_date > end_date {
            return Err(ForecastError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        if let Some(trained) = predictor.schema() {
            if trained != feature_schema {
                return Err(ForecastError::ValidationError(format!(
                    "Predictor '{}' was trained on {:?} but the forecast schema is {:?}",
                    predictor.name(),
                    trained.names(),
                    feature_schema.names()
                )));
            }
        }

        // Every day carries the same keys, so one check covers the whole range
        FeatureVector::for_day(&template, start_date, lag1, lag7).restrict(feature_schema)?;

        Ok(Self {
            predictor,
            schema: feature_schema,
            config,
            template,
            next_day: Some(start_date),
            end: end_date,
            lag1,
            lag7,
        })
    }

    /// Current `(sales_lag1, sales_lag7)` for the next day to be forecast
    pub fn lags(&self) -> (f64, f64) {
        (self.lag1, self.lag7)
    }

    fn step(&mut self, day: NaiveDate) -> Result<ForecastPoint> {
        let vector = FeatureVector::for_day(&self.template, day, self.lag1, self.lag7)
            .restrict(self.schema)?;

        let predicted = self
            .predictor
            .predict(&vector)
            .and_then(|value| {
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(PredictorError::NonFinite(value))
                }
            })
            .map_err(|source| ForecastError::PredictionFailure { day, source })?;

        debug!(
            %day,
            sales_lag1 = self.lag1,
            sales_lag7 = self.lag7,
            predicted,
            "Forecast day"
        );

        self.lag7 = self.lag1;
        self.lag1 = predicted;

        Ok(ForecastPoint::new(day, predicted, &self.config))
    }
}

impl<P: Predictor + ?Sized> Iterator for ForecastIter<'_, P> {
    type Item = Result<ForecastPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.next_day?;

        match self.step(day) {
            Ok(point) => {
                self.next_day = if day < self.end { day.succ_opt() } else { None };
                Some(Ok(point))
            }
            Err(err) => {
                self.next_day = None;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next_day {
            Some(day) => {
                let remaining = (self.end - day).num_days() as usize + 1;
                // A failing day ends the run early
                (1, Some(remaining))
            }
            None => (0, Some(0)),
        }
    }
}

impl<P: Predictor + ?Sized> FusedIterator for ForecastIter<'_, P> {}

/// Forecast every day from `start_date` to `end_date` inclusive
///
/// Precondition violations (empty history, reversed range, a schema feature
/// the baseline cannot supply) are returned as `Err` before anything is
/// predicted. A predictor failure stops the run; the outcome then holds the
/// days computed before the failing one together with the error.
pub fn forecast<P: Predictor + ?Sized>(
    history: &[HistoricalRecord],
    start_date: NaiveDate,
    end_date: NaiveDate,
    predictor: &P,
    feature_schema: &FeatureSchema,
    config: ForecastConfig,
) -> Result<ForecastOutcome> {
    let mut points = Vec::new();
    let mut failure = None;

    let steps =
        ForecastIter::new(history, start_date, end_date, predictor, feature_schema, config)?;
    for step in steps {
        match step {
            Ok(point) => points.push(point),
            Err(err) => {
                warn!(
                    computed = points.len(),
                    error = %err,
                    "Forecast stopped early"
                );
                failure = Some(err);
            }
        }
    }

    let result = ForecastResult { points };
    if failure.is_none() {
        info!(
            start = %start_date,
            end = %end_date,
            days = result.len(),
            model = predictor.name(),
            "Forecast complete"
        );
    }

    Ok(ForecastOutcome { result, failure })
}

/// Forecast a single day with lags taken straight from `history`
pub fn forecast_one<P: Predictor + ?Sized>(
    history: &[HistoricalRecord],
    date: NaiveDate,
    predictor: &P,
    feature_schema: &FeatureSchema,
    config: ForecastConfig,
) -> Result<ForecastPoint> {
    ForecastIter::new(history, date, date, predictor, feature_schema, config)?
        .next()
        .unwrap_or_else(|| {
            Err(ForecastError::ValidationError(format!(
                "No forecast produced for {}",
                date
            )))
        })
}

/// Most recent record plus the initial `(sales_lag1, sales_lag7)`
fn baseline(history: &[HistoricalRecord]) -> Result<(HistoricalRecord, f64, f64)> {
    let mut sorted: Vec<&HistoricalRecord> = history.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let template = match sorted.last() {
        Some(record) => (*record).clone(),
        None => return Err(ForecastError::InsufficientHistory),
    };

    let lag1 = template.sales;
    let lag7 = if sorted.len() >= LAG7_WINDOW {
        sorted[sorted.len() - LAG7_WINDOW..]
            .iter()
            .map(|r| r.sales)
            .mean()
    } else {
        lag1
    };

    Ok((template, lag1, lag7))
}
