//! Feature vectors handed to the sales predictor
//!
//! A vector starts from the baseline template's numeric fields (`sales`,
//! `waste`, `temp` and every covariate), then gets the calendar fields and the
//! lag features for the forecast day written over it. Before prediction it is
//! restricted to the model's [`FeatureSchema`], in schema order.

use crate::data::HistoricalRecord;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DAY_OF_WEEK: &str = "dayofweek";
pub const MONTH: &str = "month";
pub const IS_WEEKEND: &str = "is_weekend";
pub const SALES_LAG1: &str = "sales_lag1";
pub const SALES_LAG7: &str = "sales_lag7";

/// Ordered, duplicate-free list of feature names a predictor expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema, rejecting empty or duplicated names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ForecastError::ValidationError(
                "Feature schema must name at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(ForecastError::ValidationError(
                    "Feature names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::ValidationError(format!(
                    "Duplicate feature '{}' in schema",
                    name
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = ForecastError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names
    }
}

/// Named numeric features for one forecast day, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    date: NaiveDate,
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Start an empty vector for `date`
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build the full vector for `date` from the baseline template and lag values
    pub fn for_day(template: &HistoricalRecord, date: NaiveDate, lag1: f64, lag7: f64) -> Self {
        let mut vector = Self::new(date);

        vector.set("sales", template.sales);
        if let Some(waste) = template.waste {
            vector.set("waste", waste);
        }
        if let Some(temp) = template.temp {
            vector.set("temp", temp);
        }
        for (name, value) in &template.covariates {
            vector.set(name, *value);
        }

        let dayofweek = date.weekday().num_days_from_monday();
        vector.set(DAY_OF_WEEK, f64::from(dayofweek));
        vector.set(MONTH, f64::from(date.month()));
        vector.set(IS_WEEKEND, if dayofweek >= 5 { 1.0 } else { 0.0 });
        vector.set(SALES_LAG1, lag1);
        vector.set(SALES_LAG7, lag7);

        vector
    }

    /// Insert a feature, overwriting any existing value in place
    pub fn set(&mut self, name: &str, value: f64) {
        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.names.push(name.to_string());
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    /// The forecast day this vector describes
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep exactly the schema's features, in schema order
    pub fn restrict(&self, schema: &FeatureSchema) -> Result<FeatureVector> {
        let values = schema
            .names()
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| ForecastError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self {
            date: self.date,
            names: schema.names().to_vec(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> HistoricalRecord {
        HistoricalRecord::new(
            NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            "Hamburg",
            "Edeka",
            "Bread",
            40.0,
        )
        .with_temp(21.5)
        .with_covariate("price", 2.49)
    }

    #[test]
    fn test_calendar_fields() {
        // 2024-06-08 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let vector = FeatureVector::for_day(&template(), saturday, 40.0, 38.0);

        assert_eq!(vector.get(DAY_OF_WEEK), Some(5.0));
        assert_eq!(vector.get(MONTH), Some(6.0));
        assert_eq!(vector.get(IS_WEEKEND), Some(1.0));

        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let vector = FeatureVector::for_day(&template(), monday, 40.0, 38.0);
        assert_eq!(vector.get(DAY_OF_WEEK), Some(0.0));
        assert_eq!(vector.get(IS_WEEKEND), Some(0.0));
    }

    #[test]
    fn test_template_fields_copied() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let vector = FeatureVector::for_day(&template(), day, 12.0, 9.0);

        assert_eq!(vector.get("temp"), Some(21.5));
        assert_eq!(vector.get("price"), Some(2.49));
        assert_eq!(vector.get("waste"), None);
        assert_eq!(vector.get(SALES_LAG1), Some(12.0));
        assert_eq!(vector.get(SALES_LAG7), Some(9.0));
    }

    #[test]
    fn test_restrict_follows_schema_order() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let vector = FeatureVector::for_day(&template(), day, 12.0, 9.0);
        let schema = FeatureSchema::new([SALES_LAG7, "price", SALES_LAG1]).unwrap();

        let restricted = vector.restrict(&schema).unwrap();
        assert_eq!(restricted.names(), schema.names());
        assert_eq!(restricted.values(), &[9.0, 2.49, 12.0]);
    }

    #[test]
    fn test_restrict_reports_missing_feature() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let vector = FeatureVector::for_day(&template(), day, 12.0, 9.0);
        let schema = FeatureSchema::new([SALES_LAG1, "holiday"]).unwrap();

        match vector.restrict(&schema) {
            Err(ForecastError::MissingFeature(name)) => assert_eq!(name, "holiday"),
            other => panic!("Expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        assert!(FeatureSchema::new([SALES_LAG1, SALES_LAG1]).is_err());
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
    }
}
