//! Historical sales data handling

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Selection value meaning "no filter" in filter widgets
pub const ALL: &str = "All";

/// One observed day of sales for a product in a supermarket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Calendar day of the observation
    pub date: NaiveDate,
    /// City the supermarket is located in
    pub city: String,
    /// Supermarket chain or branch
    pub supermarket: String,
    /// Product identifier
    pub product: String,
    /// Units sold, never negative
    pub sales: f64,
    /// Units wasted, if recorded
    pub waste: Option<f64>,
    /// Temperature on the day, if recorded
    pub temp: Option<f64>,
    /// Any further numeric columns, keyed by column name
    #[serde(default)]
    pub covariates: BTreeMap<String, f64>,
}

impl HistoricalRecord {
    /// Create a record without optional measurements
    pub fn new(
        date: NaiveDate,
        city: impl Into<String>,
        supermarket: impl Into<String>,
        product: impl Into<String>,
        sales: f64,
    ) -> Self {
        Self {
            date,
            city: city.into(),
            supermarket: supermarket.into(),
            product: product.into(),
            sales,
            waste: None,
            temp: None,
            covariates: BTreeMap::new(),
        }
    }

    pub fn with_waste(mut self, waste: f64) -> Self {
        self.waste = Some(waste);
        self
    }

    pub fn with_temp(mut self, temp: f64) -> Self {
        self.temp = Some(temp);
        self
    }

    pub fn with_covariate(mut self, name: impl Into<String>, value: f64) -> Self {
        self.covariates.insert(name.into(), value);
        self
    }
}

/// Equality filter over the categorical identifiers; `None` matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub city: Option<String>,
    pub supermarket: Option<String>,
    pub product: Option<String>,
}

impl StoreFilter {
    /// A filter that keeps every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from widget selections, where [`ALL`] disables a field
    pub fn from_selection(city: &str, supermarket: &str, product: &str) -> Self {
        Self {
            city: selection(city),
            supermarket: selection(supermarket),
            product: selection(product),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_supermarket(mut self, supermarket: impl Into<String>) -> Self {
        self.supermarket = Some(supermarket.into());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Check whether a record passes every active field
    pub fn matches(&self, record: &HistoricalRecord) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |w| w == actual)
        }

        field_matches(&self.city, &record.city)
            && field_matches(&self.supermarket, &record.supermarket)
            && field_matches(&self.product, &record.product)
    }
}

fn selection(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == ALL {
        None
    } else {
        Some(value.to_string())
    }
}

/// Read-only collection of historical records, kept in ascending date order
#[derive(Debug, Clone, Default)]
pub struct HistoricalStore {
    records: Vec<HistoricalRecord>,
}

impl HistoricalStore {
    /// Create a store from records, validating sales values
    pub fn new(mut records: Vec<HistoricalRecord>) -> Result<Self> {
        for record in &records {
            if !record.sales.is_finite() || record.sales < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Invalid sales value {} on {} for {}/{}/{}",
                    record.sales, record.date, record.city, record.supermarket, record.product
                )));
            }
        }

        // Stable, so same-day rows keep their input order
        records.sort_by_key(|r| r.date);
        Ok(Self { records })
    }

    /// Load historical records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            records = store.len(),
            "Loaded historical sales"
        );
        Ok(store)
    }

    /// Load historical records from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = ColumnLayout::detect(reader.headers()?)?;
        let mut skipped: BTreeSet<String> = BTreeSet::new();
        let mut records = Vec::new();

        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            // Header is line 1
            records.push(columns.parse_row(&row, idx + 2, &mut skipped)?);
        }

        for column in &skipped {
            warn!(column = %column, "Skipped non-numeric covariate values");
        }

        Self::new(records)
    }

    /// All records in ascending date order
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Keep only the records that match the filter
    pub fn filter(&self, filter: &StoreFilter) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
        }
    }

    /// The `n` most recent records, oldest first
    pub fn most_recent(&self, n: usize) -> &[HistoricalRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Earliest and latest observed dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    pub fn cities(&self) -> Vec<String> {
        self.distinct(|r| &r.city)
    }

    pub fn supermarkets(&self) -> Vec<String> {
        self.distinct(|r| &r.supermarket)
    }

    pub fn products(&self) -> Vec<String> {
        self.distinct(|r| &r.product)
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&HistoricalRecord) -> &String,
    {
        self.records
            .iter()
            .map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Sales summed per date across every record in the store
    pub fn daily_sales(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.date).or_insert(0.0) += record.sales;
        }
        totals
    }

    /// Date-summed sales within `start..=end`
    pub fn actuals_between(&self, start: NaiveDate, end: NaiveDate) -> BTreeMap<NaiveDate, f64> {
        self.daily_sales()
            .into_iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .collect()
    }
}

/// Positions of the known columns in a CSV header
#[derive(Debug)]
struct ColumnLayout {
    date: usize,
    city: usize,
    supermarket: usize,
    product: usize,
    sales: usize,
    waste: Option<usize>,
    temp: Option<usize>,
    covariates: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn detect(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |wanted: &str| names.iter().position(|n| n == wanted);
        let require = |wanted: &str| {
            find(wanted).ok_or_else(|| {
                ForecastError::DataError(format!("Required column '{}' not found", wanted))
            })
        };

        let date = require("date")?;
        let city = require("city")?;
        let supermarket = require("supermarket")?;
        let product = require("product")?;
        let sales = require("sales")?;
        let waste = find("waste");
        let temp = find("temp");

        let known = [
            Some(date),
            Some(city),
            Some(supermarket),
            Some(product),
            Some(sales),
            waste,
            temp,
        ];
        let covariates = names
            .iter()
            .enumerate()
            .filter(|(idx, _)| !known.contains(&Some(*idx)))
            .map(|(idx, name)| (idx, name.clone()))
            .collect();

        Ok(Self {
            date,
            city,
            supermarket,
            product,
            sales,
            waste,
            temp,
            covariates,
        })
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        line: usize,
        skipped: &mut BTreeSet<String>,
    ) -> Result<HistoricalRecord> {
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let date = parse_date(field(self.date)).ok_or_else(|| {
            ForecastError::DataError(format!(
                "line {}: invalid date '{}'",
                line,
                field(self.date)
            ))
        })?;

        let sales = field(self.sales).parse::<f64>().map_err(|_| {
            ForecastError::DataError(format!(
                "line {}: invalid sales value '{}'",
                line,
                field(self.sales)
            ))
        })?;

        let optional = |idx: Option<usize>, name: &str| -> Result<Option<f64>> {
            match idx.map(field) {
                None | Some("") => Ok(None),
                Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                    ForecastError::DataError(format!(
                        "line {}: invalid {} value '{}'",
                        line, name, raw
                    ))
                }),
            }
        };

        let mut record = HistoricalRecord::new(
            date,
            field(self.city),
            field(self.supermarket),
            field(self.product),
            sales,
        );
        record.waste = optional(self.waste, "waste")?;
        record.temp = optional(self.temp, "temp")?;

        for (idx, name) in &self.covariates {
            let raw = field(*idx);
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<f64>() {
                Ok(value) => {
                    record.covariates.insert(name.clone(), value);
                }
                Err(_) => {
                    skipped.insert(name.clone());
                }
            }
        }

        Ok(record)
    }
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
