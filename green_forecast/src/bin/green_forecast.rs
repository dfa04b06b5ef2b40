use chrono::Days;
use green_forecast::config::AppConfig;
use green_forecast::export::write_csv_file;
use green_forecast::metrics::ForecastSummary;
use green_forecast::optimize::{optimize_order, DEFAULT_SAFETY_FACTOR};
use green_forecast::{forecast, ForecastError, HistoricalStore, LinearModel};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = HistoricalStore::from_csv(&config.data_path)?.filter(&config.filter);
    let model = LinearModel::from_json_file(&config.model_path)?;

    // Forecast the days right after the last observation
    let (_, last_observed) = store.date_range().ok_or(ForecastError::InsufficientHistory)?;
    let start = last_observed
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ForecastError::DataError("Forecast start out of range".to_string()))?;
    let end = start
        .checked_add_days(Days::new(u64::from(config.horizon_days) - 1))
        .ok_or_else(|| ForecastError::DataError("Forecast end out of range".to_string()))?;

    info!(
        records = store.len(),
        %start,
        %end,
        "Running forecast"
    );

    let outcome = forecast(
        store.records(),
        start,
        end,
        &model,
        model.features(),
        config.forecast,
    )?;

    let summary = ForecastSummary::new(&store, &outcome.result, config.forecast.waste_rate);
    if let Some(mean) = outcome.result.mean_predicted_sales() {
        info!(
            predicted_total = summary.predicted_total,
            estimated_waste = summary.estimated_waste,
            co2_kg = outcome.result.total_co2(),
            recommended_order = optimize_order(mean, DEFAULT_SAFETY_FACTOR)?,
            "Forecast summary"
        );
    }

    write_csv_file(&outcome.result, &config.output_path)?;
    info!(path = %config.output_path.display(), "Wrote forecast");

    match outcome.failure {
        None => Ok(()),
        Some(err) => {
            warn!(days = outcome.result.len(), "Wrote partial forecast");
            Err(err.into())
        }
    }
}
