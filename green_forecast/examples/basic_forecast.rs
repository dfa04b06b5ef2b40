use chrono::{Days, NaiveDate};
use green_forecast::export::to_csv_string;
use green_forecast::{forecast, ForecastConfig, HistoricalRecord, HistoricalStore, LinearModel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two weeks of bakery sales with a weekend bump
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).ok_or("invalid date")?;
    let records = (0..14)
        .map(|i| {
            let date = start + Days::new(i);
            let sales = if i % 7 >= 5 { 60.0 } else { 45.0 };
            HistoricalRecord::new(date, "Cologne", "Rewe", "Bread", sales)
                .with_waste(sales * 0.1)
                .with_temp(18.0)
        })
        .collect();
    let store = HistoricalStore::new(records)?;

    let model = LinearModel::from_json_str(
        r#"{
            "features": ["sales_lag1", "sales_lag7", "is_weekend", "temp"],
            "intercept": 3.0,
            "coefficients": [0.55, 0.35, 8.0, 0.1]
        }"#,
    )?;

    let (_, last) = store.date_range().ok_or("no history")?;
    let first_day = last + Days::new(1);
    let last_day = last + Days::new(7);

    let outcome = forecast(
        store.records(),
        first_day,
        last_day,
        &model,
        model.features(),
        ForecastConfig::default(),
    )?;

    println!("Forecast {} to {}:", first_day, last_day);
    for point in &outcome.result {
        println!(
            "{}: {:>6.1} units, {:>5.1} waste, {:>5.1} kg CO2",
            point.date, point.predicted_sales, point.derived_waste, point.derived_co2
        );
    }
    println!();
    print!("{}", to_csv_string(&outcome.result)?);

    Ok(())
}
