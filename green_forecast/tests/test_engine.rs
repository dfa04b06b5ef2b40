use chrono::NaiveDate;
use green_forecast::features::{DAY_OF_WEEK, IS_WEEKEND, MONTH, SALES_LAG1, SALES_LAG7};
use green_forecast::{
    forecast, forecast_one, FeatureSchema, FeatureVector, FnPredictor, ForecastConfig,
    ForecastError, HistoricalRecord, LinearModel, PredictorError,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::cell::Cell;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// One record per day starting 2024-01-01
fn history_with_sales(sales: &[f64]) -> Vec<HistoricalRecord> {
    sales
        .iter()
        .enumerate()
        .map(|(i, s)| {
            HistoricalRecord::new(date(2024, 1, i as u32 + 1), "Berlin", "Rewe", "Milk", *s)
                .with_temp(4.0)
        })
        .collect()
}

fn lag_schema() -> FeatureSchema {
    FeatureSchema::new([SALES_LAG1, SALES_LAG7, DAY_OF_WEEK, MONTH, IS_WEEKEND]).unwrap()
}

fn increment_predictor() -> FnPredictor<impl Fn(&FeatureVector) -> Result<f64, PredictorError>> {
    FnPredictor::new(|fv: &FeatureVector| {
        fv.get(SALES_LAG1)
            .map(|lag1| lag1 + 1.0)
            .ok_or_else(|| PredictorError::Model("sales_lag1 missing".to_string()))
    })
}

// Depends on calendar and lag features so day-specific inputs show up in the output
fn calendar_predictor() -> FnPredictor<impl Fn(&FeatureVector) -> Result<f64, PredictorError>> {
    FnPredictor::new(|fv: &FeatureVector| {
        let value = |name: &str| fv.get(name).unwrap_or_default();
        Ok(0.5 * value(SALES_LAG1)
            + 0.25 * value(SALES_LAG7)
            + value(DAY_OF_WEEK)
            + 10.0 * value(IS_WEEKEND)
            + value(MONTH))
    })
}

#[rstest]
#[case(date(2024, 2, 10), date(2024, 2, 10))]
#[case(date(2024, 2, 27), date(2024, 3, 2))]
#[case(date(2023, 12, 30), date(2024, 1, 2))]
#[case(date(2024, 3, 1), date(2024, 4, 29))]
fn test_one_point_per_day(#[case] start: NaiveDate, #[case] end: NaiveDate) {
    let history = history_with_sales(&[10.0, 12.0, 11.0]);

    let outcome = forecast(
        &history,
        start,
        end,
        &calendar_predictor(),
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    assert!(outcome.is_complete());
    let dates = outcome.result.dates();
    assert_eq!(dates.len() as i64, (end - start).num_days() + 1);
    assert_eq!(dates.first(), Some(&start));
    assert_eq!(dates.last(), Some(&end));
    for pair in dates.windows(2) {
        assert_eq!(pair[0].succ_opt(), Some(pair[1]));
    }
}

#[test]
fn test_single_day_range_matches_forecast_one() {
    let history = history_with_sales(&[10.0, 12.0, 11.0, 15.0, 9.0, 13.0, 14.0, 16.0]);
    let schema = lag_schema();
    let predictor = calendar_predictor();
    let day = date(2024, 1, 13);

    let outcome = forecast(
        &history,
        day,
        day,
        &predictor,
        &schema,
        ForecastConfig::default(),
    )
    .unwrap();
    let single =
        forecast_one(&history, day, &predictor, &schema, ForecastConfig::default()).unwrap();

    assert_eq!(outcome.result.points(), &[single]);
}

#[test]
fn test_predictions_feed_next_day_lag1() {
    let history = history_with_sales(&[4.0, 10.0]);

    let outcome = forecast(
        &history,
        date(2024, 1, 3),
        date(2024, 1, 5),
        &increment_predictor(),
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.result.predicted_sales(), vec![11.0, 12.0, 13.0]);
}

#[test]
fn test_waste_and_co2_use_default_rates() {
    let history = history_with_sales(&[10.0, 12.0, 11.0]);

    let outcome = forecast(
        &history,
        date(2024, 1, 4),
        date(2024, 1, 10),
        &calendar_predictor(),
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    for point in &outcome.result {
        assert_eq!(point.derived_waste, point.predicted_sales * 0.15);
        assert_eq!(point.derived_co2, point.derived_waste * 2.5);
    }
}

#[test]
fn test_custom_rates() {
    let history = history_with_sales(&[10.0]);
    let config = ForecastConfig::new(0.5, 2.0).unwrap();

    let point = forecast_one(
        &history,
        date(2024, 1, 2),
        &increment_predictor(),
        &lag_schema(),
        config,
    )
    .unwrap();

    assert_eq!(point.predicted_sales, 11.0);
    assert_eq!(point.derived_waste, 5.5);
    assert_eq!(point.derived_co2, 11.0);
}

#[test]
fn test_empty_history_is_rejected() {
    let calls = Cell::new(0);
    let predictor = FnPredictor::new(|_: &FeatureVector| {
        calls.set(calls.get() + 1);
        Ok(1.0)
    });

    let result = forecast(
        &[],
        date(2024, 1, 1),
        date(2024, 1, 3),
        &predictor,
        &lag_schema(),
        ForecastConfig::default(),
    );

    assert!(matches!(result, Err(ForecastError::InsufficientHistory)));
    assert!(matches!(
        forecast_one(&[], date(2024, 1, 1), &predictor, &lag_schema(), ForecastConfig::default()),
        Err(ForecastError::InsufficientHistory)
    ));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_reversed_range_is_rejected() {
    let history = history_with_sales(&[10.0]);

    let result = forecast(
        &history,
        date(2024, 1, 5),
        date(2024, 1, 4),
        &increment_predictor(),
        &lag_schema(),
        ForecastConfig::default(),
    );

    match result {
        Err(ForecastError::InvalidRange { start, end }) => {
            assert_eq!(start, date(2024, 1, 5));
            assert_eq!(end, date(2024, 1, 4));
        }
        other => panic!("Expected InvalidRange, got {:?}", other),
    }
}

#[test]
fn test_failure_on_third_day_keeps_two_points() {
    let history = history_with_sales(&[10.0]);
    let failing_day = date(2024, 1, 12);
    let calls = Cell::new(0);
    let predictor = FnPredictor::new(|fv: &FeatureVector| {
        calls.set(calls.get() + 1);
        if fv.date() == failing_day {
            Err(PredictorError::Model("model rejected input".to_string()))
        } else {
            Ok(fv.get(SALES_LAG1).unwrap_or_default() + 1.0)
        }
    });

    let outcome = forecast(
        &history,
        date(2024, 1, 10),
        date(2024, 1, 14),
        &predictor,
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.result.dates(), vec![date(2024, 1, 10), date(2024, 1, 11)]);
    assert_eq!(calls.get(), 3);

    let failure = outcome.failure.as_ref().unwrap();
    assert_eq!(failure.failed_day(), Some(failing_day));
    assert!(matches!(
        failure,
        ForecastError::PredictionFailure {
            source: PredictorError::Model(_),
            ..
        }
    ));

    assert!(outcome.into_result().is_err());
}

#[test]
fn test_short_history_lag7_falls_back_to_lag1() {
    let history = history_with_sales(&[4.0, 8.0, 12.0]);
    let echo_lag7 = FnPredictor::new(|fv: &FeatureVector| {
        fv.get(SALES_LAG7)
            .ok_or_else(|| PredictorError::Model("sales_lag7 missing".to_string()))
    });

    let point = forecast_one(
        &history,
        date(2024, 1, 4),
        &echo_lag7,
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(point.predicted_sales, 12.0);
}

#[test]
fn test_full_week_history_lag7_is_mean() {
    let history = history_with_sales(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    let echo_lag7 = FnPredictor::new(|fv: &FeatureVector| {
        fv.get(SALES_LAG7)
            .ok_or_else(|| PredictorError::Model("sales_lag7 missing".to_string()))
    });

    let point = forecast_one(
        &history,
        date(2024, 1, 8),
        &echo_lag7,
        &lag_schema(),
        ForecastConfig::default(),
    )
    .unwrap();

    assert!((point.predicted_sales - 4.0).abs() < 1e-12);
}

#[test]
fn test_schema_restricts_and_orders_features() {
    let history = history_with_sales(&[10.0]);
    let schema = FeatureSchema::new([IS_WEEKEND, "temp", SALES_LAG1]).unwrap();
    let predictor = FnPredictor::new(|fv: &FeatureVector| {
        assert_eq!(fv.names(), &["is_weekend", "temp", "sales_lag1"]);
        Ok(fv.values().iter().sum())
    });

    // 2024-01-06 is a Saturday
    let point = forecast_one(
        &history,
        date(2024, 1, 6),
        &predictor,
        &schema,
        ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(point.predicted_sales, 1.0 + 4.0 + 10.0);
}

#[test]
fn test_missing_feature_stops_before_predicting() {
    let history = history_with_sales(&[10.0]);
    let schema = FeatureSchema::new([SALES_LAG1, "holiday"]).unwrap();
    let calls = Cell::new(0);
    let predictor = FnPredictor::new(|_: &FeatureVector| {
        calls.set(calls.get() + 1);
        Ok(1.0)
    });

    let result = forecast(
        &history,
        date(2024, 1, 2),
        date(2024, 1, 4),
        &predictor,
        &schema,
        ForecastConfig::default(),
    );

    assert!(matches!(result, Err(ForecastError::MissingFeature(name)) if name == "holiday"));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_schema_must_match_trained_model() {
    // lag1 is 100, the seven-day mean is far lower
    let history = history_with_sales(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0]);
    let trained = FeatureSchema::new([SALES_LAG1, SALES_LAG7]).unwrap();
    let model = LinearModel::new(trained.clone(), 0.0, vec![1.0, 0.0]).unwrap();
    let day = date(2024, 1, 8);

    let swapped = FeatureSchema::new([SALES_LAG7, SALES_LAG1]).unwrap();
    let result = forecast(&history, day, day, &model, &swapped, ForecastConfig::default());
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    assert!(forecast_one(&history, day, &model, &swapped, ForecastConfig::default()).is_err());

    let point = forecast_one(&history, day, &model, &trained, ForecastConfig::default()).unwrap();
    assert_eq!(point.predicted_sales, 100.0);
}
