//! Order quantity suggestion from forecast demand

use crate::error::{ForecastError, Result};

/// Safety factor used when the caller has no preference
pub const DEFAULT_SAFETY_FACTOR: f64 = 0.95;

/// Fixed buffer added on top of expected demand
const BASE_BUFFER: f64 = 0.10;

/// Suggest how many units to order for an expected daily demand
///
/// The quantity is `predicted_mean * (1 + (1 - safety_factor) * 0.5 + 0.10)`,
/// rounded and clamped at zero. A lower safety factor widens the buffer.
pub fn optimize_order(predicted_mean: f64, safety_factor: f64) -> Result<u64> {
    if !(0.0..=1.0).contains(&safety_factor) {
        return Err(ForecastError::InvalidParameter(format!(
            "Safety factor must be between 0 and 1, got {}",
            safety_factor
        )));
    }
    if !predicted_mean.is_finite() {
        return Err(ForecastError::InvalidParameter(format!(
            "Expected demand must be finite, got {}",
            predicted_mean
        )));
    }

    let quantity = (predicted_mean * (1.0 + (1.0 - safety_factor) * 0.5 + BASE_BUFFER)).round();
    Ok(quantity.max(0.0) as u64)
}
