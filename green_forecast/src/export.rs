//! CSV export of forecast results

use crate::engine::ForecastResult;
use crate::error::{ForecastError, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `date,predicted_sales,derived_waste,derived_co2` rows to `writer`
pub fn write_csv<W: Write>(result: &ForecastResult, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if result.is_empty() {
        writer.write_record(["date", "predicted_sales", "derived_waste", "derived_co2"])?;
    }
    for point in result {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the forecast to a CSV file, replacing any existing file
pub fn write_csv_file<P: AsRef<Path>>(result: &ForecastResult, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_csv(result, file)
}

/// Render the forecast as a CSV string
pub fn to_csv_string(result: &ForecastResult) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(result, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ForecastError::DataError(format!("Forecast CSV is not valid UTF-8: {}", e)))
}
