use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::Measure;

/// One hourly row of a PRSA station file.
///
/// Measurement cells written as `NA` (or left empty) are read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ObservationRecord {
    #[serde(rename = "No", default)]
    pub row_number: Option<u64>,

    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: u32,

    #[validate(range(min = 1, max = 31))]
    pub day: u32,

    #[validate(range(min = 0, max = 23))]
    pub hour: u32,

    #[serde(rename = "PM2.5", deserialize_with = "missing_or_number")]
    pub pm25: Option<f64>,

    #[serde(rename = "PM10", deserialize_with = "missing_or_number")]
    pub pm10: Option<f64>,

    #[serde(rename = "SO2", deserialize_with = "missing_or_number")]
    pub so2: Option<f64>,

    #[serde(rename = "NO2", deserialize_with = "missing_or_number")]
    pub no2: Option<f64>,

    #[serde(rename = "CO", deserialize_with = "missing_or_number")]
    pub co: Option<f64>,

    #[serde(rename = "O3", deserialize_with = "missing_or_number")]
    pub o3: Option<f64>,

    #[serde(rename = "TEMP", deserialize_with = "missing_or_number")]
    pub temp: Option<f64>,

    #[serde(rename = "PRES", deserialize_with = "missing_or_number")]
    pub pres: Option<f64>,

    #[serde(rename = "DEWP", deserialize_with = "missing_or_number")]
    pub dewp: Option<f64>,

    #[serde(rename = "RAIN", deserialize_with = "missing_or_number")]
    pub rain: Option<f64>,

    /// Wind direction (N, NNE, ...)
    #[serde(rename = "wd", default)]
    pub wind_direction: Option<String>,

    #[serde(rename = "WSPM", deserialize_with = "missing_or_number")]
    pub wspm: Option<f64>,

    #[serde(default)]
    pub station: Option<String>,
}

/// `NA` and empty cells are missing; anything else must parse as a number.
fn missing_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = String::deserialize(deserializer)?;
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("NA") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| D::Error::custom(format!("invalid numeric value '{}'", cell)))
}

impl ObservationRecord {
    /// Combine the four calendar fields into the observation timestamp.
    pub fn datetime(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, 0, 0))
            .ok_or_else(|| {
                PipelineError::InvalidFormat(format!(
                    "Invalid calendar fields: year={}, month={}, day={}, hour={}",
                    self.year, self.month, self.day, self.hour
                ))
            })
    }

    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Pm25 => self.pm25,
            Measure::Pm10 => self.pm10,
            Measure::So2 => self.so2,
            Measure::No2 => self.no2,
            Measure::Co => self.co,
            Measure::O3 => self.o3,
            Measure::Temp => self.temp,
            Measure::Pres => self.pres,
            Measure::Dewp => self.dewp,
            Measure::Rain => self.rain,
            Measure::Wspm => self.wspm,
        }
    }

    pub fn has_complete_pollutants(&self) -> bool {
        Measure::POLLUTANTS
            .iter()
            .all(|m| self.measure(*m).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(month: u32, day: u32, hour: u32) -> ObservationRecord {
        ObservationRecord {
            row_number: Some(1),
            year: 2013,
            month,
            day,
            hour,
            pm25: Some(8.0),
            pm10: Some(8.0),
            so2: None,
            no2: Some(28.0),
            co: Some(400.0),
            o3: Some(52.0),
            temp: Some(-0.7),
            pres: Some(1023.0),
            dewp: Some(-18.8),
            rain: Some(0.0),
            wind_direction: Some("NNW".to_string()),
            wspm: Some(4.4),
            station: Some("Wanliu".to_string()),
        }
    }

    #[test]
    fn test_datetime_from_calendar_fields() {
        let rec = record(3, 1, 5);
        let dt = rec.datetime().unwrap();
        assert_eq!(dt.to_string(), "2013-03-01 05:00:00");
    }

    #[test]
    fn test_invalid_calendar_date() {
        // February 30th passes the per-field ranges but is not a real date
        let rec = record(2, 30, 0);
        assert!(rec.validate().is_ok());
        assert!(rec.datetime().is_err());
    }

    #[test]
    fn test_hour_out_of_range() {
        let rec = record(3, 1, 24);
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_measure_lookup() {
        let rec = record(3, 1, 0);
        assert_eq!(rec.measure(Measure::Pm25), Some(8.0));
        assert_eq!(rec.measure(Measure::So2), None);
        assert!(!rec.has_complete_pollutants());
    }
}
