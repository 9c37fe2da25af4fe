use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::models::{BucketScheme, Measure, RainIntensity, Table};
use crate::processors::{
    bucketize, filter_by_category, filter_by_date, filter_by_range, select_columns, DateRange,
};
use crate::utils::constants::{PM25_COLUMN, RAIN_INTENSITY_COLUMN};

/// User-supplied filter criteria for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_bounds"))]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,

    /// Measure columns to keep; empty keeps every column
    pub columns: Vec<String>,

    /// Inclusive PM2.5 interval
    pub pm25_range: Option<(f64, f64)>,

    /// Accepted rain intensities; empty accepts every row
    pub rain: Vec<RainIntensity>,
}

fn validate_bounds(criteria: &FilterCriteria) -> std::result::Result<(), ValidationError> {
    if let Some(range) = &criteria.date_range {
        if !range.is_ordered() {
            return Err(ValidationError::new("date_range_inverted"));
        }
    }
    if let Some((lo, hi)) = criteria.pm25_range {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(ValidationError::new("pm25_range_inverted"));
        }
    }
    Ok(())
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pm25_range(mut self, lo: f64, hi: f64) -> Self {
        self.pm25_range = Some((lo, hi));
        self
    }

    pub fn with_rain(mut self, rain: impl IntoIterator<Item = RainIntensity>) -> Self {
        self.rain = rain.into_iter().collect();
        self
    }

    /// Apply date, PM2.5 and rain filters, then the column subset.
    ///
    /// A rain selection leaves the `RAIN_Intensity` column on the result.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        self.validate()?;

        let mut current = match &self.date_range {
            Some(range) => filter_by_date(table, range)?,
            None => table.clone(),
        };

        if let Some((lo, hi)) = self.pm25_range {
            current = filter_by_range(&current, PM25_COLUMN, lo, hi)?;
        }

        if !self.rain.is_empty() {
            let labels: Vec<&str> = self.rain.iter().map(|r| r.label()).collect();
            let bucketed = bucketize(&current, Measure::Rain.column_name(), &BucketScheme::rain())?;
            current = filter_by_category(&bucketed, RAIN_INTENSITY_COLUMN, &labels)?;
        }

        if !self.columns.is_empty() {
            let mut names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
            if !self.rain.is_empty() {
                names.push(RAIN_INTENSITY_COLUMN);
            }
            current = select_columns(&current, &names)?;
        }

        debug!(rows = current.row_count(), "applied filter criteria");
        Ok(current)
    }
}

/// The active row filters, e.g. `PM2.5 in [10, 150]; rain: No Rain`.
///
/// Column selection does not drop rows and is left out.
impl std::fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(range) = &self.date_range {
            parts.push(range.to_string());
        }
        if let Some((lo, hi)) = self.pm25_range {
            parts.push(format!("{} in [{}, {}]", PM25_COLUMN, lo, hi));
        }
        if !self.rain.is_empty() {
            let labels: Vec<&str> = self.rain.iter().map(|r| r.label()).collect();
            parts.push(format!("rain: {}", labels.join(", ")));
        }

        if parts.is_empty() {
            write!(f, "no filters")
        } else {
            write!(f, "{}", parts.join("; "))
        }
    }
}
