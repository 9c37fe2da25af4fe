use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PipelineError;

/// Numeric measurement columns of a PRSA station file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "TEMP")]
    Temp,
    #[serde(rename = "PRES")]
    Pres,
    #[serde(rename = "DEWP")]
    Dewp,
    #[serde(rename = "RAIN")]
    Rain,
    #[serde(rename = "WSPM")]
    Wspm,
}

impl Measure {
    pub const ALL: [Measure; 11] = [
        Measure::Pm25,
        Measure::Pm10,
        Measure::So2,
        Measure::No2,
        Measure::Co,
        Measure::O3,
        Measure::Temp,
        Measure::Pres,
        Measure::Dewp,
        Measure::Rain,
        Measure::Wspm,
    ];

    pub const POLLUTANTS: [Measure; 6] = [
        Measure::Pm25,
        Measure::Pm10,
        Measure::So2,
        Measure::No2,
        Measure::Co,
        Measure::O3,
    ];

    pub const WEATHER: [Measure; 5] = [
        Measure::Temp,
        Measure::Pres,
        Measure::Dewp,
        Measure::Rain,
        Measure::Wspm,
    ];

    /// Column header as written in the source CSV
    pub fn column_name(&self) -> &'static str {
        match self {
            Measure::Pm25 => "PM2.5",
            Measure::Pm10 => "PM10",
            Measure::So2 => "SO2",
            Measure::No2 => "NO2",
            Measure::Co => "CO",
            Measure::O3 => "O3",
            Measure::Temp => "TEMP",
            Measure::Pres => "PRES",
            Measure::Dewp => "DEWP",
            Measure::Rain => "RAIN",
            Measure::Wspm => "WSPM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Measure::Pm25 => "Fine particulate matter",
            Measure::Pm10 => "Coarse particulate matter",
            Measure::So2 => "Sulphur dioxide",
            Measure::No2 => "Nitrogen dioxide",
            Measure::Co => "Carbon monoxide",
            Measure::O3 => "Ozone",
            Measure::Temp => "Temperature",
            Measure::Pres => "Pressure",
            Measure::Dewp => "Dew point",
            Measure::Rain => "Precipitation",
            Measure::Wspm => "Wind speed",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Measure::Pm25
            | Measure::Pm10
            | Measure::So2
            | Measure::No2
            | Measure::Co
            | Measure::O3 => "ug/m3",
            Measure::Temp | Measure::Dewp => "°C",
            Measure::Pres => "hPa",
            Measure::Rain => "mm",
            Measure::Wspm => "m/s",
        }
    }

    pub fn is_pollutant(&self) -> bool {
        Self::POLLUTANTS.contains(self)
    }

    /// Covariates offered for a scatter plot against PM2.5
    pub fn scatter_covariates() -> impl Iterator<Item = Measure> {
        Self::ALL.into_iter().filter(|m| *m != Measure::Pm25)
    }
}

impl FromStr for Measure {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Measure::ALL
            .into_iter()
            .find(|m| m.column_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PipelineError::UnknownColumn(wanted.to_string()))
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}
