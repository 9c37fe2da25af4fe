use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::utils::constants::{
    PM25_BREAKPOINTS, PM25_CATEGORY_COLUMN, RAIN_BREAKPOINTS, RAIN_INTENSITY_COLUMN,
};

/// Which side of each interval is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Closed {
    /// `(a, b]`
    Right,
    /// `[a, b)`
    Left,
}

/// Breakpoints plus ordered labels for turning a continuous value into a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketScheme {
    output_column: String,
    breakpoints: Vec<f64>,
    labels: Vec<String>,
    closed: Closed,
    /// Label the open outer edge too: the lowest breakpoint for
    /// `Closed::Right`, the highest for `Closed::Left`
    include_outer_edge: bool,
}

impl BucketScheme {
    pub fn new(
        output_column: impl Into<String>,
        breakpoints: Vec<f64>,
        labels: Vec<String>,
        closed: Closed,
    ) -> Result<Self> {
        if breakpoints.len() < 2 {
            return Err(PipelineError::InvalidCriteria(
                "A bucket scheme needs at least two breakpoints".to_string(),
            ));
        }
        if breakpoints.iter().any(|b| !b.is_finite()) {
            return Err(PipelineError::InvalidCriteria(
                "Breakpoints must be finite".to_string(),
            ));
        }
        if breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::InvalidCriteria(format!(
                "Breakpoints must be strictly increasing: {:?}",
                breakpoints
            )));
        }
        if labels.len() != breakpoints.len() - 1 {
            return Err(PipelineError::InvalidCriteria(format!(
                "{} breakpoints need {} labels, got {}",
                breakpoints.len(),
                breakpoints.len() - 1,
                labels.len()
            )));
        }

        Ok(Self {
            output_column: output_column.into(),
            breakpoints,
            labels,
            closed,
            include_outer_edge: false,
        })
    }

    pub fn with_outer_edge(mut self, include: bool) -> Self {
        self.include_outer_edge = include;
        self
    }

    /// PM2.5 severity buckets. `0` sits on the open lowest edge and is unlabelled.
    pub fn pm25() -> Self {
        Self {
            output_column: PM25_CATEGORY_COLUMN.to_string(),
            breakpoints: PM25_BREAKPOINTS.to_vec(),
            labels: Pm25Category::ALL
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            closed: Closed::Right,
            include_outer_edge: false,
        }
    }

    /// Rain intensity buckets. `0` is labelled "No Rain".
    pub fn rain() -> Self {
        Self {
            output_column: RAIN_INTENSITY_COLUMN.to_string(),
            breakpoints: RAIN_BREAKPOINTS.to_vec(),
            labels: RainIntensity::ALL
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            closed: Closed::Right,
            include_outer_edge: true,
        }
    }

    pub fn output_column(&self) -> &str {
        &self.output_column
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn closed(&self) -> Closed {
        self.closed
    }

    pub fn includes_outer_edge(&self) -> bool {
        self.include_outer_edge
    }

    /// Index of the bucket holding `value`, or `None` when it lies outside
    /// the breakpoint range.
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        let first = self.breakpoints[0];
        let last = self.breakpoints[self.breakpoints.len() - 1];
        if value.is_nan() || value < first || value > last {
            return None;
        }
        if !self.include_outer_edge {
            let open_edge = match self.closed {
                Closed::Right => first,
                Closed::Left => last,
            };
            if value == open_edge {
                return None;
            }
        }

        let index = match self.closed {
            // count of edges strictly below the value
            Closed::Right => self.breakpoints.partition_point(|b| *b < value),
            // count of edges at or below the value
            Closed::Left => self.breakpoints.partition_point(|b| *b <= value),
        };

        // index is the position of the upper edge; an included outer edge
        // folds into the outermost bucket
        let bucket = match self.closed {
            Closed::Right => index.max(1) - 1,
            Closed::Left => index.min(self.labels.len()) - 1,
        };
        Some(bucket)
    }

    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.bucket_index(value).map(|i| self.labels[i].as_str())
    }
}

/// PM2.5 severity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pm25Category {
    Baik,
    Sedang,
    TidakSehat,
    SangatTidakSehat,
    Berbahaya,
    BerbahayaEkstrem,
}

impl Pm25Category {
    pub const ALL: [Pm25Category; 6] = [
        Pm25Category::Baik,
        Pm25Category::Sedang,
        Pm25Category::TidakSehat,
        Pm25Category::SangatTidakSehat,
        Pm25Category::Berbahaya,
        Pm25Category::BerbahayaEkstrem,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Pm25Category::Baik => "Baik",
            Pm25Category::Sedang => "Sedang",
            Pm25Category::TidakSehat => "Tidak Sehat",
            Pm25Category::SangatTidakSehat => "Sangat Tidak Sehat",
            Pm25Category::Berbahaya => "Berbahaya",
            Pm25Category::BerbahayaEkstrem => "Berbahaya Ekstrem",
        }
    }

    /// English reading of the label
    pub fn description(&self) -> &'static str {
        match self {
            Pm25Category::Baik => "Good",
            Pm25Category::Sedang => "Moderate",
            Pm25Category::TidakSehat => "Unhealthy",
            Pm25Category::SangatTidakSehat => "Very unhealthy",
            Pm25Category::Berbahaya => "Hazardous",
            Pm25Category::BerbahayaEkstrem => "Extremely hazardous",
        }
    }

    pub fn classify(pm25: f64) -> Option<Self> {
        BucketScheme::pm25()
            .bucket_index(pm25)
            .map(|i| Self::ALL[i])
    }
}

/// Hourly rain intensity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RainIntensity {
    NoRain,
    Light,
    Moderate,
    Heavy,
}

impl RainIntensity {
    pub const ALL: [RainIntensity; 4] = [
        RainIntensity::NoRain,
        RainIntensity::Light,
        RainIntensity::Moderate,
        RainIntensity::Heavy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RainIntensity::NoRain => "No Rain",
            RainIntensity::Light => "Light Rain",
            RainIntensity::Moderate => "Moderate Rain",
            RainIntensity::Heavy => "Heavy Rain",
        }
    }

    pub fn classify(rain: f64) -> Option<Self> {
        BucketScheme::rain()
            .bucket_index(rain)
            .map(|i| Self::ALL[i])
    }
}

impl FromStr for RainIntensity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        RainIntensity::ALL
            .into_iter()
            .find(|r| {
                let label = r.label().to_lowercase();
                label == wanted || label.trim_end_matches(" rain") == wanted
            })
            .ok_or_else(|| {
                PipelineError::InvalidCriteria(format!("Unknown rain intensity: '{}'", s))
            })
    }
}

impl std::fmt::Display for Pm25Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::fmt::Display for RainIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm25_boundaries_right_closed() {
        assert_eq!(Pm25Category::classify(0.0), None);
        assert_eq!(Pm25Category::classify(0.1), Some(Pm25Category::Baik));
        assert_eq!(Pm25Category::classify(35.0), Some(Pm25Category::Baik));
        assert_eq!(Pm25Category::classify(35.5), Some(Pm25Category::Sedang));
        assert_eq!(Pm25Category::classify(150.0), Some(Pm25Category::SangatTidakSehat));
        assert_eq!(Pm25Category::classify(500.0), Some(Pm25Category::BerbahayaEkstrem));
        assert_eq!(Pm25Category::classify(500.1), None);
        assert_eq!(Pm25Category::classify(-1.0), None);
        assert_eq!(Pm25Category::classify(f64::NAN), None);
    }

    #[test]
    fn test_rain_buckets() {
        assert_eq!(RainIntensity::classify(0.0), Some(RainIntensity::NoRain));
        assert_eq!(RainIntensity::classify(0.3), Some(RainIntensity::NoRain));
        assert_eq!(RainIntensity::classify(2.0), Some(RainIntensity::Light));
        assert_eq!(RainIntensity::classify(9.9), Some(RainIntensity::Heavy));
        assert_eq!(RainIntensity::classify(12.0), None);
    }

    #[test]
    fn test_left_closed_scheme() {
        let scheme = BucketScheme::new(
            "band",
            vec![0.0, 10.0, 20.0],
            vec!["low".to_string(), "high".to_string()],
            Closed::Left,
        )
        .unwrap();

        assert_eq!(scheme.label_for(0.0), Some("low"));
        assert_eq!(scheme.label_for(10.0), Some("high"));
        assert_eq!(scheme.label_for(19.9), Some("high"));
        assert_eq!(scheme.label_for(20.0), None);
        assert_eq!(scheme.label_for(20.5), None);

        let scheme = scheme.with_outer_edge(true);
        assert_eq!(scheme.label_for(20.0), Some("high"));
        assert_eq!(scheme.label_for(20.5), None);
    }

    #[test]
    fn test_outer_edge_per_scheme() {
        assert!(!BucketScheme::pm25().includes_outer_edge());
        assert!(BucketScheme::rain().includes_outer_edge());
        assert_eq!(BucketScheme::pm25().label_for(0.0), None);
        assert_eq!(BucketScheme::rain().label_for(0.0), Some("No Rain"));
        // the closed upper edge is labelled either way
        assert_eq!(BucketScheme::pm25().label_for(500.0), Some("Berbahaya Ekstrem"));
    }

    #[test]
    fn test_invalid_schemes() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert!(BucketScheme::new("x", vec![0.0, 5.0, 5.0], labels.clone(), Closed::Right).is_err());
        assert!(BucketScheme::new("x", vec![0.0, 5.0], labels, Closed::Right).is_err());
        assert!(BucketScheme::new("x", vec![0.0], vec![], Closed::Right).is_err());
    }

    #[test]
    fn test_rain_intensity_from_str() {
        assert_eq!("light".parse::<RainIntensity>().unwrap(), RainIntensity::Light);
        assert_eq!("No Rain".parse::<RainIntensity>().unwrap(), RainIntensity::NoRain);
        assert_eq!("no-rain".parse::<RainIntensity>().unwrap(), RainIntensity::NoRain);
        assert!("drizzle".parse::<RainIntensity>().is_err());
    }
}
