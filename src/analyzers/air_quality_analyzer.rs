use crate::analyzers::distribution::value_counts;
use crate::error::{PipelineError, Result};
use crate::models::{BucketScheme, Measure, Pm25Category, Table};
use crate::processors::bucketize;
use crate::utils::constants::{PM25_COLUMN, STATION_COLUMN};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
pub struct AirQualityStatistics {
    pub total_records: usize,
    pub stations: Vec<String>,
    pub date_range: (NaiveDateTime, NaiveDateTime),
    pub measures: Vec<MeasureStats>,
    pub completeness: DataCompleteness,
    pub category_counts: Vec<(Pm25Category, usize)>,
}

#[derive(Debug, Serialize)]
pub struct MeasureStats {
    pub measure: Measure,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub max_at: Option<NaiveDateTime>,
    pub missing: usize,
}

#[derive(Debug, Serialize)]
pub struct DataCompleteness {
    pub total_records: usize,
    pub complete_records: usize,
    pub missing_pm25: usize,
}

impl DataCompleteness {
    pub fn complete_percentage(&self) -> f64 {
        (self.complete_records as f64 / self.total_records as f64) * 100.0
    }

    pub fn missing_pm25_percentage(&self) -> f64 {
        (self.missing_pm25 as f64 / self.total_records as f64) * 100.0
    }
}

/// Whole-dataset overview: coverage, per-measure extremes and PM2.5 severity mix.
pub struct AirQualityAnalyzer;

impl AirQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, table: &Table) -> Result<AirQualityStatistics> {
        let date_range = table.datetime_bounds()?.ok_or_else(|| {
            PipelineError::InvalidCriteria("No records to analyze".to_string())
        })?;
        let datetimes = table.datetimes()?;

        let stations: Vec<String> = if table.has_column(STATION_COLUMN) {
            table
                .categorical(STATION_COLUMN)?
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        let mut measures = Vec::new();
        let mut complete = vec![true; table.row_count()];
        for measure in Measure::ALL {
            if !table.has_column(measure.column_name()) {
                continue;
            }
            let cells = table.numeric(measure.column_name())?;

            let mut sum = 0.0f64;
            let mut count = 0usize;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut max_at = None;

            for (row, cell) in cells.iter().enumerate() {
                match cell {
                    Some(v) => {
                        sum += v;
                        count += 1;
                        if *v < min {
                            min = *v;
                        }
                        if *v > max {
                            max = *v;
                            max_at = Some(datetimes[row]);
                        }
                    }
                    None => complete[row] = false,
                }
            }

            // no present values in this column
            if count == 0 {
                min = f64::NAN;
                max = f64::NAN;
            }

            measures.push(MeasureStats {
                measure,
                mean: if count > 0 { sum / count as f64 } else { f64::NAN },
                min,
                max,
                max_at,
                missing: cells.len() - count,
            });
        }

        let missing_pm25 = measures
            .iter()
            .find(|m| m.measure == Measure::Pm25)
            .map(|m| m.missing)
            .unwrap_or(table.row_count());

        let category_counts = if table.has_column(PM25_COLUMN) {
            let scheme = BucketScheme::pm25();
            let bucketed = bucketize(table, PM25_COLUMN, &scheme)?;
            let counts = value_counts(&bucketed, scheme.output_column(), scheme.labels())?;
            Pm25Category::ALL
                .into_iter()
                .zip(counts.numeric("count")?)
                .map(|(category, n)| (category, n.unwrap_or(0.0) as usize))
                .collect()
        } else {
            Vec::new()
        };

        Ok(AirQualityStatistics {
            total_records: table.row_count(),
            stations,
            date_range,
            measures,
            completeness: DataCompleteness {
                total_records: table.row_count(),
                complete_records: complete.iter().filter(|c| **c).count(),
                missing_pm25,
            },
            category_counts,
        })
    }
}

impl AirQualityStatistics {
    pub fn summary(&self) -> String {
        let stations = if self.stations.is_empty() {
            "unnamed".to_string()
        } else {
            self.stations.join(", ")
        };

        format!(
            "Station(s): {}\n\
            Date Range: {} to {} ({} days)\n\
            Records: {} total\n\
            Data Completeness: {:.1}% complete rows, {:.1}% missing PM2.5",
            stations,
            self.date_range.0,
            self.date_range.1,
            self.date_range
                .1
                .signed_duration_since(self.date_range.0)
                .num_days(),
            self.total_records,
            self.completeness.complete_percentage(),
            self.completeness.missing_pm25_percentage(),
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut out = self.summary();

        out.push_str("\n\nMeasures (mean / min / max):\n");
        for m in &self.measures {
            if m.mean.is_nan() {
                out.push_str(&format!("- {}: No valid measurements\n", m.measure));
                continue;
            }
            let peak = m
                .max_at
                .map(|at| format!(" at {}", at.format("%Y-%m-%d %H:%M")))
                .unwrap_or_default();
            out.push_str(&format!(
                "- {}: {:.1} / {:.1} / {:.1} {}{} ({} missing)\n",
                m.measure,
                m.mean,
                m.min,
                m.max,
                m.measure.units(),
                peak,
                m.missing
            ));
        }

        if !self.category_counts.is_empty() {
            out.push_str("\nPM2.5 Categories:\n");
            for (category, n) in &self.category_counts {
                out.push_str(&format!(
                    "- {} ({}): {}\n",
                    category.label(),
                    category.description(),
                    n
                ));
            }
        }

        out
    }
}

impl Default for AirQualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use crate::utils::constants::DATETIME_COLUMN;
    use chrono::NaiveDate;

    fn sample() -> Table {
        let ts = |h: u32| {
            NaiveDate::from_ymd_opt(2016, 12, 20)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        Table::from_columns(vec![
            Column::datetime(DATETIME_COLUMN, vec![ts(0), ts(1), ts(2), ts(3)]),
            Column::numeric("PM2.5", vec![Some(20.0), Some(310.0), None, Some(90.0)]),
            Column::numeric("SO2", vec![Some(5.0), Some(7.0), Some(6.0), Some(2.0)]),
            Column::categorical("station", vec![Some("Wanliu".into()); 4]),
        ])
        .unwrap()
    }

    #[test]
    fn test_analyze_measures() -> Result<()> {
        let stats = AirQualityAnalyzer::new().analyze(&sample())?;

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.stations, vec!["Wanliu"]);
        assert_eq!(stats.measures.len(), 2);

        let pm25 = &stats.measures[0];
        assert_eq!(pm25.measure, Measure::Pm25);
        assert_eq!(pm25.max, 310.0);
        assert_eq!(pm25.min, 20.0);
        assert_eq!(pm25.missing, 1);
        assert_eq!(pm25.max_at.unwrap().to_string(), "2016-12-20 01:00:00");

        assert_eq!(stats.completeness.complete_records, 3);
        assert_eq!(stats.completeness.missing_pm25, 1);
        Ok(())
    }

    #[test]
    fn test_category_counts() -> Result<()> {
        let stats = AirQualityAnalyzer::new().analyze(&sample())?;
        let counts: Vec<usize> = stats.category_counts.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 1]);
        Ok(())
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let empty = sample().filter_rows(&[false; 4]);
        assert!(AirQualityAnalyzer::new().analyze(&empty).is_err());
    }

    #[test]
    fn test_detailed_summary_mentions_categories() -> Result<()> {
        let stats = AirQualityAnalyzer::new().analyze(&sample())?;
        let text = stats.detailed_summary();
        assert!(text.contains("Station(s): Wanliu"));
        assert!(text.contains("Berbahaya Ekstrem (Extremely hazardous): 1"));
        Ok(())
    }
}
