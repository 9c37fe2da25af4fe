use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::{aggregate_mean, correlation_matrix, describe, histogram, scatter, value_counts};
use crate::error::{PipelineError, Result};
use crate::models::{BucketScheme, Matrix, Measure, Table};
use crate::processors::{bucketize, filter_by_date, DateRange, FilterCriteria};
use crate::store::DataStore;
use crate::utils::constants::{PM25_COLUMN, YEAR_COLUMN};

/// One user action against the loaded dataset.
///
/// A `range` of `None` covers the whole dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Yearly PM2.5 mean and the PM2.5 category distribution
    Overview { range: Option<DateRange> },
    /// Descriptive statistics; empty `columns` describes every measure
    Describe {
        range: Option<DateRange>,
        columns: Vec<String>,
    },
    /// Correlation heatmap; empty `columns` correlates every measure
    Correlation {
        range: Option<DateRange>,
        columns: Vec<String>,
    },
    /// PM2.5 against one covariate
    Scatter {
        range: Option<DateRange>,
        covariate: Measure,
    },
    Histogram {
        range: Option<DateRange>,
        column: String,
        bins: usize,
    },
    /// Row counts per PM2.5 category and per rain intensity
    Categories { range: Option<DateRange> },
    /// Filtered rows
    Explore { criteria: FilterCriteria },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Overview { .. } => "overview",
            Request::Describe { .. } => "describe",
            Request::Correlation { .. } => "correlation",
            Request::Scatter { .. } => "scatter",
            Request::Histogram { .. } => "histogram",
            Request::Categories { .. } => "categories",
            Request::Explore { .. } => "explore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PanelContent {
    Table(Table),
    Matrix(Matrix),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub content: PanelContent,
}

impl Panel {
    pub fn table(title: impl Into<String>, table: Table) -> Self {
        Self {
            title: title.into(),
            content: PanelContent::Table(table),
        }
    }

    pub fn matrix(title: impl Into<String>, matrix: Matrix) -> Self {
        Self {
            title: title.into(),
            content: PanelContent::Matrix(matrix),
        }
    }
}

/// Non-fatal conditions reported next to the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The filters selected no rows
    EmptyResult { filter: String },
    /// Correlation needs at least two columns
    InsufficientSelection { selected: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::EmptyResult { filter } => {
                write!(f, "No data matches the selected filters ({})", filter)
            }
            Warning::InsufficientSelection { selected } => write!(
                f,
                "Select at least two columns to see correlations ({} selected)",
                selected
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub panels: Vec<Panel>,
    pub warnings: Vec<Warning>,
}

impl Response {
    fn push_warning(&mut self, warning: Warning) {
        warn!(%warning, "request produced a warning");
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn panel(&self, title: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.title == title)
    }
}

/// Answers requests from a shared, already loaded store.
pub struct Dashboard<'a> {
    store: &'a DataStore,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    pub fn handle(&self, request: Request) -> Result<Response> {
        info!(request = request.name(), "handling request");
        let mut response = Response::default();

        match request {
            Request::Overview { range } => {
                let filtered = self.filtered(range, &mut response)?;
                let yearly = aggregate_mean(&filtered, YEAR_COLUMN, PM25_COLUMN)?;

                let scheme = BucketScheme::pm25();
                let bucketed = bucketize(&filtered, PM25_COLUMN, &scheme)?;
                let counts = value_counts(&bucketed, scheme.output_column(), scheme.labels())?;

                response.panels.push(Panel::table("Yearly PM2.5 mean", yearly));
                response.panels.push(Panel::table("PM2.5 category distribution", counts));
            }
            Request::Describe { range, columns } => {
                let filtered = self.filtered(range, &mut response)?;
                let columns = self.measure_columns(&columns);
                let subset = filtered.select(&columns)?;
                response
                    .panels
                    .push(Panel::table("Descriptive statistics", describe(&subset)?));
            }
            Request::Correlation { range, columns } => {
                let filtered = self.filtered(range, &mut response)?;
                let columns = self.measure_columns(&columns);
                match correlation_matrix(&filtered, &columns) {
                    Ok(matrix) => response.panels.push(Panel::matrix("Correlation", matrix)),
                    Err(PipelineError::InsufficientSelection { selected }) => {
                        response.push_warning(Warning::InsufficientSelection { selected })
                    }
                    Err(e) => return Err(e),
                }
            }
            Request::Scatter { range, covariate } => {
                if covariate == Measure::Pm25 {
                    return Err(PipelineError::InvalidCriteria(
                        "PM2.5 cannot be plotted against itself".to_string(),
                    ));
                }
                let filtered = self.filtered(range, &mut response)?;
                let points = scatter(&filtered, covariate.column_name(), PM25_COLUMN)?;
                response.panels.push(Panel::table(
                    format!("PM2.5 vs {}", covariate.column_name()),
                    points,
                ));
            }
            Request::Histogram {
                range,
                column,
                bins,
            } => {
                let filtered = self.filtered(range, &mut response)?;
                let hist = histogram(&filtered, &column, bins)?;
                response
                    .panels
                    .push(Panel::table(format!("{} distribution", column), hist));
            }
            Request::Categories { range } => {
                let filtered = self.filtered(range, &mut response)?;
                for (column, scheme, title) in [
                    (PM25_COLUMN, BucketScheme::pm25(), "PM2.5 categories"),
                    (
                        Measure::Rain.column_name(),
                        BucketScheme::rain(),
                        "Rain intensity",
                    ),
                ] {
                    let bucketed = bucketize(&filtered, column, &scheme)?;
                    let counts =
                        value_counts(&bucketed, scheme.output_column(), scheme.labels())?;
                    response.panels.push(Panel::table(title, counts));
                }
            }
            Request::Explore { criteria } => {
                let rows = criteria.apply(self.store.table())?;
                if rows.is_empty() {
                    response.push_warning(Warning::EmptyResult {
                        filter: criteria.to_string(),
                    });
                }
                response.panels.push(Panel::table("Observations", rows));
            }
        }

        Ok(response)
    }

    /// The store restricted to `range`, or to its own bounds when `None`.
    fn filtered(&self, range: Option<DateRange>, response: &mut Response) -> Result<Table> {
        let range = match range {
            Some(range) => Some(range),
            None => self
                .store
                .date_bounds()?
                .map(|(start, end)| DateRange::new(start, end))
                .transpose()?,
        };

        let filtered = match &range {
            Some(range) => filter_by_date(self.store.table(), range)?,
            None => self.store.table().clone(),
        };

        if filtered.is_empty() {
            let filter = range
                .map(|r| r.to_string())
                .unwrap_or_else(|| "empty dataset".to_string());
            response.push_warning(Warning::EmptyResult { filter });
        }
        Ok(filtered)
    }

    /// The requested columns, or every measure present in the store.
    fn measure_columns<'c>(&self, requested: &'c [String]) -> Vec<&'c str> {
        if !requested.is_empty() {
            return requested.iter().map(String::as_str).collect();
        }
        Measure::ALL
            .into_iter()
            .map(|m| m.column_name())
            .filter(|name| self.store.table().has_column(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, RainIntensity};
    use crate::utils::constants::DATETIME_COLUMN;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    /// Two observations per year, 2013 through 2017
    fn store() -> DataStore {
        let mut datetimes = Vec::new();
        let mut years = Vec::new();
        let mut pm25 = Vec::new();
        let mut temp = Vec::new();
        let mut rain = Vec::new();
        for (i, year) in (2013..=2017).enumerate() {
            for (j, month) in [3u32, 9].into_iter().enumerate() {
                datetimes.push(
                    NaiveDate::from_ymd_opt(year, month, 1)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                );
                years.push(Some(year as f64));
                pm25.push(Some(20.0 + 40.0 * i as f64 + 10.0 * j as f64));
                temp.push(Some(30.0 - 2.0 * i as f64 - j as f64));
                rain.push(Some(j as f64 * 2.0));
            }
        }

        DataStore::from_table(
            Table::from_columns(vec![
                Column::datetime(DATETIME_COLUMN, datetimes),
                Column::numeric("year", years),
                Column::numeric("PM2.5", pm25),
                Column::numeric("TEMP", temp),
                Column::numeric("RAIN", rain),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_overview_yearly_means() -> Result<()> {
        let store = store();
        let response = Dashboard::new(&store).handle(Request::Overview { range: None })?;

        assert!(!response.has_warnings());
        let yearly = match &response.panel("Yearly PM2.5 mean").unwrap().content {
            PanelContent::Table(t) => t.clone(),
            other => panic!("unexpected panel {:?}", other),
        };
        assert_eq!(yearly.row_count(), 5);
        assert_eq!(
            yearly.numeric("year")?,
            &[Some(2013.0), Some(2014.0), Some(2015.0), Some(2016.0), Some(2017.0)]
        );
        assert_eq!(yearly.numeric("PM2.5")?[0], Some(25.0));

        let counts = match &response.panel("PM2.5 category distribution").unwrap().content {
            PanelContent::Table(t) => t.clone(),
            other => panic!("unexpected panel {:?}", other),
        };
        assert_eq!(counts.row_count(), 6);
        Ok(())
    }

    #[test]
    fn test_out_of_range_dates_warn_and_continue() -> Result<()> {
        let store = store();
        let range = DateRange::parse("2020-01-01", "2020-01-02")?;
        let response = Dashboard::new(&store).handle(Request::Overview { range: Some(range) })?;

        assert!(matches!(
            response.warnings.as_slice(),
            [Warning::EmptyResult { .. }]
        ));
        match &response.panels[0].content {
            PanelContent::Table(t) => assert!(t.is_empty()),
            other => panic!("unexpected panel {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_single_column_correlation_warns() -> Result<()> {
        let store = store();
        let response = Dashboard::new(&store).handle(Request::Correlation {
            range: None,
            columns: vec!["PM2.5".to_string()],
        })?;

        assert!(response.panels.is_empty());
        assert_eq!(
            response.warnings,
            vec![Warning::InsufficientSelection { selected: 1 }]
        );
        Ok(())
    }

    #[test]
    fn test_correlation_defaults_to_all_measures() -> Result<()> {
        let store = store();
        let response = Dashboard::new(&store).handle(Request::Correlation {
            range: None,
            columns: vec![],
        })?;

        match &response.panels[0].content {
            PanelContent::Matrix(m) => {
                assert_eq!(m.labels(), &["PM2.5", "TEMP", "RAIN"]);
                assert!(m.get_by_name("PM2.5", "TEMP").unwrap() < 0.0);
            }
            other => panic!("unexpected panel {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_scatter_and_histogram() -> Result<()> {
        let store = store();
        let dashboard = Dashboard::new(&store);

        let response = dashboard.handle(Request::Scatter {
            range: None,
            covariate: Measure::Temp,
        })?;
        assert_eq!(response.panels[0].title, "PM2.5 vs TEMP");

        let response = dashboard.handle(Request::Histogram {
            range: None,
            column: "PM2.5".to_string(),
            bins: 4,
        })?;
        match &response.panels[0].content {
            PanelContent::Table(t) => {
                let total: f64 = t.numeric("count")?.iter().flatten().sum();
                assert_eq!(total, 10.0);
            }
            other => panic!("unexpected panel {:?}", other),
        }

        assert!(dashboard
            .handle(Request::Scatter {
                range: None,
                covariate: Measure::Pm25,
            })
            .is_err());
        Ok(())
    }

    #[test]
    fn test_categories_cover_every_bucket() -> Result<()> {
        let store = store();
        let response = Dashboard::new(&store).handle(Request::Categories { range: None })?;

        assert_eq!(response.panels.len(), 2);
        match &response.panels[1].content {
            PanelContent::Table(t) => {
                assert_eq!(t.row_count(), 4);
                // rain is 0.0 (no rain) or 2.0 (light) in alternating months
                assert_eq!(
                    t.numeric("count")?,
                    &[Some(5.0), Some(5.0), Some(0.0), Some(0.0)]
                );
            }
            other => panic!("unexpected panel {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_explore_with_criteria() -> Result<()> {
        let store = store();
        let criteria = FilterCriteria::new()
            .with_date_range(DateRange::parse("2015-01-01", "2017-12-31")?)
            .with_pm25_range(100.0, 500.0);
        let response = Dashboard::new(&store).handle(Request::Explore { criteria })?;

        match &response.panels[0].content {
            PanelContent::Table(t) => {
                assert_eq!(t.row_count(), 6);
                assert!(t.numeric("PM2.5")?.iter().flatten().all(|v| *v >= 100.0));
            }
            other => panic!("unexpected panel {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_empty_explore_names_its_filters() -> Result<()> {
        let store = store();
        let criteria = FilterCriteria::new()
            .with_pm25_range(900.0, 1000.0)
            .with_rain([RainIntensity::Heavy]);
        let response = Dashboard::new(&store).handle(Request::Explore { criteria })?;

        assert_eq!(
            response.warnings,
            vec![Warning::EmptyResult {
                filter: "PM2.5 in [900, 1000]; rain: Heavy Rain".to_string()
            }]
        );
        assert_eq!(
            response.warnings[0].to_string(),
            "No data matches the selected filters (PM2.5 in [900, 1000]; rain: Heavy Rain)"
        );
        Ok(())
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let store = store();
        let result = Dashboard::new(&store).handle(Request::Describe {
            range: None,
            columns: vec!["CO".to_string()],
        });
        assert!(matches!(result, Err(PipelineError::UnknownColumn(_))));
    }
}
