use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::{Measure, ObservationRecord};
use crate::utils::constants::{
    DATETIME_COLUMN, ROW_NUMBER_COLUMN, STATION_COLUMN, WIND_DIRECTION_COLUMN,
};

/// Cell storage for one column. Numeric and categorical cells may be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    DateTime(Vec<NaiveDateTime>),
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ColumnData::DateTime(_) => "datetime",
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Categorical(_) => "categorical",
        }
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::DateTime(v) => ColumnData::DateTime(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// Cell rendered as text, empty for a missing value
    pub fn cell_text(&self, row: usize) -> String {
        match self {
            ColumnData::DateTime(v) => v[row].format("%Y-%m-%d %H:%M").to_string(),
            ColumnData::Numeric(v) => match v[row] {
                Some(x) if x.is_nan() => "NaN".to_string(),
                Some(x) if x.fract() == 0.0 && x.abs() < 1e15 => format!("{}", x as i64),
                Some(x) => format!("{:.3}", x),
                None => String::new(),
            },
            ColumnData::Categorical(v) => v[row].clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Categorical(values))
    }

    pub fn datetime(name: impl Into<String>, values: Vec<NaiveDateTime>) -> Self {
        Self::new(name, ColumnData::DateTime(values))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }
}

/// In-memory table of equally long named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking lengths and name uniqueness.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Columnar view of loaded observations, with the derived `datetime` first.
    pub fn from_observations(records: &[ObservationRecord]) -> Result<Self> {
        let datetimes = records
            .iter()
            .map(|r| r.datetime())
            .collect::<Result<Vec<_>>>()?;

        let mut columns = vec![Column::datetime(DATETIME_COLUMN, datetimes)];

        if records.iter().any(|r| r.row_number.is_some()) {
            columns.push(Column::numeric(
                ROW_NUMBER_COLUMN,
                records.iter().map(|r| r.row_number.map(|n| n as f64)).collect(),
            ));
        }

        columns.push(Column::numeric(
            "year",
            records.iter().map(|r| Some(r.year as f64)).collect(),
        ));
        columns.push(Column::numeric(
            "month",
            records.iter().map(|r| Some(r.month as f64)).collect(),
        ));
        columns.push(Column::numeric(
            "day",
            records.iter().map(|r| Some(r.day as f64)).collect(),
        ));
        columns.push(Column::numeric(
            "hour",
            records.iter().map(|r| Some(r.hour as f64)).collect(),
        ));

        for measure in Measure::ALL {
            columns.push(Column::numeric(
                measure.column_name(),
                records.iter().map(|r| r.measure(measure)).collect(),
            ));
        }

        if records.iter().any(|r| r.wind_direction.is_some()) {
            columns.push(Column::categorical(
                WIND_DIRECTION_COLUMN,
                records.iter().map(|r| r.wind_direction.clone()).collect(),
            ));
        }
        if records.iter().any(|r| r.station.is_some()) {
            columns.push(Column::categorical(
                STATION_COLUMN,
                records.iter().map(|r| r.station.clone()).collect(),
            ));
        }

        Table::from_columns(columns)
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(PipelineError::InvalidFormat(format!(
                "Duplicate column '{}'",
                column.name
            )));
        }
        if self.columns.is_empty() {
            self.row_count = column.data.len();
        } else if column.data.len() != self.row_count {
            return Err(PipelineError::InvalidFormat(format!(
                "Column '{}' has {} rows, table has {}",
                column.name,
                column.data.len(),
                self.row_count
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Copy of this table with one more column appended
    pub fn with_column(&self, column: Column) -> Result<Table> {
        let mut table = self.clone();
        table.push_column(column)?;
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(values) => Ok(values),
            _ => Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    pub fn categorical(&self, name: &str) -> Result<&[Option<String>]> {
        match &self.column(name)?.data {
            ColumnData::Categorical(values) => Ok(values),
            _ => Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    pub fn datetimes(&self) -> Result<&[NaiveDateTime]> {
        match &self.column(DATETIME_COLUMN)?.data {
            ColumnData::DateTime(values) => Ok(values),
            _ => Err(PipelineError::ColumnType {
                column: DATETIME_COLUMN.to_string(),
                expected: "a datetime",
            }),
        }
    }

    /// Rows where `keep` is true, in source order
    pub fn filter_rows(&self, keep: &[bool]) -> Table {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.take_rows(&rows)
    }

    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
            row_count: rows.len(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_rows(&rows)
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(self.column(name)?.clone());
        }
        let mut table = Table::from_columns(columns)?;
        table.row_count = self.row_count;
        Ok(table)
    }

    /// Earliest and latest `datetime`, if the table has rows
    pub fn datetime_bounds(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        let datetimes = self.datetimes()?;
        let min = datetimes.iter().min().copied();
        let max = datetimes.iter().max().copied();
        Ok(min.zip(max))
    }
}

/// Square matrix labelled by column name on both axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn new(labels: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self> {
        let n = labels.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(PipelineError::InvalidFormat(format!(
                "Matrix must be {}x{}",
                n, n
            )));
        }
        Ok(Self { labels, values })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn get_by_name(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == col)?;
        Some(self.values[r][c])
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// NaN cells compare equal to each other
    pub fn is_symmetric(&self) -> bool {
        (0..self.size()).all(|i| {
            (0..i).all(|j| {
                let (a, b) = (self.values[i][j], self.values[j][i]);
                (a.is_nan() && b.is_nan()) || a == b
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::datetime(DATETIME_COLUMN, vec![ts(1, 0), ts(1, 1), ts(2, 0)]),
            Column::numeric("PM2.5", vec![Some(10.0), None, Some(80.0)]),
            Column::categorical("wd", vec![Some("N".into()), Some("NE".into()), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_length_mismatch() {
        let mut table = sample();
        let err = table
            .push_column(Column::numeric("PM10", vec![Some(1.0)]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFormat(_)));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = sample();
        assert!(table
            .push_column(Column::numeric("PM2.5", vec![None, None, None]))
            .is_err());
    }

    #[test]
    fn test_filter_rows_keeps_order() {
        let table = sample();
        let filtered = table.filter_rows(&[true, false, true]);
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.numeric("PM2.5").unwrap(), &[Some(10.0), Some(80.0)]);
        assert_eq!(filtered.datetimes().unwrap(), &[ts(1, 0), ts(2, 0)]);
    }

    #[test]
    fn test_typed_access_errors() {
        let table = sample();
        assert!(matches!(
            table.numeric("wd"),
            Err(PipelineError::ColumnType { .. })
        ));
        assert!(matches!(
            table.numeric("SO2"),
            Err(PipelineError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_select_and_bounds() {
        let table = sample();
        let selected = table.select(&["wd", "PM2.5"]).unwrap();
        assert_eq!(selected.column_names(), vec!["wd", "PM2.5"]);
        assert_eq!(selected.row_count(), 3);
        assert_eq!(
            table.datetime_bounds().unwrap(),
            Some((ts(1, 0), ts(2, 0)))
        );
        assert_eq!(table.filter_rows(&[false; 3]).datetime_bounds().unwrap(), None);
    }

    #[test]
    fn test_cell_text() {
        let table = sample();
        let pm = &table.column("PM2.5").unwrap().data;
        assert_eq!(pm.cell_text(0), "10");
        assert_eq!(pm.cell_text(1), "");
        let dt = &table.column(DATETIME_COLUMN).unwrap().data;
        assert_eq!(dt.cell_text(2), "2014-05-02 00:00");
    }

    #[test]
    fn test_matrix_shape_and_symmetry() {
        let m = Matrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.5], vec![0.5, 1.0]],
        )
        .unwrap();
        assert!(m.is_symmetric());
        assert_eq!(m.get_by_name("a", "b"), Some(0.5));
        assert!(Matrix::new(vec!["a".into()], vec![vec![1.0, 2.0]]).is_err());
    }
}
