use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::Table;
use crate::utils::constants::{CALENDAR_COLUMNS, DATETIME_COLUMN};

/// Inclusive timestamp interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidCriteria(format!(
                "Start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days: from the start of `start` to the last second of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(|| {
            PipelineError::InvalidCriteria("Invalid end-of-day time".to_string())
        })?;
        Self::new(start.and_time(NaiveTime::MIN), end.and_time(last_second))
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")?;
        let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d")?;
        Self::from_dates(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Rows whose `datetime` lies in `range`, bounds included.
pub fn filter_by_date(table: &Table, range: &DateRange) -> Result<Table> {
    let keep: Vec<bool> = table
        .datetimes()?
        .iter()
        .map(|dt| range.contains(*dt))
        .collect();

    let filtered = table.filter_rows(&keep);
    debug!(
        range = %range,
        before = table.row_count(),
        after = filtered.row_count(),
        "filtered by date"
    );
    Ok(filtered)
}

/// Rows whose `column` value lies in `[lo, hi]`. Missing cells never match.
pub fn filter_by_range(table: &Table, column: &str, lo: f64, hi: f64) -> Result<Table> {
    if lo.is_nan() || hi.is_nan() || lo > hi {
        return Err(PipelineError::InvalidCriteria(format!(
            "Invalid range [{}, {}] for column '{}'",
            lo, hi, column
        )));
    }

    let keep: Vec<bool> = table
        .numeric(column)?
        .iter()
        .map(|cell| cell.map_or(false, |v| lo <= v && v <= hi))
        .collect();

    let filtered = table.filter_rows(&keep);
    debug!(
        column,
        lo,
        hi,
        before = table.row_count(),
        after = filtered.row_count(),
        "filtered by range"
    );
    Ok(filtered)
}

/// Rows whose categorical `column` holds one of `labels`.
pub fn filter_by_category(table: &Table, column: &str, labels: &[&str]) -> Result<Table> {
    let keep: Vec<bool> = table
        .categorical(column)?
        .iter()
        .map(|cell| {
            cell.as_deref()
                .map_or(false, |label| labels.contains(&label))
        })
        .collect();

    let filtered = table.filter_rows(&keep);
    debug!(
        column,
        ?labels,
        before = table.row_count(),
        after = filtered.row_count(),
        "filtered by category"
    );
    Ok(filtered)
}

/// Keep `datetime`, the calendar columns and the chosen measure columns.
pub fn select_columns(table: &Table, columns: &[&str]) -> Result<Table> {
    let mut names: Vec<&str> = Vec::with_capacity(columns.len() + CALENDAR_COLUMNS.len() + 1);
    for fixed in std::iter::once(DATETIME_COLUMN).chain(CALENDAR_COLUMNS) {
        if table.has_column(fixed) {
            names.push(fixed);
        }
    }
    for &column in columns {
        if !names.contains(&column) {
            names.push(column);
        }
    }
    table.select(&names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use pretty_assertions::assert_eq;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::datetime(
                DATETIME_COLUMN,
                vec![
                    ts(2013, 3, 1, 0),
                    ts(2013, 3, 1, 23),
                    ts(2013, 3, 2, 0),
                    ts(2014, 6, 1, 12),
                ],
            ),
            Column::numeric("year", vec![Some(2013.0), Some(2013.0), Some(2013.0), Some(2014.0)]),
            Column::numeric("PM2.5", vec![Some(8.0), None, Some(75.0), Some(300.0)]),
            Column::numeric("SO2", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            Column::categorical(
                "RAIN_Intensity",
                vec![
                    Some("No Rain".into()),
                    Some("Light Rain".into()),
                    None,
                    Some("No Rain".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_date_range_validation() {
        let a = ts(2013, 3, 2, 0);
        let b = ts(2013, 3, 1, 0);
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).is_ok());
        assert!(DateRange::parse("2013-03-01", "2013-02-01").is_err());
        assert!(DateRange::parse("2013-03-01", "yesterday").is_err());
    }

    #[test]
    fn test_filter_by_date_whole_days() -> Result<()> {
        let table = sample();
        let range = DateRange::parse("2013-03-01", "2013-03-01")?;
        let filtered = filter_by_date(&table, &range)?;
        assert_eq!(filtered.row_count(), 2);
        assert!(filtered.datetimes()?.iter().all(|dt| range.contains(*dt)));
        Ok(())
    }

    #[test]
    fn test_end_day_keeps_every_hour() -> Result<()> {
        let table = Table::from_columns(vec![Column::datetime(
            DATETIME_COLUMN,
            vec![
                ts(2013, 3, 2, 0),
                ts(2013, 3, 2, 5),
                ts(2013, 3, 2, 23),
                ts(2013, 3, 3, 0),
            ],
        )])?;

        let range = DateRange::parse("2013-03-01", "2013-03-02")?;
        assert_eq!(range.end().to_string(), "2013-03-02 23:59:59");

        let filtered = filter_by_date(&table, &range)?;
        assert_eq!(
            filtered.datetimes()?,
            &[ts(2013, 3, 2, 0), ts(2013, 3, 2, 5), ts(2013, 3, 2, 23)]
        );
        Ok(())
    }

    #[test]
    fn test_filter_by_date_inclusive_bounds() -> Result<()> {
        let table = sample();
        let range = DateRange::new(ts(2013, 3, 1, 23), ts(2013, 3, 2, 0))?;
        let filtered = filter_by_date(&table, &range)?;
        assert_eq!(filtered.row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_filter_by_date_idempotent() -> Result<()> {
        let table = sample();
        let range = DateRange::parse("2013-03-01", "2013-12-31")?;
        let once = filter_by_date(&table, &range)?;
        let twice = filter_by_date(&once, &range)?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_filter_by_date_outside_data() -> Result<()> {
        let table = sample();
        let range = DateRange::parse("2020-01-01", "2020-01-02")?;
        let filtered = filter_by_date(&table, &range)?;
        assert!(filtered.is_empty());
        assert_eq!(filtered.column_names(), table.column_names());
        Ok(())
    }

    #[test]
    fn test_filter_by_range_inclusive_and_skips_missing() -> Result<()> {
        let table = sample();
        let filtered = filter_by_range(&table, "PM2.5", 8.0, 75.0)?;
        assert_eq!(filtered.numeric("PM2.5")?, &[Some(8.0), Some(75.0)]);
        Ok(())
    }

    #[test]
    fn test_filter_by_range_rejects_inverted_bounds() {
        let table = sample();
        assert!(matches!(
            filter_by_range(&table, "PM2.5", 10.0, 5.0),
            Err(PipelineError::InvalidCriteria(_))
        ));
        assert!(matches!(
            filter_by_range(&table, "RAIN_Intensity", 0.0, 5.0),
            Err(PipelineError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_filter_by_category() -> Result<()> {
        let table = sample();
        let filtered = filter_by_category(&table, "RAIN_Intensity", &["No Rain"])?;
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.numeric("SO2")?, &[Some(1.0), Some(4.0)]);
        Ok(())
    }

    #[test]
    fn test_select_columns_keeps_calendar() -> Result<()> {
        let table = sample();
        let selected = select_columns(&table, &["SO2", "year"])?;
        assert_eq!(selected.column_names(), vec!["datetime", "year", "SO2"]);
        assert!(select_columns(&table, &["CO"]).is_err());
        Ok(())
    }
}
