use serde::Serialize;

use crate::error::Result;
use crate::models::{Column, Table};

/// Rows produced by [`describe`], in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Statistic {
    Count,
    Mean,
    Std,
    Min,
    Q1,
    Median,
    Q3,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 8] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Q1,
        Statistic::Median,
        Statistic::Q3,
        Statistic::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Q1 => "25%",
            Statistic::Median => "50%",
            Statistic::Q3 => "75%",
            Statistic::Max => "max",
        }
    }
}

/// Descriptive statistics of one series, missing values skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn from_cells(cells: &[Option<f64>]) -> Self {
        let mut values: Vec<f64> = cells.iter().flatten().copied().collect();
        values.sort_by(f64::total_cmp);

        Self {
            count: values.len(),
            mean: mean(&values),
            std: sample_std(&values),
            min: values.first().copied(),
            q1: quantile_sorted(&values, 0.25),
            median: quantile_sorted(&values, 0.5),
            q3: quantile_sorted(&values, 0.75),
            max: values.last().copied(),
        }
    }

    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Count => Some(self.count as f64),
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Q1 => self.q1,
            Statistic::Median => self.median,
            Statistic::Q3 => self.q3,
            Statistic::Max => self.max,
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with n-1 degrees of freedom
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of an ascending slice, linearly interpolated between closest ranks
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Count, mean, std, min, quartiles and max for every numeric column.
///
/// The result has a `statistic` label column followed by one numeric column
/// per input column, in input order.
pub fn describe(table: &Table) -> Result<Table> {
    let mut columns = vec![Column::categorical(
        "statistic",
        Statistic::ALL
            .iter()
            .map(|s| Some(s.label().to_string()))
            .collect(),
    )];

    for name in table.numeric_column_names() {
        let summary = Summary::from_cells(table.numeric(name)?);
        columns.push(Column::numeric(
            name,
            Statistic::ALL.iter().map(|s| summary.get(*s)).collect(),
        ));
    }

    Table::from_columns(columns)
}
