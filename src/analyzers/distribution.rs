use crate::error::{PipelineError, Result};
use crate::models::{Column, Table};
use crate::utils::constants::MAX_HISTOGRAM_BINS;

/// Number of rows per category label, in the order of `order`.
///
/// Every label in `order` gets a row, including those with no rows.
/// Cells holding a label outside `order` are not counted.
pub fn value_counts<S: AsRef<str>>(table: &Table, column: &str, order: &[S]) -> Result<Table> {
    let cells = table.categorical(column)?;

    let counts: Vec<Option<f64>> = order
        .iter()
        .map(|label| {
            let label = label.as_ref();
            let n = cells
                .iter()
                .filter(|c| c.as_deref() == Some(label))
                .count();
            Some(n as f64)
        })
        .collect();

    Table::from_columns(vec![
        Column::categorical(
            column,
            order.iter().map(|l| Some(l.as_ref().to_string())).collect(),
        ),
        Column::numeric("count", counts),
    ])
}

/// Equal-width histogram over the present values of `column`, with
/// `1..=MAX_HISTOGRAM_BINS` bins.
///
/// Bins are `[start, end)` except the last, which also holds the maximum.
/// A column with a single distinct value is spread over `value ± 0.5`.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Result<Table> {
    if bins == 0 || bins > MAX_HISTOGRAM_BINS {
        return Err(PipelineError::InvalidCriteria(format!(
            "Histogram needs 1 to {} bins, got {}",
            MAX_HISTOGRAM_BINS, bins
        )));
    }

    let values: Vec<f64> = table
        .numeric(column)?
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Table::from_columns(vec![
            Column::numeric("bin_start", vec![]),
            Column::numeric("bin_end", vec![]),
            Column::numeric("count", vec![]),
        ]);
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in &values {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    Table::from_columns(vec![
        Column::numeric("bin_start", edges[..bins].iter().map(|e| Some(*e)).collect()),
        Column::numeric(
            "bin_end",
            edges[1..].iter().map(|e| Some(*e)).collect(),
        ),
        Column::numeric("count", counts.iter().map(|c| Some(*c as f64)).collect()),
    ])
}

/// The `(x, y)` pairs where both cells are present, in source order.
pub fn scatter(table: &Table, x: &str, y: &str) -> Result<Table> {
    let xs = table.numeric(x)?;
    let ys = table.numeric(y)?;

    let (px, py): (Vec<Option<f64>>, Vec<Option<f64>>) = xs
        .iter()
        .zip(ys)
        .filter(|(a, b)| a.is_some() && b.is_some())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if x == y {
        return Table::from_columns(vec![Column::numeric(x, px)]);
    }
    Table::from_columns(vec![Column::numeric(x, px), Column::numeric(y, py)])
}
