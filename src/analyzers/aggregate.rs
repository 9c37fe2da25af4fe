use std::cmp::Ordering;

use tracing::debug;

use crate::analyzers::statistics::mean;
use crate::error::{PipelineError, Result};
use crate::models::{Column, ColumnData, Table};

/// Borrowed group key; numbers order by `total_cmp`, labels lexically.
#[derive(Debug, Clone, Copy)]
enum KeyRef<'a> {
    Number(f64),
    Label(&'a str),
}

impl KeyRef<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyRef::Number(a), KeyRef::Number(b)) => a.total_cmp(b),
            (KeyRef::Label(a), KeyRef::Label(b)) => a.cmp(b),
            (KeyRef::Number(_), KeyRef::Label(_)) => Ordering::Less,
            (KeyRef::Label(_), KeyRef::Number(_)) => Ordering::Greater,
        }
    }
}

/// Mean of `value_column` for each distinct value of `group_key`.
///
/// One output row per key present (rows with a missing key are dropped),
/// ordered by key ascending. A group whose values are all missing gets a
/// missing mean.
pub fn aggregate_mean(table: &Table, group_key: &str, value_column: &str) -> Result<Table> {
    let values = table.numeric(value_column)?;
    let keys: Vec<Option<KeyRef<'_>>> = match &table.column(group_key)?.data {
        ColumnData::Numeric(cells) => cells.iter().map(|c| c.map(KeyRef::Number)).collect(),
        ColumnData::Categorical(cells) => cells
            .iter()
            .map(|c| c.as_deref().map(KeyRef::Label))
            .collect(),
        ColumnData::DateTime(_) => {
            return Err(PipelineError::ColumnType {
                column: group_key.to_string(),
                expected: "numeric or categorical",
            })
        }
    };

    let mut rows: Vec<(KeyRef<'_>, Option<f64>)> = keys
        .iter()
        .zip(values)
        .filter_map(|(key, value)| key.map(|k| (k, *value)))
        .collect();
    rows.sort_by(|a, b| a.0.compare(&b.0));

    let mut group_keys: Vec<KeyRef<'_>> = Vec::new();
    let mut group_means: Vec<Option<f64>> = Vec::new();
    for run in rows.chunk_by(|a, b| a.0.compare(&b.0) == Ordering::Equal) {
        let present: Vec<f64> = run.iter().filter_map(|(_, v)| *v).collect();
        group_keys.push(run[0].0);
        group_means.push(mean(&present));
    }

    debug!(
        group_key,
        value_column,
        groups = group_keys.len(),
        "aggregated mean"
    );

    let key_column = match &table.column(group_key)?.data {
        ColumnData::Categorical(_) => Column::categorical(
            group_key,
            group_keys
                .iter()
                .map(|k| match k {
                    KeyRef::Label(l) => Some(l.to_string()),
                    KeyRef::Number(n) => Some(n.to_string()),
                })
                .collect(),
        ),
        _ => Column::numeric(
            group_key,
            group_keys
                .iter()
                .map(|k| match k {
                    KeyRef::Number(n) => Some(*n),
                    KeyRef::Label(_) => None,
                })
                .collect(),
        ),
    };

    let value_name = if value_column == group_key {
        format!("{}_mean", value_column)
    } else {
        value_column.to_string()
    };

    Table::from_columns(vec![key_column, Column::numeric(value_name, group_means)])
}
