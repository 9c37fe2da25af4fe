use tracing::debug;

use crate::error::Result;
use crate::models::{BucketScheme, Column, Table};

/// Append `scheme.output_column()` holding the bucket label of each row's
/// `column` value. Missing and out-of-range values get no label.
pub fn bucketize(table: &Table, column: &str, scheme: &BucketScheme) -> Result<Table> {
    let labels: Vec<Option<String>> = table
        .numeric(column)?
        .iter()
        .map(|cell| cell.and_then(|v| scheme.label_for(v)).map(str::to_string))
        .collect();

    let unlabelled = labels.iter().filter(|l| l.is_none()).count();
    debug!(
        column,
        output = scheme.output_column(),
        rows = labels.len(),
        unlabelled,
        "bucketized column"
    );

    table.with_column(Column::categorical(scheme.output_column(), labels))
}
