use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Matrix, Table};

/// Pearson correlation over the rows where both cells are present.
///
/// Returns NaN with fewer than two complete pairs or when either side has
/// zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

/// Pairwise Pearson correlation across `columns`.
///
/// Needs at least two columns. The result is symmetric with a unit diagonal.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<Matrix> {
    if columns.len() < 2 {
        return Err(PipelineError::InsufficientSelection {
            selected: columns.len(),
        });
    }

    let series = columns
        .iter()
        .map(|name| table.numeric(name))
        .collect::<Result<Vec<_>>>()?;

    let n = columns.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(series[i], series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(columns = n, rows = table.row_count(), "computed correlation matrix");
    Matrix::new(columns.iter().map(|c| c.to_string()).collect(), values)
}
