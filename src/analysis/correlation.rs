use serde::Serialize;

use crate::core::Table;
use crate::error::Result;

/// Pairwise Pearson correlation over the numeric columns of a table.
///
/// `values[i][j]` is `None` when the pair has fewer than two complete rows
/// or either side has zero variance over those rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Smallest and largest defined coefficient
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Correlation matrix over the table's numeric columns, in table order
pub fn correlation_matrix(table: &Table) -> Result<CorrelationMatrix> {
    let columns = table.numeric_columns();
    let data = columns
        .iter()
        .map(|name| table.numeric_values(name))
        .collect::<Result<Vec<_>>>()?;

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix { columns, values })
}

/// Pearson correlation over the rows where both sides are present
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let nobs = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nobs;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nobs;
    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }
    if den_x <= 0.0 || den_y <= 0.0 {
        return None;
    }
    Some((num / (den_x * den_y).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFormat;
    use polars::prelude::*;

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let z = [Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        let flat = [Some(1.0), Some(1.0), Some(1.0)];
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&x, &flat), None);
        assert_eq!(pearson(&[Some(1.0), None], &[None, Some(2.0)]), None);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let df = df!(
            "a" => [1.0, 2.0, 3.0, 4.0],
            "b" => [Some(2i64), Some(1), None, Some(5)],
            "name" => ["w", "x", "y", "z"],
        )
        .unwrap();
        let table = Table::new("m.csv", SourceFormat::Csv, df);
        let m = correlation_matrix(&table).unwrap();
        assert_eq!(m.columns, vec!["a", "b"]);
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(0, 1), m.get(1, 0));
        assert!(m.range().is_some());
    }
}
