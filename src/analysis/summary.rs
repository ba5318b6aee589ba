//! Dataset overview, per-column dtypes/missing counts and descriptive statistics
use serde::Serialize;

use crate::core::table::kind_of;
use crate::core::{ColumnKind, Table};
use crate::error::Result;

/// Headline numbers for the overview panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: usize,
}

/// One entry of the dtypes & missing values panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Descriptive statistics for one numeric column.
///
/// Statistics are `None` when undefined: everything but `count` for an
/// all-missing column, and `std` when fewer than two values are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeRow {
    pub column: String,
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Labels of the describe statistics, in display order
pub const DESCRIBE_STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

impl DescribeRow {
    /// Statistic values in the order of [`DESCRIBE_STATS`]
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

pub fn overview(table: &Table) -> Result<Overview> {
    Ok(Overview {
        rows: table.row_count(),
        columns: table.column_count(),
        missing_values: missing_count(table)?,
    })
}

/// Total missing cells across the whole table
pub fn missing_count(table: &Table) -> Result<usize> {
    Ok(column_missing(table)?.iter().map(|(_, n)| n).sum())
}

/// Missing cells per column, in table order
pub fn column_missing(table: &Table) -> Result<Vec<(String, usize)>> {
    table
        .column_names()
        .into_iter()
        .map(|name| {
            let missing = table.missing_in(&name)?;
            Ok((name, missing))
        })
        .collect()
}

/// Polars dtype per column, in table order
pub fn column_types(table: &Table) -> Vec<(String, String)> {
    table
        .dataframe()
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), format!("{}", c.dtype())))
        .collect()
}

pub fn column_info(table: &Table) -> Result<Vec<ColumnInfo>> {
    let mut out = Vec::with_capacity(table.column_count());
    for column in table.dataframe().get_columns() {
        let name = column.name().to_string();
        out.push(ColumnInfo {
            missing: table.missing_in(&name)?,
            dtype: format!("{}", column.dtype()),
            kind: kind_of(column.dtype()),
            name,
        });
    }
    Ok(out)
}

/// Describe every numeric column, in table order
pub fn describe(table: &Table) -> Result<Vec<DescribeRow>> {
    table
        .numeric_columns()
        .into_iter()
        .map(|name| {
            let values: Vec<f64> = table.numeric_values(&name)?.into_iter().flatten().collect();
            Ok(describe_values(name, values))
        })
        .collect()
}

fn describe_values(column: String, mut values: Vec<f64>) -> DescribeRow {
    // Welford's algorithm for mean and std
    let mut n: u64 = 0;
    let mut mean: f64 = 0.0;
    let mut m2: f64 = 0.0;
    for &x in &values {
        n += 1;
        let delta = x - mean;
        mean += delta / (n as f64);
        let delta2 = x - mean;
        m2 += delta * delta2;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    DescribeRow {
        column,
        count: n,
        mean: (n > 0).then_some(mean),
        std: (n > 1).then(|| (m2 / ((n as f64) - 1.0)).sqrt()),
        min: values.first().copied(),
        q25: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Linear-interpolated quantile of already sorted values
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFormat;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn table(df: DataFrame) -> Table {
        Table::new("t.csv", SourceFormat::Csv, df)
    }

    #[test]
    fn test_overview_counts() {
        let t = table(
            df!(
                "a" => [Some(1i64), None, Some(3)],
                "b" => [Some("x"), Some("y"), None],
                "c" => [Some(1.0), Some(f64::NAN), None],
            )
            .unwrap(),
        );
        let o = overview(&t).unwrap();
        assert_eq!(o, Overview { rows: 3, columns: 3, missing_values: 4 });

        let per_column = column_missing(&t).unwrap();
        assert_eq!(
            per_column,
            vec![("a".to_string(), 1), ("b".to_string(), 1), ("c".to_string(), 2)]
        );
        let summed: usize = per_column.iter().map(|(_, n)| n).sum();
        assert_eq!(missing_count(&t).unwrap(), summed);
    }

    #[test]
    fn test_describe_matches_reference_values() {
        let t = table(df!("v" => [1.0, 2.0, 3.0, 4.0], "label" => ["a", "b", "c", "d"]).unwrap());
        let rows = describe(&t).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.column, "v");
        assert_eq!(r.count, 4);
        assert_eq!(r.mean, Some(2.5));
        assert!((r.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(r.min, Some(1.0));
        assert_eq!(r.q25, Some(1.75));
        assert_eq!(r.median, Some(2.5));
        assert_eq!(r.q75, Some(3.25));
        assert_eq!(r.max, Some(4.0));
    }

    #[test]
    fn test_describe_degenerate_columns() {
        let t = table(
            df!(
                "single" => [Some(5i64), None],
                "empty" => [None::<f64>, None],
            )
            .unwrap(),
        );
        let rows = describe(&t).unwrap();
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].mean, Some(5.0));
        assert_eq!(rows[0].std, None);
        assert_eq!(rows[1].count, 0);
        assert_eq!(rows[1].mean, None);
        assert_eq!(rows[1].median, None);
    }

    #[test]
    fn test_empty_table_degrades_gracefully() {
        let t = table(DataFrame::empty());
        assert_eq!(overview(&t).unwrap(), Overview { rows: 0, columns: 0, missing_values: 0 });
        assert!(describe(&t).unwrap().is_empty());
        assert!(column_info(&t).unwrap().is_empty());
    }

    #[test]
    fn test_column_info_reports_kinds() {
        let t = table(df!("n" => [1i64, 2], "s" => ["a", "b"], "f" => [true, false]).unwrap());
        let info = column_info(&t).unwrap();
        let kinds: Vec<ColumnKind> = info.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Boolean]);
        assert_eq!(info[0].dtype, "i64");
        assert_eq!(column_types(&t)[1], ("s".to_string(), "str".to_string()));
    }

    #[test]
    fn test_quantile_sorted() {
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile_sorted(&[1.0, 2.0, 3.0], 0.5), Some(2.0));
    }
}
