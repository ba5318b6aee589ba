use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::core::Table;
use crate::error::Result;

/// Number of pairs kept in an insight report
pub const TOP_N: usize = 5;

/// Two numeric columns with their correlation; `left` precedes `right` in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub left: String,
    pub right: String,
    pub correlation: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InsightReport {
    pub pairs: Vec<CorrelatedPair>,
}

impl InsightReport {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Strongest correlated column pairs, or `None` with fewer than two numeric columns.
pub fn insights(table: &Table) -> Result<Option<InsightReport>> {
    let matrix = correlation_matrix(table)?;
    if matrix.len() < 2 {
        return Ok(None);
    }
    Ok(Some(rank_pairs(&matrix, TOP_N)))
}

/// Flatten, rank by absolute correlation and keep the first `limit` unique pairs.
///
/// Ties on strength are broken by `(left, right)` compared lexicographically.
pub fn rank_pairs(matrix: &CorrelationMatrix, limit: usize) -> InsightReport {
    let mut entries: Vec<CorrelatedPair> = Vec::new();
    for (i, left) in matrix.columns.iter().enumerate() {
        for (j, right) in matrix.columns.iter().enumerate() {
            let Some(r) = matrix.get(i, j) else { continue };
            if i == j {
                continue;
            }
            // normalize to table order so (B, A) collapses onto (A, B)
            let (left, right) = if i < j { (left, right) } else { (right, left) };
            entries.push(CorrelatedPair {
                left: left.clone(),
                right: right.clone(),
                correlation: r,
                strength: r.abs(),
            });
        }
    }

    entries.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.left.cmp(&b.left))
            .then_with(|| a.right.cmp(&b.right))
    });

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let pairs = entries
        .into_iter()
        .filter(|p| seen.insert((p.left.clone(), p.right.clone())))
        .take(limit)
        .collect();
    InsightReport { pairs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFormat;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn table(df: DataFrame) -> Table {
        Table::new("i.csv", SourceFormat::Csv, df)
    }

    #[test]
    fn test_single_numeric_column_has_no_report() {
        let t = table(df!("a" => [1.0, 2.0], "s" => ["x", "y"]).unwrap());
        assert_eq!(insights(&t).unwrap(), None);
    }

    #[test]
    fn test_two_numeric_columns_give_one_pair() {
        let t = table(df!("a" => [1.0, 2.0, 3.0], "b" => [3.0, 1.0, 2.0]).unwrap());
        let report = insights(&t).unwrap().unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].left, "a");
        assert_eq!(report.pairs[0].right, "b");
        assert!((report.pairs[0].correlation + 0.5).abs() < 1e-12);
        assert!((report.pairs[0].strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ranked_unique_and_sorted() {
        let t = table(
            df!(
                "a" => [1.0, 2.0, 3.0, 4.0, 5.0],
                "b" => [2.0, 4.1, 5.9, 8.2, 9.9],
                "c" => [5.0, 3.0, 4.0, 1.0, 2.0],
                "d" => [1.0, 3.0, 2.0, 5.0, 4.0],
            )
            .unwrap(),
        );
        let report = insights(&t).unwrap().unwrap();
        assert_eq!(report.pairs.len(), TOP_N);

        let mut seen = HashSet::new();
        for p in &report.pairs {
            assert_ne!(p.left, p.right);
            assert!(seen.insert((p.left.clone(), p.right.clone())));
            assert!(!seen.contains(&(p.right.clone(), p.left.clone())));
        }
        for w in report.pairs.windows(2) {
            assert!(w[0].strength >= w[1].strength);
        }
        // c + d is constant, so that pair is exactly anti-correlated
        assert_eq!((report.pairs[0].left.as_str(), report.pairs[0].right.as_str()), ("c", "d"));
        assert!((report.pairs[0].correlation + 1.0).abs() < 1e-12);
        assert_eq!((report.pairs[1].left.as_str(), report.pairs[1].right.as_str()), ("a", "b"));
    }

    #[test]
    fn test_ties_break_lexicographically() {
        let matrix = CorrelationMatrix {
            columns: vec!["z".into(), "m".into(), "a".into()],
            values: vec![
                vec![Some(1.0), Some(0.5), Some(-0.5)],
                vec![Some(0.5), Some(1.0), Some(0.5)],
                vec![Some(-0.5), Some(0.5), Some(1.0)],
            ],
        };
        let report = rank_pairs(&matrix, TOP_N);
        let order: Vec<(&str, &str)> = report
            .pairs
            .iter()
            .map(|p| (p.left.as_str(), p.right.as_str()))
            .collect();
        assert_eq!(order, vec![("m", "a"), ("z", "a"), ("z", "m")]);
    }

    #[test]
    fn test_undefined_correlations_are_skipped() {
        let t = table(df!("a" => [1.0, 2.0, 3.0], "flat" => [4.0, 4.0, 4.0]).unwrap());
        let report = insights(&t).unwrap().unwrap();
        assert!(report.is_empty());
    }
}
