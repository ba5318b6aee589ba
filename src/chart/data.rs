//! Backend-independent plot geometry.
//!
//! `plot_data` turns a validated [`ChartSpec`] into the numbers a renderer
//! draws: point sets, histogram bins with a density overlay, box summaries,
//! category counts or a correlation grid. Nothing here touches a drawing
//! backend, so every chart kind can be checked without rasterizing.
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analysis::summary::quantile_sorted;
use crate::chart::spec::ChartSpec;
use crate::core::{ColumnKind, Table};
use crate::error::Result;

/// Upper bound on histogram bins
pub const MAX_BINS: usize = 100;
/// Evaluation points of the density curve
pub const KDE_POINTS: usize = 200;
/// Labels longer than this, or more categories than `ROTATE_AFTER_CATEGORIES`, get rotated
pub const ROTATE_LABEL_LEN: usize = 6;
pub const ROTATE_AFTER_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Density overlay of a histogram, already scaled to count units
#[derive(Debug, Clone, PartialEq)]
pub enum Density {
    Curve(Vec<(f64, f64)>),
    /// Zero-variance data: all mass at one value
    Spike { at: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotData {
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// Points connected in row order. With `x_ticks` set the x values are
    /// row positions and `x_ticks[i]` labels position `i`.
    Line {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
        x_ticks: Option<Vec<String>>,
    },
    Histogram {
        title: String,
        column: String,
        bins: Vec<Bin>,
        density: Density,
    },
    Box {
        title: String,
        column: String,
        stats: BoxStats,
    },
    Counts {
        title: String,
        column: String,
        categories: Vec<(String, usize)>,
        rotate_labels: bool,
    },
    Heatmap {
        title: String,
        matrix: CorrelationMatrix,
    },
    Placeholder {
        title: String,
        message: String,
    },
}

impl PlotData {
    pub fn title(&self) -> &str {
        match self {
            PlotData::Scatter { title, .. }
            | PlotData::Line { title, .. }
            | PlotData::Histogram { title, .. }
            | PlotData::Box { title, .. }
            | PlotData::Counts { title, .. }
            | PlotData::Heatmap { title, .. }
            | PlotData::Placeholder { title, .. } => title,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PlotData::Placeholder { .. })
    }
}

fn placeholder(title: String, message: impl Into<String>) -> PlotData {
    PlotData::Placeholder {
        title,
        message: message.into(),
    }
}

/// Compute the geometry for `spec` over `table`.
///
/// Selection errors are returned; thin data degrades to a placeholder.
pub fn plot_data(table: &Table, spec: &ChartSpec) -> Result<PlotData> {
    spec.validate(table)?;
    match spec {
        ChartSpec::Scatter { x, y } => scatter(table, x, y),
        ChartSpec::Line { x, y } => line(table, x, y),
        ChartSpec::Histogram { column } => histogram(table, column),
        ChartSpec::Box { column } => box_plot(table, column),
        ChartSpec::Count { column } => counts(table, column),
        ChartSpec::Heatmap => heatmap(table),
    }
}

fn scatter(table: &Table, x: &str, y: &str) -> Result<PlotData> {
    let title = format!("{y} vs {x}");
    if table.numeric_columns().len() < 2 {
        return Ok(placeholder(title, "Scatter plots need at least two numeric columns"));
    }
    let xs = table.numeric_values(x)?;
    let ys = table.numeric_values(y)?;
    let points: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();
    if points.is_empty() {
        return Ok(placeholder(title, "No rows with both values present"));
    }
    Ok(PlotData::Scatter {
        title,
        x_label: x.to_string(),
        y_label: y.to_string(),
        points,
    })
}

fn line(table: &Table, x: &str, y: &str) -> Result<PlotData> {
    let title = format!("{y} over {x}");
    let ys = table.numeric_values(y)?;
    let (points, x_ticks) = if table.column_kind(x)? == ColumnKind::Numeric {
        let xs = table.numeric_values(x)?;
        let points: Vec<(f64, f64)> = xs
            .into_iter()
            .zip(ys)
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect();
        (points, None)
    } else {
        let labels = table.display_values(x)?;
        let points: Vec<(f64, f64)> = labels
            .iter()
            .zip(ys)
            .enumerate()
            .filter_map(|(i, (label, v))| {
                label.as_ref()?;
                Some((i as f64, v?))
            })
            .collect();
        let ticks = labels.into_iter().map(|l| l.unwrap_or_default()).collect();
        (points, Some(ticks))
    };
    if points.is_empty() {
        return Ok(placeholder(title, "No rows with both values present"));
    }
    Ok(PlotData::Line {
        title,
        x_label: x.to_string(),
        y_label: y.to_string(),
        points,
        x_ticks,
    })
}

fn histogram(table: &Table, column: &str) -> Result<PlotData> {
    let title = format!("Distribution of {column}");
    let mut values = finite_values(table, column)?;
    if values.is_empty() {
        return Ok(placeholder(title, format!("Column '{column}' has no finite values")));
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let (bins, density) = bins_with_density(&values);
    Ok(PlotData::Histogram {
        title,
        column: column.to_string(),
        bins,
        density,
    })
}

/// Present values of a numeric column with infinities dropped
fn finite_values(table: &Table, column: &str) -> Result<Vec<f64>> {
    Ok(table
        .numeric_values(column)?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect())
}

/// Histogram bins and the scaled density overlay for sorted, non-empty, finite values
pub fn bins_with_density(sorted: &[f64]) -> (Vec<Bin>, Density) {
    let n = sorted.len();
    let (min, max) = (sorted[0], sorted[n - 1]);
    let std = match sample_std(sorted) {
        Some(std) if std > 0.0 && max > min => std,
        _ => {
            let bin = Bin {
                start: min - 0.5,
                end: min + 0.5,
                count: n,
            };
            return (vec![bin], Density::Spike { at: min, height: n as f64 });
        }
    };

    let count = bin_count(sorted);
    let width = (max - min) / count as f64;
    let mut bins: Vec<Bin> = (0..count)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: if i + 1 == count { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for &v in sorted {
        let idx = (((v - min) / width) as usize).min(count - 1);
        bins[idx].count += 1;
    }

    (bins, Density::Curve(kde_curve(sorted, std, n as f64 * width)))
}

/// Number of bins: the narrower of Freedman-Diaconis and Sturges widths
pub fn bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len();
    if n < 2 {
        return 1;
    }
    let range = sorted[n - 1] - sorted[0];
    if range <= 0.0 {
        return 1;
    }
    let sturges = range / ((n as f64).log2() + 1.0);
    let iqr = match (quantile_sorted(sorted, 0.75), quantile_sorted(sorted, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let fd = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };
    ((range / width).ceil() as usize).clamp(1, MAX_BINS)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    Some(var.sqrt())
}

/// Gaussian KDE with Scott's bandwidth, multiplied by `scale`
fn kde_curve(values: &[f64], std: f64, scale: f64) -> Vec<(f64, f64)> {
    let n = values.len() as f64;
    let bw = std * n.powf(-0.2);
    let lo = values[0] - 3.0 * bw;
    let hi = values[values.len() - 1] + 3.0 * bw;
    let step = (hi - lo) / (KDE_POINTS - 1) as f64;
    let norm = 1.0 / (n * bw * (2.0 * PI).sqrt());
    (0..KDE_POINTS)
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm * scale)
        })
        .collect()
}

fn box_plot(table: &Table, column: &str) -> Result<PlotData> {
    let title = format!("Box Plot of {column}");
    let mut values = finite_values(table, column)?;
    values.sort_by(|a, b| a.total_cmp(b));
    match box_stats(&values) {
        Some(stats) => Ok(PlotData::Box {
            title,
            column: column.to_string(),
            stats,
        }),
        None => Ok(placeholder(title, format!("Column '{column}' has no finite values"))),
    }
}

/// Quartiles and 1.5×IQR whiskers over sorted values
pub fn box_stats(sorted: &[f64]) -> Option<BoxStats> {
    let q1 = quantile_sorted(sorted, 0.25)?;
    let median = quantile_sorted(sorted, 0.5)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();
    Some(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

fn counts(table: &Table, column: &str) -> Result<PlotData> {
    let title = format!("Count of {column}");
    let categories = if table.column_kind(column)? == ColumnKind::Numeric {
        numeric_counts(table, column)?
    } else {
        first_seen_counts(table.display_values(column)?)
    };
    if categories.is_empty() {
        return Ok(placeholder(title, format!("Column '{column}' has no values")));
    }
    let rotate_labels = categories.len() > ROTATE_AFTER_CATEGORIES
        || categories.iter().any(|(label, _)| label.chars().count() > ROTATE_LABEL_LEN);
    Ok(PlotData::Counts {
        title,
        column: column.to_string(),
        categories,
        rotate_labels,
    })
}

fn first_seen_counts(values: Vec<Option<String>>) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, usize)> = Vec::new();
    for value in values.into_iter().flatten() {
        match index.get(&value) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(value.clone(), out.len());
                out.push((value, 1));
            }
        }
    }
    out
}

fn numeric_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    let labels = table.display_values(column)?;
    let values = table.numeric_values(column)?;
    let mut keyed: Vec<(f64, String)> = values
        .into_iter()
        .zip(labels)
        .filter_map(|(v, l)| Some((v?, l?)))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut out: Vec<(String, usize)> = Vec::new();
    for (_, label) in keyed {
        match out.last_mut() {
            Some((last, n)) if *last == label => *n += 1,
            _ => out.push((label, 1)),
        }
    }
    Ok(out)
}

fn heatmap(table: &Table) -> Result<PlotData> {
    let title = "Correlation Heatmap".to_string();
    let matrix = correlation_matrix(table)?;
    if matrix.len() < 2 {
        return Ok(placeholder(title, "Correlation needs at least two numeric columns"));
    }
    Ok(PlotData::Heatmap { title, matrix })
}
