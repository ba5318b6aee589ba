//! Chart kinds, the column roles each kind needs, and validated chart specs
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::core::{ColumnKind, Table};
use crate::error::{Result, VizError};

/// The six chart kinds, in menu order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ChartKind {
    #[strum(to_string = "Scatter Plot", serialize = "scatter")]
    Scatter,
    #[strum(to_string = "Line Chart", serialize = "line")]
    Line,
    #[strum(to_string = "Histogram", serialize = "histogram", serialize = "hist")]
    Histogram,
    #[strum(to_string = "Box Plot", serialize = "box")]
    Box,
    #[strum(to_string = "Correlation Heatmap", serialize = "heatmap")]
    Heatmap,
    #[strum(to_string = "Count Plot", serialize = "count")]
    Count,
}

/// Which columns a selection slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ColumnRole {
    #[strum(to_string = "X-axis")]
    X { numeric: bool },
    #[strum(to_string = "Y-axis")]
    Y,
    #[strum(to_string = "Select Column")]
    Single { numeric: bool },
}

impl ColumnRole {
    pub fn numeric_only(&self) -> bool {
        match self {
            ColumnRole::X { numeric } | ColumnRole::Single { numeric } => *numeric,
            ColumnRole::Y => true,
        }
    }
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::Histogram,
        ChartKind::Box,
        ChartKind::Heatmap,
        ChartKind::Count,
    ];

    /// Short name accepted on the command line
    pub fn key(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Count => "count",
        }
    }

    /// Selection slots for this kind, in the order they are asked for
    pub fn roles(&self) -> Vec<ColumnRole> {
        match self {
            ChartKind::Scatter => vec![ColumnRole::X { numeric: true }, ColumnRole::Y],
            ChartKind::Line => vec![ColumnRole::X { numeric: false }, ColumnRole::Y],
            ChartKind::Histogram | ChartKind::Box => vec![ColumnRole::Single { numeric: true }],
            ChartKind::Count => vec![ColumnRole::Single { numeric: false }],
            ChartKind::Heatmap => Vec::new(),
        }
    }

    /// Columns a front end should offer for `role`
    pub fn column_options(table: &Table, role: ColumnRole) -> Vec<String> {
        if role.numeric_only() {
            table.numeric_columns()
        } else {
            table.column_names()
        }
    }

    /// Whether the table has the columns this kind needs
    pub fn is_available(&self, table: &Table) -> bool {
        let numeric = table.numeric_columns().len();
        match self {
            ChartKind::Scatter | ChartKind::Heatmap => numeric >= 2,
            ChartKind::Line | ChartKind::Histogram | ChartKind::Box => numeric >= 1,
            ChartKind::Count => table.column_count() >= 1,
        }
    }

    /// Kinds offerable for `table`, in menu order
    pub fn available(table: &Table) -> Vec<ChartKind> {
        ChartKind::iter().filter(|k| k.is_available(table)).collect()
    }
}

/// A chart kind with the columns it was asked to plot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartSpec {
    Scatter { x: String, y: String },
    Line { x: String, y: String },
    Histogram { column: String },
    Box { column: String },
    Heatmap,
    Count { column: String },
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Scatter { .. } => ChartKind::Scatter,
            ChartSpec::Line { .. } => ChartKind::Line,
            ChartSpec::Histogram { .. } => ChartKind::Histogram,
            ChartSpec::Box { .. } => ChartKind::Box,
            ChartSpec::Heatmap => ChartKind::Heatmap,
            ChartSpec::Count { .. } => ChartKind::Count,
        }
    }

    /// Selected columns paired with their roles
    pub fn selections(&self) -> Vec<(ColumnRole, &str)> {
        let roles = self.kind().roles();
        let columns: Vec<&str> = match self {
            ChartSpec::Scatter { x, y } | ChartSpec::Line { x, y } => vec![x.as_str(), y.as_str()],
            ChartSpec::Histogram { column } | ChartSpec::Box { column } | ChartSpec::Count { column } => {
                vec![column.as_str()]
            }
            ChartSpec::Heatmap => Vec::new(),
        };
        roles.into_iter().zip(columns).collect()
    }

    /// Build a spec from loose column arguments, in role order
    pub fn from_columns(kind: ChartKind, columns: &[&str]) -> Result<ChartSpec> {
        let needed = kind.roles().len();
        if columns.len() < needed {
            return Err(VizError::InvalidSelection {
                chart: kind.to_string(),
                reason: format!("expected {needed} column(s), got {}", columns.len()),
            });
        }
        let col = |i: usize| columns[i].to_string();
        Ok(match kind {
            ChartKind::Scatter => ChartSpec::Scatter { x: col(0), y: col(1) },
            ChartKind::Line => ChartSpec::Line { x: col(0), y: col(1) },
            ChartKind::Histogram => ChartSpec::Histogram { column: col(0) },
            ChartKind::Box => ChartSpec::Box { column: col(0) },
            ChartKind::Count => ChartSpec::Count { column: col(0) },
            ChartKind::Heatmap => ChartSpec::Heatmap,
        })
    }

    /// First offered column for every role, like an untouched select box.
    /// `None` when some role has nothing to offer.
    pub fn default_for(kind: ChartKind, table: &Table) -> Option<ChartSpec> {
        let mut picks = Vec::new();
        for role in kind.roles() {
            picks.push(ChartKind::column_options(table, role).into_iter().next()?);
        }
        let refs: Vec<&str> = picks.iter().map(String::as_str).collect();
        ChartSpec::from_columns(kind, &refs).ok()
    }

    /// Check every selected column exists and has the kind its role needs
    pub fn validate(&self, table: &Table) -> Result<()> {
        for (role, column) in self.selections() {
            let kind = table.column_kind(column)?;
            if role.numeric_only() && kind != ColumnKind::Numeric {
                return Err(VizError::InvalidSelection {
                    chart: self.kind().to_string(),
                    reason: format!("{role} column '{column}' is {kind}, expected numeric"),
                });
            }
        }
        Ok(())
    }
}

/// A loosely specified chart choice, as collected by a front end.
///
/// Unset fields fall back to the first kind the table supports and the
/// first offered column for each role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartRequest {
    pub kind: Option<ChartKind>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub column: Option<String>,
}

impl ChartRequest {
    /// Fill in the gaps against `table`. Fails when no kind is available or a
    /// role has nothing to offer; the spec itself is validated at plot time.
    pub fn resolve(&self, table: &Table) -> Result<ChartSpec> {
        let kind = match self.kind {
            Some(kind) => kind,
            None => ChartKind::available(table).into_iter().next().ok_or_else(|| {
                VizError::InvalidSelection {
                    chart: "any".to_string(),
                    reason: format!("{} has no columns to chart", table.name()),
                }
            })?,
        };
        let mut columns = Vec::new();
        for role in kind.roles() {
            let explicit = match role {
                ColumnRole::X { .. } => self.x.clone(),
                ColumnRole::Y => self.y.clone(),
                ColumnRole::Single { .. } => self.column.clone(),
            };
            let picked = explicit
                .or_else(|| ChartKind::column_options(table, role).into_iter().next())
                .ok_or_else(|| VizError::InvalidSelection {
                    chart: kind.to_string(),
                    reason: format!("needs a {role} column but none is available"),
                })?;
            columns.push(picked);
        }
        let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
        ChartSpec::from_columns(kind, &refs)
    }
}
