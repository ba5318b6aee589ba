use polars::prelude::*;
use std::sync::Arc;

use crate::core::types::{ColumnKind, SourceFormat};
use crate::error::{Result, VizError};

/// Number of rows shown in the data preview by default
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Immutable, column-aligned dataset loaded from one uploaded file.
///
/// Cloning is cheap: the underlying frame is shared.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    format: SourceFormat,
    df: Arc<DataFrame>,
}

/// Classify a polars dtype. Booleans are deliberately not numeric.
pub fn kind_of(dtype: &DataType) -> ColumnKind {
    if dtype.is_integer() || dtype.is_float() {
        ColumnKind::Numeric
    } else if dtype.is_string() {
        ColumnKind::Text
    } else if dtype.is_temporal() {
        ColumnKind::Temporal
    } else if dtype.is_bool() {
        ColumnKind::Boolean
    } else {
        ColumnKind::Other
    }
}

impl Table {
    pub fn new(name: impl Into<String>, format: SourceFormat, df: DataFrame) -> Self {
        Self {
            name: name.into(),
            format,
            df: Arc::new(df),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn dataframe(&self) -> &DataFrame {
        self.df.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Names of integer and float columns, in table order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| kind_of(c.dtype()) == ColumnKind::Numeric)
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.df.column(name).map_err(|_| VizError::ColumnNotFound {
            column: name.to_string(),
        })
    }

    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(kind_of(self.column(name)?.dtype()))
    }

    /// Values of a numeric column as f64; nulls and NaN come back as `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if kind_of(column.dtype()) != ColumnKind::Numeric {
            return Err(VizError::InvalidSelection {
                chart: "numeric".to_string(),
                reason: format!("column '{name}' is not numeric"),
            });
        }
        let casted = column.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// Values of any column rendered as display strings; nulls are `None`.
    pub fn display_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        let mut out = Vec::with_capacity(column.len());
        for i in 0..column.len() {
            let value = match column.get(i)? {
                AnyValue::Null => None,
                AnyValue::String(s) => Some(s.to_string()),
                v => Some(v.str_value().to_string()),
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Missing values in one column. Float NaN counts as missing.
    pub fn missing_in(&self, name: &str) -> Result<usize> {
        let column = self.column(name)?;
        if column.dtype().is_float() {
            Ok(self.numeric_values(name)?.iter().filter(|v| v.is_none()).count())
        } else {
            Ok(column.null_count())
        }
    }

    /// First `rows` rows of the table
    pub fn preview(&self, rows: usize) -> DataFrame {
        self.df.head(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        let df = df!(
            "city" => ["Oslo", "Lima", "Pune"],
            "temp" => [Some(3.5), None, Some(f64::NAN)],
            "visits" => [10i64, 20, 30],
            "open" => [true, false, true],
        )
        .unwrap();
        Table::new("sample.csv", SourceFormat::Csv, df)
    }

    #[test]
    fn test_shape_and_names() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.column_names(), vec!["city", "temp", "visits", "open"]);
    }

    #[test]
    fn test_numeric_columns_exclude_booleans() {
        let table = sample();
        assert_eq!(table.numeric_columns(), vec!["temp", "visits"]);
        assert_eq!(table.column_kind("open").unwrap(), ColumnKind::Boolean);
        assert_eq!(table.column_kind("city").unwrap(), ColumnKind::Text);
    }

    #[test]
    fn test_numeric_values_treat_nan_as_missing() {
        let table = sample();
        assert_eq!(table.numeric_values("temp").unwrap(), vec![Some(3.5), None, None]);
        assert_eq!(table.missing_in("temp").unwrap(), 2);
        assert_eq!(table.missing_in("visits").unwrap(), 0);
    }

    #[test]
    fn test_numeric_values_reject_text() {
        let table = sample();
        assert!(table.numeric_values("city").is_err());
        assert!(matches!(
            table.numeric_values("nope"),
            Err(VizError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_preview_is_capped() {
        let table = sample();
        assert_eq!(table.preview(2).height(), 2);
        assert_eq!(table.preview(DEFAULT_PREVIEW_ROWS).height(), 3);
    }
}
