use thiserror::Error;

/// Errors surfaced by the loading, charting and export pipeline.
#[derive(Error, Debug)]
pub enum VizError {
    #[error("Unsupported file type for '{name}': expected a .csv or .xlsx file")]
    UnsupportedFormat { name: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse '{name}': {reason}")]
    Parse { name: String, reason: String },
    #[error("Data frame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Invalid selection for {chart} chart: {reason}")]
    InvalidSelection { chart: String, reason: String },
    #[error("Table cache unavailable: {0}")]
    Cache(String),
    #[error("Chart rendering failed: {0}")]
    Render(String),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to register bundled font '{family}'")]
    Font { family: String },
}

pub type Result<T> = std::result::Result<T, VizError>;
