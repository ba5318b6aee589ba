pub mod analysis;
pub mod chart;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod services;
pub mod theme;

// Re-export commonly used types
pub use chart::{ChartKind, ChartRenderer, ChartRequest, ChartSpec, ChartStyle, PlotData, PlottersRenderer, RenderedChart};
pub use config::AppConfig;
pub use core::{CsvImportOptions, FileIdentity, SourceFormat, Table};
pub use error::{Result, VizError};
pub use pipeline::{render_page, render_request, PageState, Session};
pub use services::DataService;
pub use theme::Theme;
