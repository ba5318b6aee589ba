pub mod data;
pub mod render;
pub mod spec;

pub use data::{plot_data, PlotData};
pub use render::{
    ChartRenderer, ChartStyle, PlottersRenderer, RenderedChart, DOWNLOAD_FILE_NAME, DOWNLOAD_MIME,
};
pub use spec::{ChartKind, ChartRequest, ChartSpec, ColumnRole};
