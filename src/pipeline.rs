//! One interaction's worth of output, recomputed from a cached table.
//!
//! Every panel carries its own `Result` so a failing chart never hides the
//! preview or the statistics.
use polars::prelude::DataFrame;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::insight::{insights, InsightReport};
use crate::analysis::summary::{column_info, describe, overview, ColumnInfo, DescribeRow, Overview};
use crate::chart::data::{plot_data, PlotData};
use crate::chart::render::{
    ChartRenderer, ChartStyle, PlottersRenderer, RenderedChart, DOWNLOAD_FILE_NAME, DOWNLOAD_MIME,
};
use crate::chart::spec::{ChartRequest, ChartSpec};
use crate::config::AppConfig;
use crate::core::{Table, DEFAULT_PREVIEW_ROWS};
use crate::error::Result;
use crate::services::DataService;
use crate::theme::Theme;

/// A rendered chart together with what produced it
#[derive(Debug, Clone)]
pub struct ChartPanel {
    pub spec: ChartSpec,
    pub plot: PlotData,
    pub image: RenderedChart,
}

/// PNG bytes ready to be offered as a file download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ChartPanel {
    pub fn download(&self) -> Result<Download> {
        Ok(Download {
            file_name: DOWNLOAD_FILE_NAME,
            mime: DOWNLOAD_MIME,
            bytes: self.image.to_png()?,
        })
    }
}

/// Everything shown for one table and one chart selection
#[derive(Debug)]
pub struct PageState {
    pub table_name: String,
    pub preview: Result<DataFrame>,
    pub overview: Result<Overview>,
    pub column_info: Result<Vec<ColumnInfo>>,
    pub describe: Result<Vec<DescribeRow>>,
    pub chart: Result<ChartPanel>,
    /// `Ok(None)` when the table has fewer than two numeric columns
    pub insights: Result<Option<InsightReport>>,
}

fn render_chart(table: &Table, spec: &ChartSpec, renderer: &dyn ChartRenderer, style: &ChartStyle) -> Result<ChartPanel> {
    let plot = plot_data(table, spec)?;
    let image = renderer.render(&plot, style)?;
    Ok(ChartPanel {
        spec: spec.clone(),
        plot,
        image,
    })
}

/// Compute every panel for `table` and `spec`
pub fn render_page(
    table: &Table,
    spec: &ChartSpec,
    renderer: &dyn ChartRenderer,
    style: &ChartStyle,
    preview_rows: usize,
) -> PageState {
    debug!(table = table.name(), chart = %spec.kind(), "rendering page");
    page_with_chart(table, render_chart(table, spec, renderer, style), preview_rows)
}

/// Like [`render_page`], resolving a loose request first. A request that
/// cannot be resolved only fails the chart panel.
pub fn render_request(
    table: &Table,
    request: &ChartRequest,
    renderer: &dyn ChartRenderer,
    style: &ChartStyle,
    preview_rows: usize,
) -> PageState {
    debug!(table = table.name(), ?request, "rendering page");
    let chart = request
        .resolve(table)
        .and_then(|spec| render_chart(table, &spec, renderer, style));
    page_with_chart(table, chart, preview_rows)
}

fn page_with_chart(table: &Table, chart: Result<ChartPanel>, preview_rows: usize) -> PageState {
    if let Err(e) = &chart {
        warn!("Chart panel failed for {}: {e}", table.name());
    }
    PageState {
        table_name: table.name().to_string(),
        preview: Ok(table.preview(preview_rows)),
        overview: overview(table),
        column_info: column_info(table),
        describe: describe(table),
        chart,
        insights: insights(table),
    }
}

/// A single user's exploration session: one cache, one theme, one renderer.
///
/// Interactions run one at a time and each recomputes the full page, so the
/// latest call always wins.
pub struct Session<R: ChartRenderer = PlottersRenderer> {
    data: DataService,
    style: ChartStyle,
    preview_rows: usize,
    renderer: R,
}

impl Session<PlottersRenderer> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_renderer(config, PlottersRenderer)
    }
}

impl<R: ChartRenderer> Session<R> {
    pub fn with_renderer(config: &AppConfig, renderer: R) -> Self {
        let theme = Theme::from_settings(&config.theme);
        Self {
            data: DataService::new(),
            style: theme.chart_style(&config.chart),
            preview_rows: config.chart.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
            renderer,
        }
    }

    pub fn data_service(&self) -> &DataService {
        &self.data
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn set_preview_rows(&mut self, rows: usize) {
        self.preview_rows = rows;
    }

    pub fn load_path(&self, path: &Path) -> Result<Arc<Table>> {
        self.data.load_path(path)
    }

    pub fn load_upload(&self, name: &str, bytes: Vec<u8>) -> Result<Arc<Table>> {
        self.data.load_upload(name, bytes)
    }

    pub fn render(&self, table: &Table, spec: &ChartSpec) -> PageState {
        render_page(table, spec, &self.renderer, &self.style, self.preview_rows)
    }

    pub fn render_request(&self, table: &Table, request: &ChartRequest) -> PageState {
        render_request(table, request, &self.renderer, &self.style, self.preview_rows)
    }
}
