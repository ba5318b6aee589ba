//! Rasterizes [`PlotData`] with plotters into an in-memory RGB buffer.
//!
//! The renderer ships its own DejaVu faces through plotters' `ab_glyph`
//! backend so output does not depend on fonts installed on the host.
use lazy_static::lazy_static;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle, FontTransform};
use std::io::Cursor;
use std::ops::Range;
use tracing::debug;

use crate::analysis::correlation::CorrelationMatrix;
use crate::chart::data::{Bin, BoxStats, Density, PlotData};
use crate::error::{Result, VizError};
use crate::theme::{FontChoice, Rgb, Theme};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 500;

/// File name and MIME type offered for chart downloads
pub const DOWNLOAD_FILE_NAME: &str = "chart.png";
pub const DOWNLOAD_MIME: &str = "image/png";

/// Low end of the heatmap color scale
pub const HEATMAP_LOW: Rgb = Rgb(0xF7, 0xFC, 0xF5);
/// High end of the heatmap color scale
pub const HEATMAP_HIGH: Rgb = Rgb(0x00, 0x44, 0x1B);
const HEATMAP_UNDEFINED: Rgb = Rgb(0xBD, 0xBD, 0xBD);

const BUNDLED_FONTS: [(FontChoice, &[u8]); 3] = [
    (FontChoice::SansSerif, include_bytes!("../../assets/fonts/DejaVuSans.ttf")),
    (FontChoice::Serif, include_bytes!("../../assets/fonts/DejaVuSerif.ttf")),
    (FontChoice::Monospace, include_bytes!("../../assets/fonts/DejaVuSansMono.ttf")),
];

lazy_static! {
    static ref FONTS_REGISTERED: std::result::Result<(), String> = register_bundled_fonts();
}

fn register_bundled_fonts() -> std::result::Result<(), String> {
    for (font, bytes) in BUNDLED_FONTS {
        register_font(font.family(), FontStyle::Normal, bytes).map_err(|_| font.family().to_string())?;
    }
    Ok(())
}

fn ensure_fonts() -> Result<()> {
    (*FONTS_REGISTERED)
        .clone()
        .map_err(|family| VizError::Font { family })
}

/// Size, colors and font of a rendered chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub text: Rgb,
    pub primary: Rgb,
    pub font: FontChoice,
}

impl Default for ChartStyle {
    fn default() -> Self {
        let theme = Theme::default();
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: theme.background,
            text: theme.text,
            primary: theme.primary,
            font: theme.font,
        }
    }
}

/// A rendered chart as packed RGB8 pixels.
///
/// Rendered once; the same value backs on-screen display and the PNG download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderedChart {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone()).ok_or_else(|| {
            VizError::Render(format!(
                "pixel buffer of {} bytes does not fit {}x{}",
                self.rgb.len(),
                self.width,
                self.height
            ))
        })?;
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// True when every pixel has the same color
    pub fn is_blank(&self) -> bool {
        match self.rgb.get(0..3) {
            Some(first) => self.rgb.chunks_exact(3).all(|px| px == first),
            None => true,
        }
    }
}

/// Turns plot geometry into pixels
pub trait ChartRenderer {
    fn render(&self, data: &PlotData, style: &ChartStyle) -> Result<RenderedChart>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, data: &PlotData, style: &ChartStyle) -> Result<RenderedChart> {
        ensure_fonts()?;
        if style.width == 0 || style.height == 0 {
            return Err(VizError::Render(format!(
                "chart size {}x{} has no area",
                style.width, style.height
            )));
        }
        debug!(title = data.title(), width = style.width, height = style.height, "rendering chart");
        let mut rgb = vec![0u8; style.width as usize * style.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (style.width, style.height)).into_drawing_area();
            draw_plot(&root, data, style).map_err(|e| VizError::Render(e.to_string()))?;
            root.present().map_err(|e| VizError::Render(e.to_string()))?;
        }
        Ok(RenderedChart {
            width: style.width,
            height: style.height,
            rgb,
        })
    }
}

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn color(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn font(style: &ChartStyle, size: i32) -> TextStyle<'static> {
    (style.font.family(), size).into_font().color(&color(style.text))
}

fn draw_plot<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &PlotData, style: &ChartStyle) -> DrawResult<DB> {
    root.fill(&color(style.background))?;
    match data {
        PlotData::Scatter { title, x_label, y_label, points } => {
            draw_scatter(root, title, x_label, y_label, points, style)
        }
        PlotData::Line { title, x_label, y_label, points, x_ticks } => {
            draw_line(root, title, x_label, y_label, points, x_ticks.as_deref(), style)
        }
        PlotData::Histogram { title, column, bins, density } => draw_histogram(root, title, column, bins, density, style),
        PlotData::Box { title, column, stats } => draw_box(root, title, column, stats, style),
        PlotData::Counts { title, column, categories, rotate_labels } => {
            draw_counts(root, title, column, categories, *rotate_labels, style)
        }
        PlotData::Heatmap { title, matrix } => draw_heatmap(root, title, matrix, style),
        PlotData::Placeholder { title, message } => draw_placeholder(root, title, message, style),
    }
}

/// Data range widened by 5% on each side; a single value gets a unit window
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi <= lo {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn xy_chart<'a, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
    style: &ChartStyle,
) -> std::result::Result<
    ChartContext<'a, DB, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>,
    DrawingAreaErrorKind<DB::ErrorType>,
> {
    ChartBuilder::on(root)
        .caption(title, font(style, 20))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x, y)
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    style: &ChartStyle,
) -> DrawResult<DB> {
    let x = padded_range(points.iter().map(|p| p.0));
    let y = padded_range(points.iter().map(|p| p.1));
    let mut chart = xy_chart(root, title, x, y, style)?;
    let text = color(style.text);
    chart
        .configure_mesh()
        .axis_style(text.stroke_width(1))
        .bold_line_style(text.mix(0.12).stroke_width(1))
        .light_line_style(text.mix(0.04).stroke_width(1))
        .label_style(font(style, 12))
        .axis_desc_style(font(style, 14))
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;
    let primary = color(style.primary);
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, primary.filled())))?;
    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    x_ticks: Option<&[String]>,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let x = padded_range(points.iter().map(|p| p.0));
    let y = padded_range(points.iter().map(|p| p.1));
    let mut chart = xy_chart(root, title, x, y, style)?;
    let text = color(style.text);
    // positions between rows get no label
    let tick_label = |v: &f64| -> String {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        x_ticks
            .and_then(|ticks| ticks.get(idx as usize))
            .cloned()
            .unwrap_or_default()
    };
    let mut mesh = chart.configure_mesh();
    mesh.axis_style(text.stroke_width(1))
        .bold_line_style(text.mix(0.12).stroke_width(1))
        .light_line_style(text.mix(0.04).stroke_width(1))
        .label_style(font(style, 12))
        .axis_desc_style(font(style, 14))
        .x_desc(x_label)
        .y_desc(y_label);
    if let Some(ticks) = x_ticks {
        mesh.x_labels(ticks.len().clamp(2, 8)).x_label_formatter(&tick_label);
    }
    mesh.draw()?;
    let primary = color(style.primary);
    chart.draw_series(LineSeries::new(points.iter().copied(), primary.stroke_width(2)))?;
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    column: &str,
    bins: &[Bin],
    density: &Density,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let x = padded_range(bins.iter().flat_map(|b| [b.start, b.end]));
    let density_peak = match density {
        Density::Curve(points) => points.iter().map(|p| p.1).fold(0.0, f64::max),
        Density::Spike { height, .. } => *height,
    };
    let count_peak = bins.iter().map(|b| b.count as f64).fold(0.0, f64::max);
    let y_top = count_peak.max(density_peak).max(1.0) * 1.1;
    let x = match density {
        Density::Curve(points) => {
            let lo = points.first().map_or(x.start, |p| p.0.min(x.start));
            let hi = points.last().map_or(x.end, |p| p.0.max(x.end));
            lo..hi
        }
        Density::Spike { .. } => x,
    };
    let mut chart = xy_chart(root, title, x, 0.0..y_top, style)?;
    let text = color(style.text);
    chart
        .configure_mesh()
        .axis_style(text.stroke_width(1))
        .bold_line_style(text.mix(0.12).stroke_width(1))
        .light_line_style(text.mix(0.04).stroke_width(1))
        .label_style(font(style, 12))
        .axis_desc_style(font(style, 14))
        .x_desc(column)
        .y_desc("Count")
        .draw()?;

    let primary = color(style.primary);
    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], primary.mix(0.55).filled())),
    )?;
    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], primary.stroke_width(1))),
    )?;
    match density {
        Density::Curve(points) => {
            chart.draw_series(LineSeries::new(points.iter().copied(), primary.stroke_width(2)))?;
        }
        Density::Spike { at, height } => {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(*at, 0.0), (*at, *height)],
                primary.stroke_width(2),
            )))?;
        }
    }
    Ok(())
}

fn draw_box<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    column: &str,
    stats: &BoxStats,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let y = padded_range(
        [stats.lower_whisker, stats.upper_whisker, stats.q1, stats.q3]
            .into_iter()
            .chain(stats.outliers.iter().copied()),
    );
    let mut chart = xy_chart(root, title, 0.0..2.0, y, style)?;
    let text = color(style.text);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .axis_style(text.stroke_width(1))
        .bold_line_style(text.mix(0.12).stroke_width(1))
        .light_line_style(text.mix(0.04).stroke_width(1))
        .label_style(font(style, 12))
        .axis_desc_style(font(style, 14))
        .y_desc(column)
        .draw()?;

    let primary = color(style.primary);
    let (left, right, mid) = (0.6, 1.4, 1.0);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        primary.mix(0.55).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        text.stroke_width(1),
    )))?;
    let segments = [
        vec![(left, stats.median), (right, stats.median)],
        vec![(mid, stats.q3), (mid, stats.upper_whisker)],
        vec![(mid, stats.q1), (mid, stats.lower_whisker)],
        vec![(0.8, stats.upper_whisker), (1.2, stats.upper_whisker)],
        vec![(0.8, stats.lower_whisker), (1.2, stats.lower_whisker)],
    ];
    chart.draw_series(segments.into_iter().map(|s| PathElement::new(s, text.stroke_width(2))))?;
    chart.draw_series(stats.outliers.iter().map(|&v| Circle::new((mid, v), 3, text.stroke_width(1))))?;
    Ok(())
}

fn draw_counts<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    column: &str,
    categories: &[(String, usize)],
    rotate_labels: bool,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let n = categories.len().max(1);
    let peak = categories.iter().map(|c| c.1).max().unwrap_or(0).max(1) as f64;
    let label_area = if rotate_labels { 110 } else { 45 };
    let mut chart = ChartBuilder::on(root)
        .caption(title, font(style, 20))
        .margin(20)
        .x_label_area_size(label_area)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..peak * 1.1)?;

    let text = color(style.text);
    let x_style = if rotate_labels {
        (style.font.family(), 12)
            .into_font()
            .transform(FontTransform::Rotate90)
            .color(&text)
    } else {
        font(style, 12)
    };
    let label_for = |v: &SegmentValue<usize>| -> String {
        match v {
            SegmentValue::CenterOf(idx) => categories.get(*idx).map(|c| c.0.clone()).unwrap_or_default(),
            _ => String::new(),
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .x_label_style(x_style)
        .axis_style(text.stroke_width(1))
        .bold_line_style(text.mix(0.12).stroke_width(1))
        .light_line_style(text.mix(0.04).stroke_width(1))
        .label_style(font(style, 12))
        .axis_desc_style(font(style, 14))
        .x_desc(column)
        .y_desc("Count")
        .draw()?;

    let primary = color(style.primary);
    let background = color(style.background);
    chart.draw_series(categories.iter().enumerate().map(|(idx, (_, count))| {
        Rectangle::new(
            [(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), *count as f64)],
            primary.filled(),
        )
    }))?;
    chart.draw_series(categories.iter().enumerate().map(|(idx, (_, count))| {
        Rectangle::new(
            [(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), *count as f64)],
            background.stroke_width(2),
        )
    }))?;
    Ok(())
}

/// Position of `value` on the heatmap color scale
pub fn heatmap_color(value: Option<f64>, range: (f64, f64)) -> Rgb {
    let Some(v) = value else { return HEATMAP_UNDEFINED };
    let (lo, hi) = range;
    let t = if hi > lo { (v - lo) / (hi - lo) } else { 1.0 };
    HEATMAP_LOW.lerp(HEATMAP_HIGH, t)
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    matrix: &CorrelationMatrix,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let n = matrix.len().max(1);
    let mut chart = ChartBuilder::on(root)
        .caption(title, font(style, 20))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(100)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

    let text = color(style.text);
    let x_label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(idx) => matrix.columns.get(*idx).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    // rows run top to bottom, so row i sits at y = n - 1 - i
    let y_label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(idx) if *idx < n => matrix.columns.get(n - 1 - idx).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .axis_style(text.stroke_width(1))
        .label_style(font(style, 12))
        .draw()?;

    let range = matrix.range().unwrap_or((0.0, 1.0));
    let mut cells = Vec::with_capacity(n * n);
    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            cells.push((i, j, matrix.get(i, j)));
        }
    }
    chart.draw_series(cells.iter().map(|&(i, j, v)| {
        let row = n - 1 - i;
        Rectangle::new(
            [
                (SegmentValue::Exact(j), SegmentValue::Exact(row)),
                (SegmentValue::Exact(j + 1), SegmentValue::Exact(row + 1)),
            ],
            color(heatmap_color(v, range)).filled(),
        )
    }))?;
    chart.draw_series(cells.iter().map(|&(i, j, v)| {
        let fill = heatmap_color(v, range);
        let ink = if fill.luminance() < 0.5 { Rgb(255, 255, 255) } else { style.text };
        let label = v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        Text::new(
            label,
            (SegmentValue::CenterOf(j), SegmentValue::CenterOf(n - 1 - i)),
            (style.font.family(), 13)
                .into_font()
                .color(&color(ink))
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    message: &str,
    style: &ChartStyle,
) -> DrawResult<DB> {
    let (w, h) = root.dim_in_pixel();
    let centered = Pos::new(HPos::Center, VPos::Center);
    root.draw(&Text::new(
        title.to_string(),
        (w as i32 / 2, 40),
        font(style, 20).pos(centered),
    ))?;
    root.draw(&Text::new(
        message.to_string(),
        (w as i32 / 2, h as i32 / 2),
        font(style, 16).pos(centered),
    ))?;
    Ok(())
}
