//! Full pipeline runs over the bundled fixtures

use pretty_assertions::assert_eq;
use smartviz::analysis::summary::{column_missing, missing_count};
use smartviz::chart::data::plot_data;
use smartviz::core::ColumnKind;
use smartviz::{
    AppConfig, ChartKind, ChartRenderer, ChartRequest, ChartSpec, ChartStyle, PlotData, Session, VizError,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

#[test]
fn test_sales_overview_and_line_chart() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("sales.csv")).unwrap();
    assert_eq!(table.column_names(), vec!["date", "revenue", "cost"]);
    assert_eq!(table.column_kind("date").unwrap(), ColumnKind::Temporal);

    let spec = ChartSpec::Line {
        x: "date".into(),
        y: "revenue".into(),
    };
    let page = session.render(&table, &spec);

    let overview = page.overview.unwrap();
    assert_eq!(overview.rows, 100);
    assert_eq!(overview.columns, 3);
    assert_eq!(overview.missing_values, 3);

    let panel = page.chart.unwrap();
    match &panel.plot {
        PlotData::Line { points, x_ticks, .. } => {
            assert_eq!(points.len(), 97);
            let ticks = x_ticks.as_ref().unwrap();
            assert_eq!(ticks.len(), 100);
            assert_eq!(ticks[0], "2024-01-01");
        }
        other => panic!("expected a line plot, got {other:?}"),
    }
    assert!(!panel.image.is_blank());

    let report = page.insights.unwrap().unwrap();
    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].left, "revenue");
    assert_eq!(report.pairs[0].right, "cost");
}

#[test]
fn test_missing_total_matches_per_column() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("sales.csv")).unwrap();
    let per_column = column_missing(&table).unwrap();
    let total: usize = per_column.iter().map(|(_, n)| n).sum();
    assert_eq!(missing_count(&table).unwrap(), total);
    assert_eq!(per_column[1], ("revenue".to_string(), 3));
}

#[test]
fn test_reloading_same_file_hits_cache() {
    let session = Session::new(&AppConfig::default());
    let first = session.load_path(&fixture("sales.csv")).unwrap();
    let second = session.load_path(&fixture("sales.csv")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(session.data_service().parse_count(), 1);
}

#[test]
fn test_png_round_trip_has_configured_size() {
    let mut config = AppConfig::default();
    config.chart.width = Some(640);
    config.chart.height = Some(400);
    let session = Session::new(&config);
    let table = session.load_path(&fixture("sales.csv")).unwrap();
    let page = session.render(
        &table,
        &ChartSpec::Scatter {
            x: "revenue".into(),
            y: "cost".into(),
        },
    );
    let download = page.chart.unwrap().download().unwrap();
    assert_eq!(download.file_name, "chart.png");
    assert_eq!(download.mime, "image/png");

    let decoded = image::load_from_memory(&download.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (640, 400));
    let first = decoded.get_pixel(0, 0);
    assert!(decoded.pixels().any(|p| p != first), "exported chart is blank");
}

#[test]
fn test_every_kind_renders_for_sales() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("sales.csv")).unwrap();
    for kind in ChartKind::available(&table) {
        let spec = ChartSpec::default_for(kind, &table).unwrap();
        let page = session.render(&table, &spec);
        let panel = page.chart.unwrap_or_else(|e| panic!("{kind} failed: {e}"));
        assert!(!panel.image.is_blank(), "{kind} rendered blank");
    }
}

#[test]
fn test_single_numeric_column_degrades() {
    let csv = b"city,visits\nOslo,10\nLima,20\nPune,30\nOslo,15\n".to_vec();
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("cities.csv", csv).unwrap();

    assert!(!ChartKind::Scatter.is_available(&table));
    assert!(!ChartKind::Heatmap.is_available(&table));
    assert!(plot_data(&table, &ChartSpec::Heatmap).unwrap().is_placeholder());

    for spec in [
        ChartSpec::Histogram { column: "visits".into() },
        ChartSpec::Box { column: "visits".into() },
    ] {
        let page = session.render(&table, &spec);
        let panel = page.chart.unwrap();
        assert!(!panel.plot.is_placeholder());
        assert!(!panel.image.is_blank());
    }

    let page = session.render(&table, &ChartSpec::Heatmap);
    assert!(page.chart.unwrap().plot.is_placeholder());
    assert_eq!(page.insights.unwrap(), None);
}

#[test]
fn test_insights_are_unique_and_sorted() {
    let csv = b"a,b,c,d\n1,2,9,1\n2,4.1,7,3\n3,5.9,8,2\n4,8.2,3,5\n5,9.9,1,4\n6,12.1,2,6\n".to_vec();
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("four.csv", csv).unwrap();
    let report = session
        .render(&table, &ChartSpec::Heatmap)
        .insights
        .unwrap()
        .unwrap();

    assert_eq!(report.pairs.len(), 5);
    let mut seen = HashSet::new();
    for pair in &report.pairs {
        assert_ne!(pair.left, pair.right);
        let key = if pair.left < pair.right {
            (pair.left.clone(), pair.right.clone())
        } else {
            (pair.right.clone(), pair.left.clone())
        };
        assert!(seen.insert(key), "duplicate pair {pair:?}");
    }
    assert!(report.pairs.windows(2).all(|w| w[0].strength >= w[1].strength));
}

#[test]
fn test_zero_variance_histogram_renders() {
    let csv = b"flat\n5\n5\n5\n5\n".to_vec();
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("flat.csv", csv).unwrap();
    let page = session.render(&table, &ChartSpec::Histogram { column: "flat".into() });
    let panel = page.chart.unwrap();
    assert!(matches!(panel.plot, PlotData::Histogram { .. }));
    assert!(!panel.image.is_blank());
}

#[test]
fn test_custom_renderer_plugs_in() {
    struct Flat;
    impl ChartRenderer for Flat {
        fn render(&self, _data: &PlotData, style: &ChartStyle) -> smartviz::Result<smartviz::RenderedChart> {
            Ok(smartviz::RenderedChart {
                width: style.width,
                height: style.height,
                rgb: vec![0; (style.width * style.height * 3) as usize],
            })
        }
    }
    let session = Session::with_renderer(&AppConfig::default(), Flat);
    let table = session.load_path(&fixture("sales.csv")).unwrap();
    let page = session.render(&table, &ChartSpec::Count { column: "date".into() });
    assert!(page.chart.unwrap().image.is_blank());
}

#[test]
fn test_empty_file_still_reports_overview() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("empty.csv", Vec::new()).unwrap();
    let page = session.render_request(&table, &ChartRequest::default());

    assert!(matches!(page.chart, Err(VizError::InvalidSelection { .. })));
    let overview = page.overview.unwrap();
    assert_eq!((overview.rows, overview.columns, overview.missing_values), (0, 0, 0));
    assert_eq!(page.preview.unwrap().height(), 0);
    assert!(page.column_info.unwrap().is_empty());
    assert!(page.describe.unwrap().is_empty());
    assert_eq!(page.insights.unwrap(), None);
}

#[test]
fn test_histogram_request_on_text_only_table() {
    let csv = b"city,country\nOslo,NO\nLima,PE\n".to_vec();
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("text.csv", csv).unwrap();
    let request = ChartRequest {
        kind: Some(ChartKind::Histogram),
        ..Default::default()
    };
    let page = session.render_request(&table, &request);

    assert!(matches!(page.chart, Err(VizError::InvalidSelection { .. })));
    assert_eq!(page.overview.unwrap().rows, 2);
    assert_eq!(page.column_info.unwrap().len(), 2);

    let page = session.render_request(&table, &ChartRequest::default());
    let panel = page.chart.unwrap();
    assert!(matches!(panel.plot, PlotData::Counts { .. }));
}
