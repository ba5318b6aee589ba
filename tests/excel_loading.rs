use pretty_assertions::assert_eq;
use smartviz::analysis::summary::{column_info, describe};
use smartviz::core::ColumnKind;
use smartviz::{AppConfig, ChartSpec, PlotData, Session, SourceFormat, VizError};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn inventory_bytes() -> Vec<u8> {
    std::fs::read(fixture("inventory.xlsx")).unwrap()
}

#[test]
fn test_first_sheet_only() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("inventory.xlsx")).unwrap();
    assert_eq!(table.format(), SourceFormat::Xlsx);
    assert_eq!(table.row_count(), 6);
    assert_eq!(table.column_names(), vec!["item", "quantity", "price", "in_stock"]);
}

#[test]
fn test_cell_types_are_inferred() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("inventory.xlsx")).unwrap();

    assert_eq!(table.column_kind("item").unwrap(), ColumnKind::Text);
    assert_eq!(table.column_kind("quantity").unwrap(), ColumnKind::Numeric);
    assert_eq!(table.column_kind("price").unwrap(), ColumnKind::Numeric);
    assert_eq!(table.column_kind("in_stock").unwrap(), ColumnKind::Boolean);
    assert_eq!(table.numeric_columns(), vec!["quantity", "price"]);

    let info = column_info(&table).unwrap();
    let missing: Vec<(String, usize)> = info.iter().map(|c| (c.name.clone(), c.missing)).collect();
    assert_eq!(
        missing,
        vec![
            ("item".to_string(), 0),
            ("quantity".to_string(), 1),
            ("price".to_string(), 0),
            ("in_stock".to_string(), 0),
        ]
    );

    let stats = describe(&table).unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].column, "quantity");
    assert_eq!(stats[0].count, 5);
    assert_eq!(stats[0].max, Some(300.0));
    assert_eq!(stats[1].min, Some(0.05));
}

#[test]
fn test_uppercase_extension_upload() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_upload("INVENTORY.XLSX", inventory_bytes()).unwrap();
    assert_eq!(table.format(), SourceFormat::Xlsx);
    assert_eq!(table.column_count(), 4);
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let session = Session::new(&AppConfig::default());
    let err = session.load_upload("inventory.txt", inventory_bytes()).unwrap_err();
    assert!(matches!(err, VizError::UnsupportedFormat { .. }));
    assert_eq!(session.data_service().parse_count(), 0);
}

#[test]
fn test_count_chart_over_item() {
    let session = Session::new(&AppConfig::default());
    let table = session.load_path(&fixture("inventory.xlsx")).unwrap();
    let page = session.render(&table, &ChartSpec::Count { column: "item".into() });
    let panel = page.chart.unwrap();
    match &panel.plot {
        PlotData::Counts { categories, .. } => {
            assert_eq!(categories.len(), 6);
            assert_eq!(categories[0], ("bolt".to_string(), 1));
        }
        other => panic!("expected counts, got {other:?}"),
    }
    assert!(!panel.image.is_blank());

    let report = page.insights.unwrap().unwrap();
    assert_eq!(report.pairs.len(), 1);
}
