use crate::core::{
    types::{CsvImportOptions, FileIdentity, SourceFormat},
    Table,
};
use crate::error::{Result, VizError};
use calamine::{Data, Reader};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Rows scanned when inferring CSV column types
const INFER_SCHEMA_ROWS: usize = 10_000;

/// DataService turns uploaded files into [`Table`]s
///
/// This service is responsible for:
/// - Choosing a parser from the file extension
/// - Parsing CSV text and the first worksheet of an Excel workbook
/// - Caching parsed tables per file identity for the lifetime of the session
///
/// The cache is never evicted; a session holds every table it has loaded.
pub struct DataService {
    /// CSV parsing options applied to every CSV load
    csv_options: CsvImportOptions,

    /// Parsed tables keyed by file identity
    tables: Mutex<HashMap<FileIdentity, Arc<Table>>>,

    /// Number of parses performed (cache misses)
    parses: AtomicUsize,
}

impl Default for DataService {
    fn default() -> Self {
        Self::new()
    }
}

impl DataService {
    pub fn new() -> Self {
        Self::with_csv_options(CsvImportOptions::default())
    }

    pub fn with_csv_options(csv_options: CsvImportOptions) -> Self {
        Self {
            csv_options,
            tables: Mutex::new(HashMap::new()),
            parses: AtomicUsize::new(0),
        }
    }

    /// Load a file from disk, returning the cached table if this exact file
    /// version was loaded before.
    pub fn load_path(&self, path: &Path) -> Result<Arc<Table>> {
        let identity = FileIdentity::from_path(path)?;
        if let Some(table) = self.cached(&identity)? {
            return Ok(table);
        }
        let bytes = std::fs::read(path)?;
        self.parse_and_cache(identity, bytes)
    }

    /// Load an in-memory upload (file name plus raw bytes)
    pub fn load_upload(&self, name: &str, bytes: Vec<u8>) -> Result<Arc<Table>> {
        let identity = FileIdentity::from_upload(name, &bytes);
        if let Some(table) = self.cached(&identity)? {
            return Ok(table);
        }
        self.parse_and_cache(identity, bytes)
    }

    /// Number of times a file was actually parsed
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    /// Number of tables held in the cache
    pub fn cached_tables(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Drop every cached table
    pub fn clear_cache(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<FileIdentity, Arc<Table>>>> {
        self.tables
            .lock()
            .map_err(|e| VizError::Cache(format!("Failed to acquire table cache lock: {e}")))
    }

    fn cached(&self, identity: &FileIdentity) -> Result<Option<Arc<Table>>> {
        let tables = self.lock()?;
        let hit = tables.get(identity).cloned();
        if hit.is_some() {
            tracing::info!("Table cache hit for '{}'", identity.name);
        }
        Ok(hit)
    }

    fn parse_and_cache(&self, identity: FileIdentity, bytes: Vec<u8>) -> Result<Arc<Table>> {
        let format = SourceFormat::from_file_name(&identity.name)?;
        self.parses.fetch_add(1, Ordering::SeqCst);
        let df = match format {
            SourceFormat::Csv => parse_csv(&identity.name, bytes, &self.csv_options)?,
            SourceFormat::Xlsx => parse_workbook(&identity.name, bytes)?,
        };
        tracing::info!(
            "Loaded '{}' as {}: {} rows x {} columns",
            identity.name,
            format,
            df.height(),
            df.width()
        );
        let table = Arc::new(Table::new(identity.name.clone(), format, df));
        self.lock()?.insert(identity, table.clone());
        Ok(table)
    }
}

/// Parse comma-delimited text with a header row.
pub fn parse_csv(name: &str, bytes: Vec<u8>, options: &CsvImportOptions) -> Result<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_separator(options.delimiter as u8)
        .with_quote_char(options.quote_char.map(|c| c as u8))
        .with_try_parse_dates(true);

    CsvReadOptions::default()
        .with_has_header(options.has_header)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_raise_if_empty(false)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| VizError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Parse the first worksheet of a workbook; the first row is the header.
pub fn parse_workbook(name: &str, bytes: Vec<u8>) -> Result<DataFrame> {
    let parse_err = |reason: String| VizError::Parse {
        name: name.to_string(),
        reason,
    };
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| parse_err(format!("Failed to open workbook: {e}")))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(DataFrame::empty());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| parse_err(format!("Failed to read worksheet '{sheet_name}': {e}")))?;

    let mut rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }
    let max_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut rows {
        if row.len() < max_cols {
            row.resize(max_cols, Data::Empty);
        }
    }
    let header_row = rows.remove(0);
    let column_names = header_names(&header_row);

    let mut columns: Vec<Vec<Data>> = vec![Vec::with_capacity(rows.len()); max_cols];
    for row in rows.into_iter() {
        for (col_idx, value) in row.into_iter().enumerate() {
            columns[col_idx].push(value);
        }
    }

    let mut cols: Vec<Column> = Vec::with_capacity(max_cols);
    for (col_name, cells) in column_names.into_iter().zip(columns.into_iter()) {
        cols.push(cells_to_series(&col_name, &cells)?.into());
    }
    DataFrame::new(cols)
        .map_err(|e| parse_err(format!("Failed to build table from worksheet '{sheet_name}': {e}")))
}

/// Header cells as unique, non-empty column names
fn header_names(header_row: &[Data]) -> Vec<String> {
    let mut used_names: HashSet<String> = HashSet::new();
    let mut column_names: Vec<String> = Vec::with_capacity(header_row.len());
    for (idx, cell) in header_row.iter().enumerate() {
        let mut name = cell_text(cell).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            name = format!("column_{}", idx + 1);
        }
        if used_names.contains(&name) {
            let mut suffix = 2usize;
            let base = name.clone();
            while used_names.contains(&format!("{base}_{suffix}")) {
                suffix += 1;
            }
            name = format!("{base}_{suffix}");
        }
        used_names.insert(name.clone());
        column_names.push(name);
    }
    column_names
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(d) => Some(
            d.as_datetime()
                .map(|dt| dt.to_string())
                .unwrap_or_else(|| d.as_f64().to_string()),
        ),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(format!("ERROR: {e:?}")),
    }
}

/// Build a typed series from worksheet cells. Empty cells are nulls; a column
/// keeps a numeric, boolean or datetime type only when every non-empty cell
/// agrees, otherwise it falls back to text.
fn cells_to_series(name: &str, cells: &[Data]) -> Result<Series> {
    let filled = || cells.iter().filter(|c| !matches!(c, Data::Empty));
    let name: PlSmallStr = name.into();

    if filled().all(|c| matches!(c, Data::Int(_))) && filled().next().is_some() {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Data::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        return Ok(Series::new(name, values));
    }
    if filled().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) && filled().next().is_some() {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return Ok(Series::new(name, values));
    }
    if filled().all(|c| matches!(c, Data::Bool(_))) && filled().next().is_some() {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Ok(Series::new(name, values));
    }
    let as_datetime = |c: &Data| match c {
        Data::DateTime(d) if d.is_datetime() => d.as_datetime(),
        _ => None,
    };
    if filled().all(|c| as_datetime(c).is_some()) && filled().next().is_some() {
        let millis: Vec<Option<i64>> = cells
            .iter()
            .map(|c| as_datetime(c).map(|dt| dt.and_utc().timestamp_millis()))
            .collect();
        let series = Series::new(name, millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        return Ok(series);
    }
    let values: Vec<Option<String>> = cells.iter().map(cell_text).collect();
    Ok(Series::new(name, values))
}
