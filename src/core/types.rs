use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

use crate::error::{Result, VizError};

/// File format of an uploaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Pick the parser from the file name's extension.
    ///
    /// Matching ignores ASCII case (`REPORT.CSV` is a CSV file). Names without
    /// an extension, or with any other extension, are rejected rather than
    /// handed to the spreadsheet parser.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        ext.parse().map_err(|_| VizError::UnsupportedFormat {
            name: name.to_string(),
        })
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(format!("Unknown source format: {}", s)),
        }
    }
}

/// CSV import options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvImportOptions {
    pub has_header: bool,
    pub delimiter: char,
    pub quote_char: Option<char>,
}

impl Default for CsvImportOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ',',
            quote_char: Some('"'),
        }
    }
}

/// What distinguishes one version of an input from another
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Modification time of a file on disk
    Modified(SystemTime),
    /// Hash of in-memory upload bytes
    Content(u64),
}

/// Cache key for a loaded dataset: name, byte size and fingerprint.
///
/// Two different uploads sharing a file name only collide when they also
/// share size and fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub name: String,
    pub size: u64,
    pub fingerprint: Fingerprint,
}

impl FileIdentity {
    /// Identity of a file on disk, taken from its metadata
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();
        let modified = meta.modified()?;
        Ok(Self {
            name,
            size: meta.len(),
            fingerprint: Fingerprint::Modified(modified),
        })
    }

    /// Identity of an in-memory upload, fingerprinted by content
    pub fn from_upload(name: &str, bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            fingerprint: Fingerprint::Content(hasher.finish()),
        }
    }
}

/// Broad classification of a column's dtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Other,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Text => write!(f, "text"),
            Self::Temporal => write!(f, "temporal"),
            Self::Boolean => write!(f, "boolean"),
            Self::Other => write!(f, "other"),
        }
    }
}
