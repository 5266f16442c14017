//! Record Normalizer: parse a source into records with canonical headers.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use dock_core::Record;

use crate::error::{LoadConfigError, LoadError, ParseError};

/// Characters removed from headers before lowercasing.
const STRIPPED: [char; 5] = ['-', '"', ' ', '\'', '\u{feff}'];

/// Tabular formats a source file can be in, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Json,
}

impl SourceFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }
}

/// Canonical field name for a raw header.
///
/// Hyphens, quotes, spaces (and a stray byte-order mark) are removed and the
/// rest is lowercased. Underscores and the header-argument separator survive.
#[must_use]
pub fn canonical_header(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !STRIPPED.contains(ch))
        .collect::<String>()
        .to_lowercase()
}

/// Build a record from canonical headers and the cells of one row.
///
/// Empty cells are dropped so absence is the only way to say "not
/// provided". Missing trailing cells count as empty; extra cells are ignored.
#[must_use]
pub fn normalize_row<'a>(headers: &[String], cells: impl IntoIterator<Item = &'a str>) -> Record {
    headers
        .iter()
        .zip(cells)
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(header, cell)| (header.clone(), cell.to_string()))
        .collect()
}

/// Canonicalize raw headers, refusing two that collapse to one name.
///
/// # Errors
///
/// Returns [`ParseError::DuplicateHeader`] naming both raw headers.
pub fn canonical_headers<'a>(
    raw: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<String>, ParseError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut headers = Vec::new();
    for header in raw {
        let field = canonical_header(header);
        if let Some(first) = seen.insert(field.clone(), header) {
            return Err(ParseError::DuplicateHeader {
                first: first.to_string(),
                second: header.to_string(),
                field,
            });
        }
        headers.push(field);
    }
    Ok(headers)
}

/// Parse delimited text (CSV, TSV) into normalized records.
///
/// # Errors
///
/// Returns the reader's error for malformed input or invalid UTF-8, and
/// [`ParseError::DuplicateHeader`] when two columns share a field name.
pub fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Record>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = canonical_headers(reader.headers()?.iter())?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(normalize_row(&headers, row.iter()));
    }
    Ok(records)
}

/// Parse a JSON array of flat objects into normalized records.
///
/// Strings are taken as-is, `null` counts as empty, and any other value is
/// stored as its JSON text.
///
/// # Errors
///
/// Returns a JSON error when the document is not an array of objects, and
/// [`ParseError::DuplicateHeader`] when two keys of one object share a field
/// name.
pub fn parse_json(text: &str) -> Result<Vec<Record>, ParseError> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(text)?;

    rows.into_iter()
        .map(|row| -> Result<Record, ParseError> {
            let headers = canonical_headers(row.keys().map(String::as_str))?;
            Ok(headers
                .into_iter()
                .zip(row.into_iter().map(|(_, value)| value))
                .filter_map(|(field, value)| {
                    let text = match value {
                        serde_json::Value::Null => return None,
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (!text.is_empty()).then_some((field, text))
                })
                .collect())
        })
        .collect()
}

/// Read a source file and normalize every row, in file order.
///
/// # Errors
///
/// Returns [`LoadConfigError::UnsupportedFormat`] for unknown extensions, and
/// an I/O or parse error naming the file otherwise.
pub fn read_source(path: &Path) -> Result<Vec<Record>, LoadError> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| LoadConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let io = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let records = match format {
        SourceFormat::Csv | SourceFormat::Tsv => {
            let delimiter = if format == SourceFormat::Csv { b',' } else { b'\t' };
            let file = fs::File::open(path).map_err(io)?;
            parse_delimited(file, delimiter).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        }
        SourceFormat::Json => {
            let text = fs::read_to_string(path).map_err(io)?;
            parse_json(&text).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    tracing::debug!(path = %path.display(), format = format.as_str(), records = records.len(), "normalized source");
    Ok(records)
}
