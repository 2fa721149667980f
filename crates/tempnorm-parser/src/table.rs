use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::errors::AdapterError;

/// Untyped rectangular table as read from a delimited text file.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source_id: String,
    pub content_hash: String,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self, AdapterError> {
        let bytes = fs::read(path).map_err(|source| AdapterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path.display().to_string(), &bytes, delimiter)
    }

    pub fn from_bytes(
        source_id: impl Into<String>,
        bytes: &[u8],
        delimiter: u8,
    ) -> Result<Self, AdapterError> {
        let source_id = source_id.into();
        let content_hash = blake3::hash(bytes).to_hex().to_string();

        let mut reader = Self::reader_builder(delimiter).from_reader(bytes);
        let mut records = reader.records();

        let header = match records.next() {
            Some(record) => record.map_err(|source| AdapterError::Csv {
                source_id: source_id.clone(),
                source,
            })?,
            None => {
                return Ok(Self {
                    source_id,
                    content_hash,
                    headers: Vec::new(),
                    rows: Vec::new(),
                })
            }
        };

        let headers = header
            .iter()
            .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|source| AdapterError::Csv {
                source_id: source_id.clone(),
                source,
            })?;
            rows.push(record);
        }

        Ok(Self {
            source_id,
            content_hash,
            headers,
            rows,
        })
    }

    pub fn from_text(source_id: impl Into<String>, content: &str) -> Result<Self, AdapterError> {
        Self::from_bytes(source_id, content.as_bytes(), b',')
    }

    fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter);
        builder
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Position of a named column, matched case-insensitively after trimming.
    pub fn column_index(&self, adapter: &'static str, name: &str) -> Result<usize, AdapterError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AdapterError::MissingColumn {
                adapter,
                source_id: self.source_id.clone(),
                column: wanted.to_string(),
            })
    }

    /// Cell value for a row; short rows read as empty cells.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .unwrap_or("")
    }
}
