use crate::file::csv::{error::FileError, settings::CsvSettings};
use model::{
    core::value::Value,
    records::record::{FieldValue, Record},
};
use std::{fs::File, path::Path};
use tracing::debug;

/// Streams the data rows of one CSV file as [`Record`]s.
pub struct CsvAdapter {
    reader: csv::Reader<File>,
    pub settings: CsvSettings,
    pub headers: Vec<String>,
}

impl CsvAdapter {
    /// Opens the file. A missing file is reported before any row is read.
    pub fn new(file_path: &str, settings: CsvSettings) -> Result<Self, FileError> {
        if !Path::new(file_path).is_file() {
            return Err(FileError::NotFound(file_path.to_string()));
        }

        let mut builder = csv::ReaderBuilder::new();
        let builder = builder
            .delimiter(settings.delimiter as u8)
            .quote(settings.quote as u8)
            .has_headers(settings.has_headers)
            .flexible(true);

        let file = File::open(file_path)?;
        let mut reader = builder.from_reader(file);

        // Without a header row the first record only tells us the width.
        let first = reader.headers()?;
        let headers = if settings.has_headers {
            first.iter().map(|h| h.trim().to_string()).collect()
        } else {
            (1..=first.len()).map(|i| format!("column_{i}")).collect()
        };

        debug!("Opened CSV file {file_path} with headers {headers:?}");

        Ok(CsvAdapter {
            reader,
            settings,
            headers,
        })
    }

    /// Yields one record per data row, in file order. Empty cells become
    /// `Null`; short rows are padded with `Null`.
    pub fn records(&mut self) -> impl Iterator<Item = Result<Record, FileError>> + '_ {
        let headers = &self.headers;
        self.reader.records().enumerate().map(move |(idx, row)| {
            let line = idx + 1;
            let row = row.map_err(|e| FileError::ReadError {
                row: line,
                message: e.to_string(),
            })?;

            let field_values = headers
                .iter()
                .enumerate()
                .map(|(ordinal, name)| FieldValue {
                    name: name.clone(),
                    value: row.get(ordinal).map(Value::from_cell).unwrap_or(Value::Null),
                })
                .collect();

            Ok(Record::new(field_values).with_source_line(line))
        })
    }
}
