//! Delimited metadata tables.
//!
//! A table is a header row plus string cells. Columns the tagger does not use
//! are carried through untouched, and the label column is appended (or
//! overwritten if the input already has one).

use crate::config::TableConfig;
use crate::error::{EmotagError, Result};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// One input row as the batch driver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Zero-based position among data rows.
    pub row: usize,
    pub audio_filename: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a table from disk. A missing file is reported as
    /// [`EmotagError::InputTableNotFound`].
    pub fn read(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EmotagError::InputTableNotFound {
                path: path.display().to_string(),
            },
            _ => EmotagError::Io(e),
        })?;
        Self::from_reader(file, delimiter)
    }

    /// Parse a table. Short rows are padded with empty cells; rows longer
    /// than the header are rejected.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(EmotagError::MalformedRow {
                    row: index + 1,
                    message: format!(
                        "expected {} fields, found {}",
                        headers.len(),
                        record.len()
                    ),
                });
            }
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len(), String::new());
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| EmotagError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Extract the records the driver labels, in row order.
    pub fn records(&self, layout: &TableConfig) -> Result<Vec<Record>> {
        let audio = self.require_column(&layout.audio_column)?;
        let text = self.require_column(&layout.text_column)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| Record {
                row,
                audio_filename: cells[audio].clone(),
                text: cells[text].clone(),
            })
            .collect())
    }

    /// Set column `name` to `values`, appending it if absent.
    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(EmotagError::Other(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(index) => {
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells.push(value);
                }
            }
        }
        Ok(self)
    }

    pub fn to_writer<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        writer.write_record(&self.headers)?;
        for cells in &self.rows {
            writer.write_record(cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to a new file at `path`, replacing any existing one.
    pub fn write(&self, path: &Path, delimiter: u8) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(io::BufWriter::new(file), delimiter)
    }
}
