// CSV data source and sink implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::{DataError, DataSet, DataSink, DataSource, DataType, Field, Row, Schema, Value};

/// CSV data source.
///
/// Every column is loaded as a nullable string column; empty fields become
/// [`Value::Null`]. Use `cast` or the column typing helpers to refine types.
pub struct CsvSource {
    path: PathBuf,
    name: String,
    has_header: bool,
    delimiter: u8,
}

impl CsvSource {
    /// Create a new CSV data source with a header row and comma delimiter
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvSource {
            path: path.as_ref().to_path_buf(),
            name: path.as_ref().to_string_lossy().to_string(),
            has_header: true,
            delimiter: b',',
        }
    }

    /// Set whether the first record is a header
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl DataSource for CsvSource {
    fn read(&self) -> Result<DataSet, DataError> {
        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .from_reader(BufReader::new(file));

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        let headers: Vec<String> = if self.has_header {
            reader.headers()?.iter().map(str::to_string).collect()
        } else {
            let width = records
                .first()
                .map(|record| record.len())
                .ok_or_else(|| DataError::Parse("Empty CSV file".to_string()))?;
            (0..width).map(|i| format!("column_{}", i)).collect()
        };

        let fields = headers
            .into_iter()
            .map(|name| Field::new(name, DataType::String, true))
            .collect();
        let mut dataset = DataSet::new(Schema::new(fields));

        for record in &records {
            let values = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::String(field.to_string())
                    }
                })
                .collect();
            dataset.add_row(Row::new(values))?;
        }

        dataset.metadata.add("source", "csv");
        dataset.metadata.add("path", self.name.clone());

        Ok(dataset)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// CSV data sink
pub struct CsvSink {
    path: PathBuf,
    name: String,
    delimiter: u8,
}

impl CsvSink {
    /// Create a new CSV data sink with a comma delimiter
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvSink {
            path: path.as_ref().to_path_buf(),
            name: path.as_ref().to_string_lossy().to_string(),
            delimiter: b',',
        }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl DataSink for CsvSink {
    fn write(&self, data: &DataSet) -> Result<(), DataError> {
        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(BufWriter::new(file));

        writer.write_record(data.schema.names())?;

        for row in &data.data {
            // Null renders as an empty field, which the source reads back as null
            writer.write_record(row.values.iter().map(|value| value.to_string()))?;
        }

        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
