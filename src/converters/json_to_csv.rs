use std::collections::HashSet;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::escape::{escape, is_escaped};
use crate::value_conversion::json_value_to_field;

use super::{read_input, write_output, Converter, Dialect};

/// Converts a JSON object, or an array of objects sharing the same fields, into delimited text.
pub struct JsonToCsv {
    pub dialect: Dialect,
}

impl JsonToCsv {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Renders JSON text as CSV bytes, returning the bytes and the record count.
    pub fn render(&self, text: &str) -> Result<(Vec<u8>, usize)> {
        let data: Value = serde_json::from_str(text)
            .map_err(|e| ConvertError::validation(format!("Invalid JSON format: {}", e)))?;
        let records = into_records(data)?;

        let Some(first) = records.first() else {
            return Ok((Vec::new(), 0));
        };
        let fieldnames: Vec<&String> = first.keys().collect();
        let field_set: HashSet<&String> = fieldnames.iter().copied().collect();

        for record in &records[1..] {
            let keys: HashSet<&String> = record.keys().collect();
            if keys != field_set {
                return Err(ConvertError::validation(
                    "All objects in JSON array must have the same fields",
                ));
            }
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.dialect.delimiter)
            .terminator(self.dialect.terminator)
            .quote_style(if self.dialect.escape.is_some() {
                QuoteStyle::Never
            } else {
                QuoteStyle::Necessary
            })
            .from_writer(Vec::new());

        writer
            .write_record(fieldnames.iter().map(|name| self.encode_field(name)))
            .map_err(csv_write_error)?;

        for record in &records {
            let row = fieldnames
                .iter()
                .map(|name| self.encode_field(&json_value_to_field(&record[name.as_str()])));
            writer.write_record(row).map_err(csv_write_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ConvertError::validation(format!("Failed to finish CSV output: {}", e)))?;
        Ok((bytes, records.len()))
    }

    /// With an escape character, delimiter-like characters are escaped
    /// instead of quoted. A field that still contains a quote, a carriage
    /// return, or a delimiter outside the escaped set, is wrapped in quotes
    /// so it reads back unchanged.
    fn encode_field(&self, text: &str) -> String {
        match self.dialect.escape_char() {
            Some(esc) => {
                let escaped = escape(text, esc);
                let delimiter = self.dialect.delimiter_char();
                let bare_delimiter = !is_escaped(delimiter) && escaped.contains(delimiter);
                if escaped.contains(|c| matches!(c, '"' | '\r')) || bare_delimiter {
                    format!("\"{}\"", escaped.replace('"', "\"\""))
                } else {
                    escaped
                }
            }
            None => text.to_string(),
        }
    }
}

impl Converter for JsonToCsv {
    fn convert(&self, input_path: &Path, output_path: &Path) -> Result<usize> {
        debug!(
            "Reading {} with delimiter {:?}, escape {:?}",
            input_path.display(),
            self.dialect.delimiter_char(),
            self.dialect.escape_char()
        );
        let text = read_input(input_path)?;
        let (bytes, count) = self.render(&text)?;

        write_output(output_path, &bytes)?;
        info!(
            "Converted {} records from {} to {}",
            count,
            input_path.display(),
            output_path.display()
        );
        Ok(count)
    }

    fn input_extension(&self) -> &'static str {
        "json"
    }

    fn output_extension(&self) -> &'static str {
        "csv"
    }
}

/// A single object becomes one record; an array must hold only objects.
fn into_records(data: Value) -> Result<Vec<Map<String, Value>>> {
    let shape_error =
        || ConvertError::validation("JSON must contain an object or array of objects");

    match data {
        Value::Object(obj) => Ok(vec![obj]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => Ok(obj),
                _ => Err(shape_error()),
            })
            .collect(),
        _ => Err(shape_error()),
    }
}

fn csv_write_error(e: csv::Error) -> ConvertError {
    ConvertError::validation(format!("Failed to write CSV: {}", e))
}
