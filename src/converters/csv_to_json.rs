use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::escape::unescape;
use crate::value_conversion::convert_field_value;

use super::{read_input, write_output, Converter, Dialect};

/// Converts a delimited file with a header row into a JSON array of objects.
pub struct CsvToJson {
    pub dialect: Dialect,
    pub no_type_conversion: bool,
    pub string_fields: Vec<String>,
}

impl CsvToJson {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            no_type_conversion: false,
            string_fields: Vec::new(),
        }
    }

    /// Keep every cell as a string.
    pub fn without_type_conversion(mut self) -> Self {
        self.no_type_conversion = true;
        self
    }

    /// Keep the named columns as strings.
    pub fn with_string_fields(mut self, fields: Vec<String>) -> Self {
        self.string_fields = fields;
        self
    }

    /// Parses CSV text into records, coercing each cell.
    pub fn parse(&self, text: &str) -> Result<Vec<Value>> {
        let (headers, rows) = match self.dialect.escape_char() {
            Some(esc) => split_escaped(text, self.dialect.delimiter_char(), esc)?,
            None => split_quoted(text, self.dialect.delimiter)?,
        };

        if headers.is_empty() {
            return Err(ConvertError::validation("CSV file has no headers"));
        }

        let mut seen = HashSet::new();
        for name in &headers {
            if !seen.insert(name.as_str()) {
                return Err(ConvertError::validation(format!(
                    "Invalid CSV format: duplicate header {:?}",
                    name
                )));
            }
        }

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ConvertError::validation(format!(
                    "Invalid CSV format: record {} has {} fields, but the header has {}",
                    i + 1,
                    row.len(),
                    headers.len()
                )));
            }

            let mut json_obj = Map::new();
            for (header_name, field) in headers.iter().zip(row.iter()) {
                let value = convert_field_value(
                    field,
                    header_name,
                    self.no_type_conversion,
                    &self.string_fields,
                );
                json_obj.insert(header_name.clone(), value);
            }
            records.push(Value::Object(json_obj));
        }

        Ok(records)
    }
}

impl Converter for CsvToJson {
    fn convert(&self, input_path: &Path, output_path: &Path) -> Result<usize> {
        debug!(
            "Reading {} with delimiter {:?}, escape {:?}",
            input_path.display(),
            self.dialect.delimiter_char(),
            self.dialect.escape_char()
        );
        let text = read_input(input_path)?;
        let records = self.parse(&text)?;

        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        records
            .serialize(&mut ser)
            .map_err(|e| ConvertError::io(output_path, e.into()))?;
        out.push(b'\n');

        write_output(output_path, &out)?;
        info!(
            "Converted {} records from {} to {}",
            records.len(),
            input_path.display(),
            output_path.display()
        );
        Ok(records.len())
    }

    fn input_extension(&self) -> &'static str {
        "csv"
    }

    fn output_extension(&self) -> &'static str {
        "json"
    }
}

type Table = (Vec<String>, Vec<Vec<String>>);

/// Splits RFC 4180 text with the `csv` crate. Column counts are checked by
/// the caller so the error can name the offending record.
fn split_quoted(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .double_quote(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((headers, rows))
}

fn csv_error(e: csv::Error) -> ConvertError {
    ConvertError::validation(format!("Invalid CSV format: {}", e))
}

/// Splits text where `escape` protects the next character from acting as a
/// delimiter or line break. Quoted fields are still honoured. Every field is
/// unescaped once it is complete.
fn split_escaped(text: &str, delimiter: char, escape: char) -> Result<Table> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == escape {
            match chars.next() {
                Some('"') if in_quotes => field.push('"'),
                // An escaped line break is a literal newline in the field.
                Some('\n') => field.push('\n'),
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    field.push('\n');
                }
                Some(n) => {
                    field.push(escape);
                    field.push(n);
                }
                None => field.push(escape),
            }
        } else if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() && !quoted {
            in_quotes = true;
            quoted = true;
        } else if c == delimiter {
            row.push(unescape(&field, escape));
            field.clear();
            quoted = false;
        } else if c == '\r' && chars.peek() == Some(&'\n') {
            // The `\n` ends the record.
        } else if c == '\n' || c == '\r' {
            end_record(&mut rows, &mut row, &mut field, quoted, escape);
            quoted = false;
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(ConvertError::validation(
            "Invalid CSV format: unterminated quoted field",
        ));
    }
    end_record(&mut rows, &mut row, &mut field, quoted, escape);

    let mut rows = rows.into_iter();
    let headers = rows.next().unwrap_or_default();
    Ok((headers, rows.collect()))
}

fn end_record(
    rows: &mut Vec<Vec<String>>,
    row: &mut Vec<String>,
    field: &mut String,
    quoted: bool,
    escape: char,
) {
    // Blank lines are skipped, like the `csv` reader does.
    if row.is_empty() && field.is_empty() && !quoted {
        return;
    }
    row.push(unescape(field, escape));
    field.clear();
    rows.push(std::mem::take(row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn escaped() -> CsvToJson {
        CsvToJson::new(Dialect::new(',', Some('\\')).unwrap())
    }

    fn quoted() -> CsvToJson {
        CsvToJson::new(Dialect::new(',', None).unwrap())
    }

    #[test]
    fn test_parse_infers_types() {
        let records = escaped()
            .parse("name,age,salary\nAlice,30,75000.50\nBob,25,65000\n")
            .unwrap();
        assert_eq!(
            records,
            vec![
                json!({"name": "Alice", "age": 30, "salary": 75000.5}),
                json!({"name": "Bob", "age": 25, "salary": 65000}),
            ]
        );
    }

    #[test]
    fn test_parse_preserves_header_order() {
        let records = quoted().parse("z,a,m\n1,2,3\n").unwrap();
        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_parse_empty_input_has_no_headers() {
        for parser in [escaped(), quoted()] {
            let err = parser.parse("").unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains("headers"));
        }
    }

    #[test]
    fn test_parse_header_only() {
        assert!(escaped().parse("a,b,c\n").unwrap().is_empty());
        assert!(quoted().parse("a,b,c\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_inconsistent_columns() {
        for parser in [escaped(), quoted()] {
            let err = parser.parse("a,b\n1,2,3\n").unwrap_err();
            assert!(err.is_validation(), "{err}");
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_headers() {
        let err = quoted().parse("id,id\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate header"));
    }

    #[test]
    fn test_parse_escaped_delimiter_and_newline() {
        let records = escaped()
            .parse("name,note\nSmith\\, John,first\\nsecond\n")
            .unwrap();
        assert_eq!(
            records,
            vec![json!({"name": "Smith, John", "note": "first\nsecond"})]
        );
    }

    #[test]
    fn test_parse_escaped_line_break() {
        let records = escaped()
            .parse("a,b\nfirst\\\nsecond,x\nthird\\\r\nfourth,y\n")
            .unwrap();
        assert_eq!(
            records,
            vec![
                json!({"a": "first\nsecond", "b": "x"}),
                json!({"a": "third\nfourth", "b": "y"}),
            ]
        );
    }

    #[test]
    fn test_parse_quoted_carriage_return() {
        let records = escaped().parse("a,b\n\"x\ry\",plain\n").unwrap();
        assert_eq!(records, vec![json!({"a": "x\ry", "b": "plain"})]);
    }

    #[test]
    fn test_parse_quoted_fields_with_escape_enabled() {
        let records = escaped()
            .parse("name,quote\n\"Smith, John\",\"He said \"\"hi\"\"\"\n")
            .unwrap();
        assert_eq!(
            records,
            vec![json!({"name": "Smith, John", "quote": "He said \"hi\""})]
        );
    }

    #[test]
    fn test_parse_backslash_quote_inside_quotes() {
        let records = escaped()
            .parse("quote\n\"Bob \\\"Bobby\\\" Smith\"\n")
            .unwrap();
        assert_eq!(records, vec![json!({"quote": "Bob \"Bobby\" Smith"})]);
    }

    #[test]
    fn test_parse_quoted_newline() {
        let records = quoted().parse("a,b\n\"line1\nline2\",x\n").unwrap();
        assert_eq!(records, vec![json!({"a": "line1\nline2", "b": "x"})]);
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let records = escaped().parse("a,b\r\n1,2\r\n\r\n3,4\r\n").unwrap();
        assert_eq!(records, vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let err = escaped().parse("a\n\"open\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_parse_empty_cells_stay_empty_strings() {
        let records = escaped().parse("a,b,c\n1,,3\n").unwrap();
        assert_eq!(records, vec![json!({"a": 1, "b": "", "c": 3})]);
    }

    #[test]
    fn test_parse_semicolon_delimiter() {
        let parser = CsvToJson::new(Dialect::new(';', Some('\\')).unwrap());
        let records = parser.parse("name;price\nWidget, large;19.99\n").unwrap();
        assert_eq!(records, vec![json!({"name": "Widget, large", "price": 19.99})]);
    }

    #[test]
    fn test_parse_string_fields() {
        let parser = quoted().with_string_fields(vec!["zip".to_string()]);
        let records = parser.parse("zip,age\n02134,30\n").unwrap();
        assert_eq!(records, vec![json!({"zip": "02134", "age": 30})]);
    }

    #[test]
    fn test_parse_without_type_conversion() {
        let parser = quoted().without_type_conversion();
        let records = parser.parse("age,price\n30,1.5\n").unwrap();
        assert_eq!(records, vec![json!({"age": "30", "price": "1.5"})]);
    }
}
