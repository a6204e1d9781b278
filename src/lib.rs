#![allow(clippy::approx_constant)]

pub mod batch;
pub mod converters;
pub mod error;
pub mod escape;
pub mod format_detection;
pub mod value_conversion;

// Re-export commonly used items for convenience
pub use batch::{convert_batch, BatchReport};
pub use converters::{
    csv_to_json::CsvToJson, json_to_csv::JsonToCsv, Converter, Dialect, DEFAULT_DELIMITER,
    DEFAULT_ESCAPE,
};
pub use error::{ConvertError, Result};
pub use escape::{escape, unescape};
pub use format_detection::{detect_delimiter, detect_file_format, FileFormat};
pub use value_conversion::{coerce, convert_field_value, CellValue};

use std::path::Path;

/// Converts a CSV file with a header row into a JSON array of objects.
///
/// Returns the number of records written. `escape` defaults to `\` in the CLI;
/// pass `None` for plain RFC 4180 quoting.
pub fn convert_csv_to_json(
    input_path: &Path,
    output_path: &Path,
    delimiter: char,
    escape: Option<char>,
) -> Result<usize> {
    let converter = CsvToJson::new(Dialect::new(delimiter, escape)?);
    converter.convert(input_path, output_path)
}

/// Converts a JSON object or array of objects into CSV.
///
/// Returns the number of records written. An empty array produces an empty file.
pub fn convert_json_to_csv(
    input_path: &Path,
    output_path: &Path,
    delimiter: char,
    escape: Option<char>,
) -> Result<usize> {
    let converter = JsonToCsv::new(Dialect::new(delimiter, escape)?);
    converter.convert(input_path, output_path)
}
