pub mod csv_to_json;
pub mod json_to_csv;

use std::fs;
use std::path::Path;

use csv::Terminator;
use tracing::warn;

use crate::error::{ConvertError, Result};

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_ESCAPE: char = '\\';

/// Common trait for both conversion directions
pub trait Converter {
    /// Convert `input_path` into `output_path`, returning the number of records written
    fn convert(&self, input_path: &Path, output_path: &Path) -> Result<usize>;

    /// Extension of the files this converter reads, without the dot
    fn input_extension(&self) -> &'static str;

    /// Extension of the files this converter writes, without the dot
    fn output_extension(&self) -> &'static str;
}

/// Delimited-text settings shared by both converters.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub delimiter: u8,
    pub escape: Option<u8>,
    pub terminator: Terminator,
}

impl Dialect {
    /// Validates and builds a dialect. Both characters must be ASCII, must
    /// differ, and cannot be a quote or a line break.
    pub fn new(delimiter: char, escape: Option<char>) -> Result<Self> {
        let delimiter = dialect_byte("delimiter", delimiter)?;
        let escape = escape.map(|c| dialect_byte("escape character", c)).transpose()?;

        // `n` and `t` are the mnemonics for newline and tab.
        if matches!(escape, Some(b'n' | b't')) {
            return Err(ConvertError::validation(
                "Escape character cannot be 'n' or 't'",
            ));
        }
        if escape == Some(delimiter) {
            return Err(ConvertError::validation(
                "Escape character must differ from the delimiter",
            ));
        }

        Ok(Self {
            delimiter,
            escape,
            terminator: Terminator::Any(b'\n'),
        })
    }

    /// Write `\r\n` line endings instead of `\n`.
    pub fn with_crlf(mut self, crlf: bool) -> Self {
        self.terminator = if crlf {
            Terminator::CRLF
        } else {
            Terminator::Any(b'\n')
        };
        self
    }

    pub fn delimiter_char(&self) -> char {
        self.delimiter as char
    }

    pub fn escape_char(&self) -> Option<char> {
        self.escape.map(|b| b as char)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER as u8,
            escape: None,
            terminator: Terminator::Any(b'\n'),
        }
    }
}

fn dialect_byte(what: &str, c: char) -> Result<u8> {
    if !c.is_ascii() {
        return Err(ConvertError::validation(format!(
            "The {} must be a single ASCII character, got {:?}",
            what, c
        )));
    }
    if matches!(c, '"' | '\r' | '\n') {
        return Err(ConvertError::validation(format!(
            "The {} cannot be {:?}",
            what, c
        )));
    }
    Ok(c as u8)
}

/// Reads the whole input file as UTF-8.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConvertError::from_input(path, e))
}

/// Replaces the output file with `contents`.
pub(crate) fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        warn!("Output file {} already exists and will be overwritten", path.display());
    }
    fs::write(path, contents).map_err(|e| ConvertError::io(path, e))
}
