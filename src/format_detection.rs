use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Number of lines sampled when guessing a delimiter.
const SAMPLE_LINES: usize = 250;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

/// Detects the file format based on extension and content
pub fn detect_file_format(file_path: &Path) -> Result<FileFormat> {
    if let Some(ext) = file_path.extension() {
        let ext_str = ext.to_string_lossy().to_lowercase();
        match ext_str.as_str() {
            "json" => return Ok(FileFormat::Json),
            "csv" | "tsv" | "txt" => return Ok(FileFormat::Csv),
            _ => {}
        }
    }

    // Extension is unclear: JSON documents handled here start with an object or array
    let mut file = File::open(file_path).map_err(|e| ConvertError::from_input(file_path, e))?;
    let mut head = [0u8; 512];
    let n = file
        .read(&mut head)
        .map_err(|e| ConvertError::io(file_path, e))?;

    match head[..n].iter().copied().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{' | b'[') => Ok(FileFormat::Json),
        _ => Ok(FileFormat::Csv),
    }
}

/// Guesses the delimiter of a CSV file.
///
/// A candidate counts only if every sampled non-empty line holds as many of
/// it as the first line. The candidate with the most occurrences wins; `,`
/// is the fallback.
pub fn detect_delimiter(file_path: &Path) -> Result<u8> {
    let file = File::open(file_path).map_err(|e| ConvertError::from_input(file_path, e))?;
    let reader = BufReader::new(file);

    let mut lines: Vec<String> = Vec::new();
    for line in reader.lines().take(SAMPLE_LINES) {
        lines.push(line.map_err(|e| ConvertError::io(file_path, e))?);
    }

    let Some(first_line) = lines.first() else {
        return Ok(b',');
    };

    let mut delimiter_scores: Vec<(u8, usize)> = Vec::new();
    for &delim in &CANDIDATE_DELIMITERS {
        let count = count_byte(first_line, delim);
        if count == 0 {
            continue;
        }
        let consistent = lines[1..]
            .iter()
            .all(|line| line.is_empty() || count_byte(line, delim) == count);
        if consistent {
            delimiter_scores.push((delim, count));
        }
    }

    // Stable sort keeps candidate order on ties, so `,` wins a tie.
    delimiter_scores.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(delimiter_scores.first().map(|(d, _)| *d).unwrap_or(b','))
}

fn count_byte(line: &str, delim: u8) -> usize {
    line.bytes().filter(|&c| c == delim).count()
}
