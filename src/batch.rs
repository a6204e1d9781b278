//! Converting many files into one output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::converters::Converter;
use crate::error::{ConvertError, Result};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Input and output paths of each successful conversion.
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// Inputs that failed, with the reason.
    pub failed: Vec<(PathBuf, ConvertError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Converts every input into `output_dir`, one after another.
///
/// Inputs containing `*`, `?` or `[` are glob patterns (`**` recurses).
/// Directories among `inputs` are expanded to the files directly inside
/// them that carry the converter's input extension. A failing file is
/// logged and recorded, and the remaining files are still converted.
pub fn convert_batch(
    converter: &dyn Converter,
    inputs: &[PathBuf],
    output_dir: &Path,
) -> Result<BatchReport> {
    let files = expand_inputs(inputs, converter.input_extension())?;
    if files.is_empty() {
        return Err(ConvertError::validation(format!(
            "No files found matching: {}",
            inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;

    let total = files.len();
    info!("Found {} files to convert", total);

    let mut report = BatchReport::default();
    for (idx, input) in files.into_iter().enumerate() {
        let output = output_path_for(&input, output_dir, converter.output_extension());
        info!(
            "[{}/{}] Converting {} to {}",
            idx + 1,
            total,
            input.display(),
            output.display()
        );

        match converter.convert(&input, &output) {
            Ok(_) => report.converted.push((input, output)),
            Err(e) => {
                warn!("Error processing {}: {}", input.display(), e);
                report.failed.push((input, e));
            }
        }
    }

    info!(
        "Batch conversion complete: {} converted, {} failed",
        report.converted.len(),
        report.failed.len()
    );
    Ok(report)
}

/// `<output_dir>/<input stem>.<extension>`
pub fn output_path_for(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(extension);
    output_dir.join(name)
}

fn is_pattern(input: &Path) -> bool {
    input
        .to_str()
        .is_some_and(|s| s.contains(|c| matches!(c, '*' | '?' | '[')))
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| {
        ConvertError::validation(format!("Invalid glob pattern {}: {}", pattern, e))
    })?;

    let mut found = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ConvertError::io(e.path().to_path_buf(), e.into_error()))?;
        if path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn expand_inputs(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if is_pattern(input) {
            files.extend(expand_pattern(&input.to_string_lossy())?);
            continue;
        }
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let entries = fs::read_dir(input).map_err(|e| ConvertError::io(input, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ConvertError::io(input, e))?.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if path.is_file() && matches {
                found.push(path);
            }
        }
        // Sort for consistent ordering
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for() {
        let out = output_path_for(Path::new("data/people.csv"), Path::new("out"), "json");
        assert_eq!(out, PathBuf::from("out/people.json"));
    }

    #[test]
    fn test_output_path_for_dotted_stem() {
        let out = output_path_for(Path::new("data/report.v2.json"), Path::new("out"), "csv");
        assert_eq!(out, PathBuf::from("out/report.v2.csv"));
    }

    #[test]
    fn test_is_pattern() {
        assert!(is_pattern(Path::new("data/*.csv")));
        assert!(is_pattern(Path::new("data/**/*.json")));
        assert!(is_pattern(Path::new("file?.csv")));
        assert!(is_pattern(Path::new("[ab].csv")));
        assert!(!is_pattern(Path::new("data/people.csv")));
        assert!(!is_pattern(Path::new("data")));
    }

    #[test]
    fn test_expand_recursive_pattern() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        for path in [
            dir.path().join("top.json"),
            dir.path().join("a").join("mid.json"),
            nested.join("deep.json"),
            nested.join("skip.csv"),
        ] {
            fs::write(path, "{}").unwrap();
        }

        let pattern = dir.path().join("**").join("*.json");
        let files = expand_inputs(&[pattern], "json").unwrap();

        let mut expected = vec![
            dir.path().join("top.json"),
            dir.path().join("a").join("mid.json"),
            nested.join("deep.json"),
        ];
        expected.sort();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_expand_invalid_pattern() {
        let err = expand_inputs(&[PathBuf::from("data/[.csv")], "csv").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_expand_keeps_literal_paths() {
        let files = expand_inputs(&[PathBuf::from("missing.csv")], "csv").unwrap();
        assert_eq!(files, vec![PathBuf::from("missing.csv")]);
    }

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::default();
        assert!(report.is_success());
        report
            .failed
            .push((PathBuf::from("a.csv"), ConvertError::validation("bad")));
        assert_eq!(report.total(), 1);
        assert!(!report.is_success());
    }
}
