use file_converter::{detect_delimiter, detect_file_format, FileFormat};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a temporary input file for testing
fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_detect_comma_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "comma.csv", "name,age,city\nAlice,30,Boston\nBob,25,NYC\n");

    assert_eq!(detect_delimiter(&path).unwrap(), b',');
}

#[test]
fn test_detect_semicolon_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "semicolon.csv", "name;age;city\nAlice;30;Boston\nBob;25;NYC\n");

    assert_eq!(detect_delimiter(&path).unwrap(), b';');
}

#[test]
fn test_detect_tab_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "tab.csv", "name\tage\tcity\nAlice\t30\tBoston\nBob\t25\tNYC\n");

    assert_eq!(detect_delimiter(&path).unwrap(), b'\t');
}

#[test]
fn test_detect_pipe_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "pipe.csv", "name|age|city\nAlice|30|Boston\nBob|25|NYC\n");

    assert_eq!(detect_delimiter(&path).unwrap(), b'|');
}

#[test]
fn test_empty_file_defaults_to_comma() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "empty.csv", "");

    assert_eq!(detect_delimiter(&path).unwrap(), b',');
}

#[test]
fn test_consistent_delimiter_detection() {
    // Commas appear inside quoted values, but only semicolons are consistent
    let csv_content = "name;description\n\"Smith, John\";Developer\n\"Doe, Jane\";Designer\n";
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "mixed.csv", csv_content);

    assert_eq!(detect_delimiter(&path).unwrap(), b';');
}

#[test]
fn test_single_line_file() {
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "single_line.csv", "name|age|city\n");

    assert_eq!(detect_delimiter(&path).unwrap(), b'|');
}

#[test]
fn test_large_sample_detection() {
    let mut csv_content = String::from("col1;col2;col3\n");
    for i in 0..300 {
        csv_content.push_str(&format!("{};{};{}\n", i, i * 2, i * 3));
    }
    let dir = TempDir::new().unwrap();
    let path = create_temp_file(&dir, "large_sample.csv", &csv_content);

    assert_eq!(detect_delimiter(&path).unwrap(), b';');
}

#[test]
fn test_detect_delimiter_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = detect_delimiter(&dir.path().join("missing.csv")).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn test_detect_format_by_extension() {
    let dir = TempDir::new().unwrap();
    let csv = create_temp_file(&dir, "data.csv", "a,b\n1,2\n");
    let tsv = create_temp_file(&dir, "data.tsv", "a\tb\n1\t2\n");
    let json = create_temp_file(&dir, "data.json", "[]");

    assert_eq!(detect_file_format(&csv).unwrap(), FileFormat::Csv);
    assert_eq!(detect_file_format(&tsv).unwrap(), FileFormat::Csv);
    assert_eq!(detect_file_format(&json).unwrap(), FileFormat::Json);
}

#[test]
fn test_detect_format_by_content() {
    let dir = TempDir::new().unwrap();
    let array = create_temp_file(&dir, "records.dat", "  \n[{\"a\": 1}]");
    let object = create_temp_file(&dir, "record.dat", "{\"a\": 1}");
    let table = create_temp_file(&dir, "table.dat", "a,b\n1,2\n");

    assert_eq!(detect_file_format(&array).unwrap(), FileFormat::Json);
    assert_eq!(detect_file_format(&object).unwrap(), FileFormat::Json);
    assert_eq!(detect_file_format(&table).unwrap(), FileFormat::Csv);
}
