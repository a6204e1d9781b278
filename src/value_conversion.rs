use serde_json::{Number, Value};

/// A CSV cell after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    /// Exact integer, however many digits the cell has.
    Integer(Number),
    Float(f64),
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::String(s) => Value::String(s),
            CellValue::Integer(n) => Value::Number(n),
            // Only finite floats are ever produced by `coerce`.
            CellValue::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
        }
    }
}

/// Classifies a raw cell as an integer, a float or a string.
///
/// The integer pattern (optional `-` then ASCII digits) is checked before the
/// float parser, and integers keep every digit even past the `u64` range.
/// Anything the float parser rejects, or that is not a finite number, stays
/// a string, so `0xFF`, `1_000` and `NaN` are kept as text.
pub fn coerce(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::String(String::new());
    }

    if is_integer_literal(trimmed) {
        if let Some(n) = integer_number(trimmed) {
            return CellValue::Integer(n);
        }
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => CellValue::Float(f),
        _ => CellValue::String(trimmed.to_string()),
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Builds a `Number` from an integer literal without going through `f64`.
fn integer_number(literal: &str) -> Option<Number> {
    if let Ok(i) = literal.parse::<i64>() {
        return Some(i.into());
    }
    if let Ok(u) = literal.parse::<u64>() {
        return Some(u.into());
    }

    // JSON forbids leading zeros; anything reaching here is past i64/u64
    // so the trimmed digits are never empty.
    let (sign, digits) = match literal.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", literal),
    };
    format!("{}{}", sign, digits.trim_start_matches('0'))
        .parse::<Number>()
        .ok()
}

/// Converts a CSV field to a JSON value, honouring the per-column overrides
pub fn convert_field_value(
    field: &str,
    header_name: &str,
    no_type_conversion: bool,
    string_fields: &[String],
) -> Value {
    if no_type_conversion || string_fields.iter().any(|f| f == header_name) {
        Value::String(field.trim().to_string())
    } else {
        coerce(field).into()
    }
}

/// Renders a JSON value as the text of a CSV cell.
///
/// Strings are written as-is, `null` as an empty cell, and arrays or objects
/// as compact JSON.
pub fn json_value_to_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
