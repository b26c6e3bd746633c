use serde_json::{json, Map, Value};

use crate::MalformedResultError;

/// One processed item: what went in and what the AI service made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub input: Value,
    pub output: Value,
}

impl Record {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: Value::String(input.into()),
            output: Value::String(output.into()),
        }
    }

    pub fn input_text(&self) -> String {
        display_text(&self.input)
    }

    pub fn output_text(&self) -> String {
        display_text(&self.output)
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            input: map.get("input").cloned().unwrap_or(Value::Null),
            output: map.get("output").cloned().unwrap_or(Value::Null),
        }
    }

    fn to_value(&self) -> Value {
        json!({ "input": self.input, "output": self.output })
    }
}

/// The backend may answer with a single record or a list of records; both
/// shapes are kept as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedResult {
    Single(Record),
    Batch(Vec<Record>),
}

impl ProcessedResult {
    /// Interprets a status payload. A JSON string is decoded first since the
    /// backend sometimes double-encodes the result.
    pub fn from_value(value: &Value) -> Result<Self, MalformedResultError> {
        match value {
            Value::String(text) => {
                let decoded: Value = serde_json::from_str(text)
                    .map_err(|err| MalformedResultError::new(format!("invalid JSON text: {err}")))?;
                if decoded.is_string() {
                    return Err(MalformedResultError::new("doubly encoded string"));
                }
                Self::from_value(&decoded)
            }
            Value::Object(map) => Ok(Self::Single(Record::from_object(map))),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(map) => Ok(Record::from_object(map)),
                    other => Err(MalformedResultError::new(format!(
                        "item {index} is {} instead of an object",
                        kind_name(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Batch),
            other => Err(MalformedResultError::new(format!(
                "expected an object or an array, got {}",
                kind_name(other)
            ))),
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            ProcessedResult::Single(record) => std::slice::from_ref(record),
            ProcessedResult::Batch(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn to_value(&self) -> Value {
        match self {
            ProcessedResult::Single(record) => record.to_value(),
            ProcessedResult::Batch(records) => {
                Value::Array(records.iter().map(Record::to_value).collect())
            }
        }
    }
}

pub const TABLE_COLUMNS: [&str; 3] = ["#", "Input", "Output"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub index: usize,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularView {
    pub rows: Vec<TableRow>,
}

impl TabularView {
    pub fn columns(&self) -> [&'static str; 3] {
        TABLE_COLUMNS
    }
}

/// One row per record, numbered from 1.
pub fn render(result: &ProcessedResult) -> TabularView {
    let rows = result
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| TableRow {
            index: i + 1,
            input: record.input_text(),
            output: record.output_text(),
        })
        .collect();
    TabularView { rows }
}

/// Context stored next to the result in an exported file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportMetadata {
    pub process_type: String,
    pub dimensions: Vec<u64>,
    pub original_data: String,
    pub timestamp: String,
}

/// The export document, shaped like the one `/export-processed-data/` returns.
pub fn export_document(result: &ProcessedResult, metadata: &ExportMetadata) -> Value {
    json!({
        "timestamp": metadata.timestamp,
        "process_type": metadata.process_type,
        "dimensions": metadata.dimensions,
        "original_data": metadata.original_data,
        "processed_result": result.to_value(),
    })
}

/// Pretty-printed JSON bytes of [`export_document`].
pub fn export(result: &ProcessedResult, metadata: &ExportMetadata) -> Vec<u8> {
    let document = export_document(result, metadata);
    // Serializing a `Value` cannot fail; fall back to compact output regardless.
    serde_json::to_vec_pretty(&document).unwrap_or_else(|_| document.to_string().into_bytes())
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_as_empty_cells() {
        let result = ProcessedResult::from_value(&json!({ "input": "only input" })).unwrap();
        let view = render(&result);
        assert_eq!(view.rows[0].input, "only input");
        assert_eq!(view.rows[0].output, "");
    }

    #[test]
    fn structured_output_is_shown_as_json_text() {
        let result =
            ProcessedResult::from_value(&json!([{ "input": "a", "output": { "label": "x" } }]))
                .unwrap();
        assert_eq!(render(&result).rows[0].output, r#"{"label":"x"}"#);
    }

    #[test]
    fn doubly_encoded_string_is_rejected() {
        let value = Value::String("\"inner\"".to_string());
        assert!(ProcessedResult::from_value(&value).is_err());
    }
}
