use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use workbench_core::{
    export, render, ExportMetadata, ProcessedResult, Record, TableRow, TABLE_COLUMNS,
};

#[test]
fn single_record_renders_one_row() {
    let result =
        ProcessedResult::from_value(&json!({ "input": "hello", "output": "HELLO" })).unwrap();
    let view = render(&result);
    assert_eq!(view.columns(), TABLE_COLUMNS);
    assert_eq!(
        view.rows,
        vec![TableRow {
            index: 1,
            input: "hello".to_string(),
            output: "HELLO".to_string(),
        }]
    );
}

#[test]
fn batch_renders_one_row_per_record() {
    let payload = json!([
        { "input": "a", "output": "A" },
        { "input": "b", "output": "B" },
        { "input": "c", "output": "C" },
    ]);
    let result = ProcessedResult::from_value(&payload).unwrap();
    let view = render(&result);
    assert_eq!(view.rows.len(), 3);
    assert_eq!(
        view.rows.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(view.rows[2].output, "C");
}

#[test]
fn json_text_payload_is_decoded() {
    let payload = Value::String(r#"[{"input":"x","output":"y"}]"#.to_string());
    let result = ProcessedResult::from_value(&payload).unwrap();
    assert_eq!(result, ProcessedResult::Batch(vec![Record::new("x", "y")]));
}

#[test]
fn scalars_are_malformed() {
    assert!(ProcessedResult::from_value(&json!(42)).is_err());
    assert!(ProcessedResult::from_value(&json!([1, 2])).is_err());
    assert!(ProcessedResult::from_value(&Value::String("not json".into())).is_err());
}

#[test]
fn export_preserves_shape_and_metadata() {
    let metadata = ExportMetadata {
        process_type: "cleaning".to_string(),
        dimensions: vec![1, 4],
        original_data: "hello".to_string(),
        timestamp: "2024-05-01T10:00:00".to_string(),
    };
    let single = ProcessedResult::Single(Record::new("hello", "HELLO"));
    let document: Value = serde_json::from_slice(&export(&single, &metadata)).unwrap();
    assert_eq!(
        document,
        json!({
            "timestamp": "2024-05-01T10:00:00",
            "process_type": "cleaning",
            "dimensions": [1, 4],
            "original_data": "hello",
            "processed_result": { "input": "hello", "output": "HELLO" },
        })
    );

    let batch = ProcessedResult::Batch(vec![Record::new("a", "b")]);
    let document: Value = serde_json::from_slice(&export(&batch, &metadata)).unwrap();
    assert!(document["processed_result"].is_array());
}
