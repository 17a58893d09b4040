// Pipeline serialization and replay tests
// Author: Gabriel Demetrios Lafis

mod common;

use serde_json::json;
use tempfile::tempdir;

use datalexir::{
    data::{DataSet, Value},
    processing::{dataset_capabilities, Arguments, ProcessingError},
    recording::{
        History, Operation, PipelineDocument, PipelineRecord, PipelineReplayer,
        PipelineSerializer, ProxyError, RecordingProxy, PIPELINE_VERSION,
    },
    utils::AppError,
};

use common::{column, people};

#[test]
fn test_build_normalizes_operations_without_arguments() {
    let history = History::from(vec![
        Operation::bare("drop_missing"),
        Operation::new("fill_missing", Arguments::new().arg(0)),
    ]);

    let pipeline = PipelineSerializer::build(&history);

    assert_eq!(
        serde_json::to_value(&pipeline).unwrap(),
        json!([
            {"operation": "drop_missing", "arguments": {"args": [], "kwargs": {}}},
            {"operation": "fill_missing", "arguments": {"args": [0], "kwargs": {}}},
        ])
    );
    assert!(!history.get(0).unwrap().has_arguments());
}

#[test]
fn test_history_loaded_without_argument_fields() {
    let history: History = serde_json::from_value(json!([
        {"operation": "drop_missing"},
        {"operation": "cast", "kwargs": {"colA": "int"}},
    ]))
    .unwrap();

    let pipeline = PipelineSerializer::build(&history);

    assert_eq!(pipeline[0].arguments, Arguments::new());
    assert!(pipeline[1].arguments.args.is_empty());
    assert_eq!(pipeline[1].arguments.kwargs.get("colA"), Some(&Value::from("int")));
}

#[test]
fn test_build_keeps_history_order_and_duplicates() {
    let history = History::from(vec![
        Operation::new("head", Arguments::new().arg(3)),
        Operation::bare("row_count"),
        Operation::new("head", Arguments::new().arg(3)),
    ]);

    let names: Vec<String> = PipelineSerializer::build(&history)
        .into_iter()
        .map(|record| record.operation)
        .collect();

    assert_eq!(names, vec!["head", "row_count", "head"]);
    assert_eq!(history.len(), 3);
}

#[test]
fn test_keyword_order_is_preserved() {
    let history = History::from(vec![Operation::new(
        "cast",
        Arguments::new().kwarg("score", "int").kwarg("colA", "float"),
    )]);

    let json = serde_json::to_string(&PipelineSerializer::build(&history)).unwrap();

    let score = json.find("score").unwrap();
    let col_a = json.find("colA").unwrap();
    assert!(score < col_a);
}

#[test]
fn test_document_file_round_trip() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();
    proxy
        .invoke("cast", Arguments::new().kwarg("colA", "int"))
        .unwrap();
    let document = proxy.export_pipeline("cleanup");

    let dir = tempdir().unwrap();
    for file in ["cleanup.json", "cleanup.yaml"] {
        let path = dir.path().join(file);
        document.to_file(&path).unwrap();

        let loaded = PipelineDocument::from_file(&path).unwrap();
        assert_eq!(loaded, document, "{}", file);
    }
    assert_eq!(document.version, PIPELINE_VERSION);
}

#[test]
fn test_document_rejects_unknown_extension() {
    let document = PipelineDocument::new("empty", Vec::new());
    let dir = tempdir().unwrap();

    let err = document.to_file(dir.path().join("pipeline.toml")).unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_replay_hand_written_pipeline() {
    let document = PipelineDocument::from_json(
        r#"{
            "version": "0.1",
            "name": "scores",
            "steps": [
                {"operation": "drop_missing", "arguments": {"args": [], "kwargs": {"subset": ["score"]}}},
                {"operation": "filter", "arguments": {"args": ["score", ">=", 6.0], "kwargs": {}}},
                {"operation": "mean", "arguments": {"args": ["score"], "kwargs": {}}},
                {"operation": "sort_values", "arguments": {"args": [], "kwargs": {"by": "id", "ascending": false}}},
                {"operation": "shape"}
            ]
        }"#,
    )
    .unwrap();

    let replayer = PipelineReplayer::new(dataset_capabilities());
    let replay = replayer.replay(&people(), &document.steps).unwrap();

    let ids: Vec<Value> = column(&replay.result, "id");
    assert_eq!(
        ids,
        vec![10, 9, 8, 7, 6, 4].into_iter().map(Value::Integer).collect::<Vec<_>>()
    );
    assert_eq!(replay.values[0], ("mean".to_string(), Value::Float(11.0)));
    assert_eq!(replay.values[1], ("shape".to_string(), Value::from(vec![6usize, 3])));
}

#[test]
fn test_replay_stops_at_unknown_operation() {
    let steps = vec![
        PipelineRecord {
            operation: "drop_missing".to_string(),
            arguments: Arguments::new(),
        },
        PipelineRecord {
            operation: "groupby".to_string(),
            arguments: Arguments::new().arg("colA"),
        },
    ];

    let err = PipelineReplayer::new(dataset_capabilities())
        .replay(&people(), &steps)
        .unwrap_err();

    assert!(matches!(err, ProxyError::UnknownCapability(ref name) if name == "groupby"));
}

#[test]
fn test_replay_propagates_operation_errors() {
    let steps = vec![PipelineRecord {
        operation: "cast".to_string(),
        arguments: Arguments::new().kwarg("colA", "complex"),
    }];

    let err = PipelineReplayer::<DataSet>::new(dataset_capabilities())
        .replay(&people(), &steps)
        .unwrap_err();

    assert!(matches!(
        err,
        ProxyError::Operation(ProcessingError::InvalidArgument(_))
    ));
}

#[test]
fn test_non_finite_arguments_cannot_be_saved() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.invoke("fill_missing", Arguments::new().arg(f64::NAN)).unwrap();
    proxy
        .invoke("filter", Arguments::new().arg("score").arg("<").arg(f64::INFINITY))
        .unwrap();
    let document = proxy.export_pipeline("nan");

    assert!(matches!(document.to_json(), Err(AppError::Serialization(_))));
    assert!(matches!(document.to_yaml(), Err(AppError::Serialization(_))));

    let dir = tempdir().unwrap();
    let path = dir.path().join("nan.json");
    assert!(matches!(document.to_file(&path), Err(AppError::Serialization(_))));
    assert!(!path.exists());

    // Nested inside a list argument
    let nested = PipelineDocument::new(
        "nested",
        vec![PipelineRecord {
            operation: "fill_missing".to_string(),
            arguments: Arguments::new().kwarg("value", vec![1.0, f64::NEG_INFINITY]),
        }],
    );
    assert!(matches!(nested.to_json(), Err(AppError::Serialization(_))));
}

#[test]
fn test_saved_float_arguments_replay_unchanged() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.invoke("fill_missing", Arguments::new().arg(-0.25)).unwrap();
    proxy.invoke("filter", Arguments::new().arg("score").arg("<=").arg(4.5)).unwrap();
    let document = proxy.export_pipeline("floats");

    let loaded = PipelineDocument::from_json(&document.to_json().unwrap()).unwrap();
    assert_eq!(loaded.steps, document.steps);

    let replay = PipelineReplayer::new(dataset_capabilities())
        .replay(&people(), &loaded.steps)
        .unwrap();
    assert_eq!(&replay.result, proxy.sample());
}
