// Recording proxy tests
// Author: Gabriel Demetrios Lafis

mod common;

use std::sync::Arc;

use serde_json::json;

use datalexir::{
    data::{DataSet, Value},
    processing::{Arguments, Outcome, ProcessingError},
    recording::{ChainIf, Invocation, PipelineSerializer, ProxyError, RecordingProxy},
    utils::SessionConfig,
};

use common::{column, people};

#[test]
fn test_full_ratio_keeps_every_row() {
    let proxy = RecordingProxy::create(people(), 1.0).unwrap();

    assert_eq!(proxy.sample().len(), 10);
    assert_eq!(proxy.sample(), proxy.full_dataset().as_ref());
    assert!(proxy.history().is_empty());
}

#[test]
fn test_invalid_ratio_is_rejected() {
    for ratio in [0.0, -0.5, 1.5, f64::NAN] {
        let err = RecordingProxy::create(people(), ratio).unwrap_err();
        assert!(matches!(err, ProxyError::Configuration(_)), "ratio {}", ratio);
    }
}

#[test]
fn test_sample_size_follows_ratio() {
    let proxy = RecordingProxy::builder(people())
        .sample_ratio(0.3)
        .seed(11)
        .build()
        .unwrap();

    assert_eq!(proxy.sample().len(), 3);
    assert_eq!(proxy.sample_ratio(), 0.3);
}

#[test]
fn test_seeded_samples_are_reproducible() {
    let config = SessionConfig {
        sample_ratio: 0.5,
        seed: Some(42),
    };

    let first = RecordingProxy::from_config(people(), &config).unwrap();
    let second = RecordingProxy::from_config(people(), &config).unwrap();

    assert_eq!(first.sample(), second.sample());
    assert_eq!(first.sample().len(), 5);

    // Sampled rows keep their original order
    let ids: Vec<i64> = column(first.sample(), "id")
        .iter()
        .filter_map(Value::as_i64)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn test_proxies_share_the_full_dataset() {
    let full = Arc::new(people());

    let mut first = RecordingProxy::shared(Arc::clone(&full))
        .sample_ratio(1.0)
        .build()
        .unwrap();
    let second = RecordingProxy::shared(Arc::clone(&full))
        .sample_ratio(0.5)
        .build()
        .unwrap();

    first.call("drop_missing").unwrap();

    assert!(Arc::ptr_eq(first.full_dataset(), second.full_dataset()));
    assert_eq!(first.full_dataset().len(), 10);
    assert_eq!(second.sample().len(), 5);
    assert_eq!(first.history().len(), 1);
    assert!(second.history().is_empty());
}

#[test]
fn test_drop_missing_without_arguments() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    proxy.call("drop_missing").unwrap();

    let pipeline = serde_json::to_value(proxy.pipeline()).unwrap();
    assert_eq!(
        pipeline,
        json!([{"operation": "drop_missing", "arguments": {"args": [], "kwargs": {}}}])
    );
    assert_eq!(proxy.sample().len(), 7);
}

#[test]
fn test_fill_missing_with_positional_value() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    proxy.invoke("fill_missing", Arguments::new().arg(0)).unwrap();

    let last = proxy.history().last().unwrap();
    assert_eq!(last.name(), "fill_missing");
    assert_eq!(last.args(), &[Value::Integer(0)]);
    assert!(last.arguments().kwargs.is_empty());
    assert_eq!(proxy.sample().null_count(), 0);
}

#[test]
fn test_cast_with_keyword_argument() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    proxy
        .invoke("cast", Arguments::new().kwarg("colA", "int"))
        .unwrap();

    let record = &proxy.pipeline()[0];
    assert_eq!(record.operation, "cast");
    assert!(record.arguments.args.is_empty());
    assert_eq!(record.arguments.kwargs.get("colA"), Some(&Value::from("int")));

    let values = column(proxy.sample(), "colA");
    assert_eq!(values[0], Value::Integer(1));
    assert_eq!(values[2], Value::Null);
}

#[test]
fn test_terminal_query_is_recorded_and_breaks_the_chain() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();
    proxy.invoke("fill_missing", Arguments::new().arg(0)).unwrap();
    proxy
        .invoke("cast", Arguments::new().kwarg("colA", "int"))
        .unwrap();
    let before = proxy.sample().clone();

    let invocation = proxy.call("row_count").unwrap();

    assert!(!invocation.is_chained());
    assert_eq!(invocation.value(), Some(Value::Integer(7)));
    assert_eq!(proxy.history().len(), 4);
    assert_eq!(proxy.history().last().unwrap().name(), "row_count");
    assert_eq!(proxy.sample(), &before);
}

#[test]
fn test_unknown_capability_records_nothing() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();

    let err = proxy.call("explode_everything").unwrap_err();

    assert!(matches!(err, ProxyError::UnknownCapability(ref name) if name == "explode_everything"));
    assert_eq!(proxy.history().len(), 1);
}

#[test]
fn test_history_follows_call_order() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    proxy.invoke("fill_missing", Arguments::new().arg(0)).unwrap();
    proxy.invoke("head", Arguments::new().arg(8)).unwrap();
    proxy.call("row_count").unwrap();
    proxy
        .invoke("sort_values", Arguments::new().arg("score").kwarg("ascending", false))
        .unwrap();

    assert_eq!(
        proxy.history().names(),
        vec!["fill_missing", "head", "row_count", "sort_values"]
    );
}

#[test]
fn test_failed_call_leaves_state_untouched() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();
    let before = proxy.sample().clone();

    let err = proxy
        .invoke("filter", Arguments::new().arg("missing").arg(">").arg(1))
        .unwrap_err();

    // The operation's own error comes through with its message intact
    assert!(matches!(
        err,
        ProxyError::Operation(ProcessingError::ColumnNotFound(ref column)) if column == "missing"
    ));
    assert_eq!(err.to_string(), "Column 'missing' not found");
    assert_eq!(proxy.history().len(), 1);
    assert_eq!(proxy.sample(), &before);
}

#[test]
fn test_attribute_reads_are_not_recorded() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    let columns = proxy.call("columns").unwrap().value();
    let shape = proxy.call("shape").unwrap().value();

    assert_eq!(columns, Some(Value::from(vec!["id", "colA", "score"])));
    assert_eq!(shape, Some(Value::from(vec![10usize, 3])));
    assert!(proxy.history().is_empty());
}

#[test]
fn test_chained_call_returns_the_proxy_itself() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    let address: *const RecordingProxy<DataSet> = &proxy;

    match proxy.call("drop_missing").unwrap() {
        Invocation::Chained(chained) => assert!(std::ptr::eq(chained, address)),
        Invocation::Returned(_) => panic!("drop_missing should chain"),
    }

    // The next call works on the new sample
    let rows = proxy.call("row_count").unwrap().value();
    assert_eq!(rows, Some(Value::Integer(7)));
}

#[test]
fn test_fluent_chaining() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();

    let rows = proxy
        .call("drop_missing")
        .unwrap()
        .proxy()
        .unwrap()
        .invoke("filter", Arguments::new().arg("id").arg(">").arg(4))
        .unwrap()
        .proxy()
        .unwrap()
        .call("row_count")
        .unwrap()
        .value();

    assert_eq!(rows, Some(Value::Integer(4)));
    assert_eq!(proxy.history().names(), vec!["drop_missing", "filter", "row_count"]);
}

#[test]
fn test_chain_policy_can_refuse_a_container() {
    let mut proxy = RecordingProxy::builder(people())
        .sample_ratio(1.0)
        .chain_policy(ChainIf(|current: &DataSet, candidate: &DataSet| {
            current.schema == candidate.schema
        }))
        .build()
        .unwrap();

    let invocation = proxy
        .invoke("select", Arguments::new().arg("id"))
        .unwrap();

    match invocation.outcome() {
        Some(Outcome::Object(selected)) => assert_eq!(selected.schema.fields.len(), 1),
        other => panic!("expected a detached dataset, got {:?}", other),
    }
    assert_eq!(proxy.sample().schema.fields.len(), 3);
    assert_eq!(proxy.history().len(), 1);

    // Schema-preserving calls still chain
    assert!(proxy.call("drop_missing").unwrap().is_chained());
}

#[test]
fn test_arguments_are_owned_by_the_history() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    let mut arguments = Arguments::new().kwarg("subset", vec!["colA"]);

    proxy.invoke("drop_missing", arguments.clone()).unwrap();
    arguments.kwargs.insert("subset".to_string(), Value::from(vec!["score"]));

    let recorded = proxy.history().get(0).unwrap();
    assert_eq!(recorded.kwarg("subset"), Some(&Value::from(vec!["colA"])));
    assert_eq!(proxy.sample().len(), 8);
}

#[test]
fn test_serializing_twice_gives_equal_pipelines() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();
    proxy.call("row_count").unwrap();

    let first = PipelineSerializer::build(proxy.history());
    let second = PipelineSerializer::build(proxy.history());

    assert_eq!(first, second);
    assert_eq!(first.len(), proxy.history().len());
    assert_eq!(proxy.history().len(), 2);
}

#[test]
fn test_replay_on_full_dataset() {
    let mut proxy = RecordingProxy::builder(people())
        .sample_ratio(0.5)
        .seed(3)
        .build()
        .unwrap();

    proxy.invoke("drop_missing", Arguments::new().kwarg("subset", "colA")).unwrap();
    proxy.call("row_count").unwrap();
    proxy.invoke("fill_missing", Arguments::new().arg(0.0)).unwrap();

    let replay = proxy.replay_on_full().unwrap();

    assert_eq!(replay.result.len(), 8);
    assert_eq!(replay.result.null_count(), 0);
    assert_eq!(replay.values, vec![("row_count".to_string(), Value::Integer(8))]);
    // Replay does not touch the proxy
    assert_eq!(proxy.history().len(), 3);
    assert_eq!(proxy.full_dataset().len(), 10);
}

#[test]
fn test_export_pipeline_carries_the_sample_ratio() {
    let mut proxy = RecordingProxy::create(people(), 1.0).unwrap();
    proxy.call("drop_missing").unwrap();

    let document = proxy.export_pipeline("cleanup");

    assert_eq!(document.name, "cleanup");
    assert_eq!(document.sample_ratio, Some(1.0));
    assert_eq!(document.steps, proxy.pipeline());
}
