// Recording session example
// Author: Gabriel Demetrios Lafis

use datalexir::{
    data::{DataSet, DataType, Field, Row, Schema, Value},
    processing::Arguments,
    recording::RecordingProxy,
    typing::InferredTypes,
    utils::{init_logging_from_config, LoggingConfig},
    Config,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config {
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        ..Config::default()
    };
    init_logging_from_config(&config)?;

    // Raw data, as it would come out of a CSV file
    let schema = Schema::new(vec![
        Field::new("name", DataType::String, false),
        Field::new("age", DataType::String, true),
        Field::new("salary", DataType::String, true),
    ]);

    let mut dataset = DataSet::new(schema);
    let people = [
        ("Alice", Some("30"), Some("75000")),
        ("Bob", Some("25"), None),
        ("Charlie", None, Some("85000")),
        ("Diana", Some("28"), Some("70000")),
        ("Evan", Some("41"), Some("91000.5")),
        ("Fiona", Some("35"), Some("66000")),
    ];
    for (name, age, salary) in people {
        dataset.add_row(Row::new(vec![
            Value::from(name),
            age.map(Value::from).unwrap_or(Value::Null),
            salary.map(Value::from).unwrap_or(Value::Null),
        ]))?;
    }

    let mut proxy = RecordingProxy::builder(dataset)
        .session(&config.session)
        .sample_ratio(1.0)
        .build()?;

    // Types are picked outside the recorded history
    let typed = proxy.assign_column_types(&InferredTypes)?;
    let types: Vec<String> = typed
        .schema
        .fields
        .iter()
        .map(|field| format!("{}: {}", field.name, field.data_type))
        .collect();
    println!("Inferred types: {}", types.join(", "));

    proxy
        .invoke("drop_missing", Arguments::new().kwarg("subset", vec!["age"]))?
        .proxy()
        .ok_or("drop_missing did not chain")?
        .invoke("cast", Arguments::new().kwarg("age", "int").kwarg("salary", "float"))?;
    proxy.invoke("fill_missing", Arguments::new().arg(0.0))?;
    proxy.invoke("filter", Arguments::new().arg("age").arg(">").arg(26))?;

    if let Some(mean) = proxy.invoke("mean", Arguments::new().arg("salary"))?.value() {
        println!("Mean salary: {}", mean);
    }
    println!("Columns: {}", proxy.call("columns")?.value().unwrap_or(Value::Null));

    let document = proxy.export_pipeline(&config.pipeline.name);
    println!("\nRecorded pipeline:\n{}", document.to_format(&config.pipeline.format)?);

    let replay = proxy.replay_on_full()?;
    println!("\nReplayed on {} rows, kept {}", proxy.full_dataset().len(), replay.result.len());

    Ok(())
}
