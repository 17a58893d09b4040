// Shared test fixtures
// Author: Gabriel Demetrios Lafis

#![allow(dead_code)]

use datalexir::data::{DataSet, DataType, Field, Row, Schema, Value};

/// Ten rows; rows 3 and 7 miss `colA`, row 5 misses `score`
pub fn people() -> DataSet {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Integer, false),
        Field::new("colA", DataType::String, true),
        Field::new("score", DataType::Float, true),
    ]);

    let mut dataset = DataSet::new(schema);
    for id in 1..=10i64 {
        let col_a = if id == 3 || id == 7 {
            Value::Null
        } else {
            Value::String(id.to_string())
        };
        let score = if id == 5 {
            Value::Null
        } else {
            Value::Float(id as f64 * 1.5)
        };
        dataset
            .add_row(Row::new(vec![Value::Integer(id), col_a, score]))
            .unwrap();
    }
    dataset
}

/// Column `name` as a vector of values
pub fn column(dataset: &DataSet, name: &str) -> Vec<Value> {
    let index = dataset.schema.index_of(name).unwrap();
    dataset.column_values(index).cloned().collect()
}
