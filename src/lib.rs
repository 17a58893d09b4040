// DataLexir
// Author: Gabriel Demetrios Lafis

//! # DataLexir
//!
//! Explore a sample of a dataset by calling operations on it, and get back
//! the ordered list of what you did as a pipeline that can be replayed on
//! the full dataset or handed to another engine.
//!
//! ## Features
//!
//! - Recording proxy over a sampled dataset, forwarding calls by name
//! - Chaining through the proxy when a call yields a new dataset
//! - Pipeline export to JSON or YAML, and replay through a capability registry
//! - Column type inference and assignment outside the recorded history
//! - CSV loading and saving
//!
//! ## Example
//!
//! ```rust
//! use datalexir::{
//!     data::{DataSet, DataType, Field, Row, Schema, Value},
//!     processing::Arguments,
//!     recording::{PipelineSerializer, RecordingProxy},
//! };
//!
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Integer, false),
//!     Field::new("age", DataType::Integer, true),
//! ]);
//!
//! let mut dataset = DataSet::new(schema);
//! dataset.add_row(Row::new(vec![Value::Integer(1), Value::Integer(30)])).unwrap();
//! dataset.add_row(Row::new(vec![Value::Integer(2), Value::Null])).unwrap();
//!
//! let mut proxy = RecordingProxy::create(dataset, 1.0).unwrap();
//!
//! proxy
//!     .invoke("fill_missing", Arguments::new().arg(0))
//!     .unwrap()
//!     .proxy()
//!     .unwrap()
//!     .invoke("cast", Arguments::new().kwarg("age", "float"))
//!     .unwrap();
//!
//! let rows = proxy.call("row_count").unwrap().value();
//! assert_eq!(rows, Some(Value::Integer(2)));
//!
//! let pipeline = PipelineSerializer::build(proxy.history());
//! assert_eq!(pipeline.len(), 3);
//! assert_eq!(pipeline[0].operation, "fill_missing");
//! ```

pub mod data;
pub mod processing;
pub mod recording;
pub mod typing;
pub mod utils;

// Re-export main types
pub use data::{DataSet, DataType, Field, Row, Schema, Value};
pub use processing::{Arguments, Outcome};
pub use recording::{
    History, Invocation, Operation, PipelineDocument, PipelineRecord, PipelineSerializer,
    ProxyError, RecordingProxy,
};
pub use utils::Config;
