// Processing module: the operation surface of a dataset
// Author: Gabriel Demetrios Lafis

mod filter;
mod stats;
mod transform;

pub use filter::*;
pub use stats::*;
pub use transform::*;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{DataError, DataSet, Value};

/// Keyword arguments of an operation, in the order the caller supplied them
pub type Kwargs = IndexMap<String, Value>;

/// Represents a data processor that produces a new dataset
pub trait DataProcessor {
    /// Process a dataset and return a new dataset
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError>;

    /// Get the processor name
    fn name(&self) -> &str;
}

/// Represents an error in the processing module
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Positional and keyword arguments of one operation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl Arguments {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Look up an argument by keyword, falling back to its position
    pub fn get(&self, position: usize, name: &str) -> Option<&Value> {
        self.kwargs.get(name).or_else(|| self.args.get(position))
    }

    /// Like [`Arguments::get`], but a missing argument is an error
    pub fn require(&self, position: usize, name: &str) -> Result<&Value, ProcessingError> {
        self.get(position, name).ok_or_else(|| {
            ProcessingError::InvalidArgument(format!("missing argument '{}'", name))
        })
    }

    /// Required string argument
    pub fn string(&self, position: usize, name: &str) -> Result<String, ProcessingError> {
        let value = self.require(position, name)?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            ProcessingError::InvalidArgument(format!(
                "'{}' must be a string, got {}",
                name,
                value.kind()
            ))
        })
    }

    /// Optional non-negative integer argument
    pub fn count_or(
        &self,
        position: usize,
        name: &str,
        default: usize,
    ) -> Result<usize, ProcessingError> {
        match self.get(position, name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    ProcessingError::InvalidArgument(format!(
                        "'{}' must be a non-negative integer",
                        name
                    ))
                }),
        }
    }

    /// Optional boolean argument
    pub fn flag_or(&self, position: usize, name: &str, default: bool) -> Result<bool, ProcessingError> {
        match self.get(position, name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| {
                ProcessingError::InvalidArgument(format!("'{}' must be a boolean", name))
            }),
        }
    }

    /// Column names given either as the `name` keyword (a string or a list)
    /// or as the positional arguments.
    pub fn columns(&self, name: &str) -> Result<Vec<String>, ProcessingError> {
        match self.kwargs.get(name) {
            Some(value) => column_names(value, name),
            None => {
                let mut columns = Vec::new();
                for value in &self.args {
                    columns.extend(column_names(value, name)?);
                }
                Ok(columns)
            }
        }
    }
}

fn column_names(value: &Value, name: &str) -> Result<Vec<String>, ProcessingError> {
    let invalid = || {
        ProcessingError::InvalidArgument(format!("'{}' must be a column name or a list of names", name))
    };

    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(values) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// Result of invoking a capability
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// A new instance of the container type
    Object(T),
    /// Any other value; ends a chain of calls
    Value(Value),
}

impl<T> Outcome<T> {
    pub fn into_object(self) -> Option<T> {
        match self {
            Outcome::Object(object) => Some(object),
            Outcome::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Object(_) => None,
            Outcome::Value(value) => Some(value),
        }
    }
}

pub type Method<T> =
    Box<dyn Fn(&T, &Arguments) -> Result<Outcome<T>, ProcessingError> + Send + Sync>;
pub type Attribute<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;

/// Something a name can resolve to on a container
pub enum Capability<T> {
    /// Invocable with arguments
    Method(Method<T>),
    /// A plain value read off the container
    Attribute(Attribute<T>),
}

impl<T> Capability<T> {
    pub fn is_invocable(&self) -> bool {
        matches!(self, Capability::Method(_))
    }
}

impl<T> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Capability::Method(_) => f.write_str("Method"),
            Capability::Attribute(_) => f.write_str("Attribute"),
        }
    }
}

/// Name to capability lookup table for one container type
pub struct CapabilityRegistry<T> {
    capabilities: IndexMap<String, Capability<T>>,
}

impl<T> CapabilityRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        CapabilityRegistry {
            capabilities: IndexMap::new(),
        }
    }

    /// Register an invocable capability, replacing any previous one of that name
    pub fn method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<Outcome<T>, ProcessingError> + Send + Sync + 'static,
    {
        self.capabilities
            .insert(name.to_string(), Capability::Method(Box::new(method)));
        self
    }

    /// Register a plain attribute, replacing any previous capability of that name
    pub fn attribute<F>(mut self, name: &str, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.capabilities
            .insert(name.to_string(), Capability::Attribute(Box::new(getter)));
        self
    }

    /// Resolve a name to its capability
    pub fn resolve(&self, name: &str) -> Option<&Capability<T>> {
        self.capabilities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl<T> Default for CapabilityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CapabilityRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Adapt a processor constructor into a container-producing method
fn processor<P, F>(
    build: F,
) -> impl Fn(&DataSet, &Arguments) -> Result<Outcome<DataSet>, ProcessingError> + Send + Sync + 'static
where
    P: DataProcessor,
    F: Fn(&Arguments) -> Result<P, ProcessingError> + Send + Sync + 'static,
{
    move |input: &DataSet, args: &Arguments| Ok(Outcome::Object(build(args)?.process(input)?))
}

/// Adapt a statistic into a terminal method
fn statistic(
    stats_type: StatsType,
) -> impl Fn(&DataSet, &Arguments) -> Result<Outcome<DataSet>, ProcessingError> + Send + Sync + 'static
{
    move |input: &DataSet, args: &Arguments| {
        let processor = StatsProcessor::from_arguments(stats_type, args)?;
        Ok(Outcome::Value(processor.compute(input)?))
    }
}

/// The standard operation surface of [`DataSet`]
pub fn dataset_capabilities() -> CapabilityRegistry<DataSet> {
    CapabilityRegistry::new()
        // Operations producing a new dataset
        .method("drop_missing", processor(DropMissingProcessor::from_arguments))
        .method("fill_missing", processor(FillMissingProcessor::from_arguments))
        .method("cast", processor(CastTransform::from_arguments))
        .method("select", processor(SelectTransform::from_arguments))
        .method("drop_columns", processor(DropColumnsTransform::from_arguments))
        .method("rename", processor(RenameTransform::from_arguments))
        .method("add_column", processor(AddColumnTransform::from_arguments))
        .method("filter", processor(FilterProcessor::from_arguments))
        .method("head", processor(LimitProcessor::from_arguments))
        .method("skip", processor(SkipProcessor::from_arguments))
        .method("sort_values", processor(SortProcessor::from_arguments))
        .method("sample", processor(SampleProcessor::from_arguments))
        // Terminal queries
        .method("row_count", statistic(StatsType::RowCount))
        .method("null_count", statistic(StatsType::NullCount))
        .method("sum", statistic(StatsType::Sum))
        .method("mean", statistic(StatsType::Mean))
        .method("min", statistic(StatsType::Min))
        .method("max", statistic(StatsType::Max))
        // Attributes
        .attribute("columns", |input: &DataSet| Value::from(input.schema.names()))
        .attribute("shape", |input: &DataSet| {
            Value::from(vec![input.len(), input.schema.fields.len()])
        })
        .attribute("dtypes", |input: &DataSet| {
            Value::Map(
                input
                    .schema
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), Value::from(field.data_type.as_str())))
                    .collect(),
            )
        })
        .attribute("empty", |input: &DataSet| Value::Boolean(input.is_empty()))
}
