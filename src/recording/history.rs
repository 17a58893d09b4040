// Recorded operations
// Author: Gabriel Demetrios Lafis

use std::slice;

use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::processing::{Arguments, Kwargs};

/// One completed invocation.
///
/// Operations recorded by a proxy always carry their arguments. An operation
/// loaded from elsewhere may lack them; it then reads as having none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operation")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kwargs: Option<Kwargs>,
}

impl Operation {
    /// Create an operation with its arguments
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Operation {
            name: name.into(),
            args: Some(arguments.args),
            kwargs: Some(arguments.kwargs),
        }
    }

    /// Create an operation with no argument structure at all
    pub fn bare(name: impl Into<String>) -> Self {
        Operation {
            name: name.into(),
            args: None,
            kwargs: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments; empty when absent
    pub fn args(&self) -> &[Value] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Keyword argument by name
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.as_ref().and_then(|kwargs| kwargs.get(name))
    }

    /// Whether both argument parts are present
    pub fn has_arguments(&self) -> bool {
        self.args.is_some() && self.kwargs.is_some()
    }

    /// The arguments, with missing parts read as empty
    pub fn arguments(&self) -> Arguments {
        Arguments {
            args: self.args.clone().unwrap_or_default(),
            kwargs: self.kwargs.clone().unwrap_or_default(),
        }
    }
}

/// Append-only log of completed invocations, in call order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    operations: Vec<Operation>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn last(&self) -> Option<&Operation> {
        self.operations.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    /// Names of the recorded operations, in order
    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(Operation::name).collect()
    }
}

impl From<Vec<Operation>> for History {
    fn from(operations: Vec<Operation>) -> Self {
        History { operations }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Operation;
    type IntoIter = slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
