// Column typing: choosing and applying a type per column
// Author: Gabriel Demetrios Lafis

mod infer;

pub use infer::*;

use indexmap::IndexMap;

use crate::data::{DataSet, DataType};
use crate::processing::{CastTransform, DataProcessor, ProcessingError};

/// Target type per column name
pub type ColumnTypes = IndexMap<String, DataType>;

/// Chooses a type for the columns of a sample.
///
/// An interactive picker is one implementation; [`InferredTypes`] and
/// [`FixedTypes`] are the ones shipped here.
pub trait TypeAssigner {
    fn assign_types(&self, sample: &DataSet) -> Result<ColumnTypes, ProcessingError>;
}

/// Caller-supplied types; columns not listed keep their current type
#[derive(Debug, Clone, Default)]
pub struct FixedTypes {
    types: ColumnTypes,
}

impl FixedTypes {
    pub fn new(types: ColumnTypes) -> Self {
        FixedTypes { types }
    }

    pub fn with(mut self, column: &str, data_type: DataType) -> Self {
        self.types.insert(column.to_string(), data_type);
        self
    }
}

impl TypeAssigner for FixedTypes {
    fn assign_types(&self, sample: &DataSet) -> Result<ColumnTypes, ProcessingError> {
        let mut types = current_types(sample);
        for (column, data_type) in &self.types {
            match types.get_mut(column) {
                Some(slot) => *slot = *data_type,
                None => return Err(ProcessingError::ColumnNotFound(column.clone())),
            }
        }
        Ok(types)
    }
}

/// The schema's current type for every column
pub fn current_types(dataset: &DataSet) -> ColumnTypes {
    dataset
        .schema
        .fields
        .iter()
        .map(|field| (field.name.clone(), field.data_type))
        .collect()
}

/// Cast a dataset so each listed column has the given type
pub fn apply_column_types(dataset: &DataSet, types: &ColumnTypes) -> Result<DataSet, ProcessingError> {
    if types.is_empty() {
        return Ok(dataset.clone());
    }
    CastTransform::new(types.clone()).process(dataset)
}
