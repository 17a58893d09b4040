// Type inference from column values
// Author: Gabriel Demetrios Lafis

use super::{ColumnTypes, TypeAssigner};
use crate::data::{DataSet, DataType, Value};
use crate::processing::{cast_value, ProcessingError};

/// Picks, per column, the narrowest type every non-null value casts to.
///
/// Candidates are tried in the order bool, int, float, datetime; a column
/// matching none of them, or holding only nulls, keeps its current type.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferredTypes;

const CANDIDATES: [DataType; 4] = [
    DataType::Boolean,
    DataType::Integer,
    DataType::Float,
    DataType::DateTime,
];

impl InferredTypes {
    fn infer(values: &[&Value]) -> Option<DataType> {
        if values.is_empty() {
            return None;
        }

        CANDIDATES.into_iter().find(|&candidate| {
            values.iter().all(|value| fits(value, candidate))
        })
    }
}

fn fits(value: &Value, candidate: DataType) -> bool {
    match (value, candidate) {
        // "0"/"1" would pass as booleans; only take real words or bools
        (Value::String(s), DataType::Boolean) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "false" | "yes" | "no")
        }
        (Value::Integer(_), DataType::Boolean) | (Value::Float(_), DataType::Boolean) => false,
        (Value::Float(_), DataType::Integer) => false,
        _ => cast_value(value, candidate).is_ok(),
    }
}

impl TypeAssigner for InferredTypes {
    fn assign_types(&self, sample: &DataSet) -> Result<ColumnTypes, ProcessingError> {
        let mut types = ColumnTypes::new();

        for (index, field) in sample.schema.fields.iter().enumerate() {
            let values: Vec<&Value> = sample.column_values(index).filter(|v| !v.is_null()).collect();
            let data_type = Self::infer(&values).unwrap_or(field.data_type);
            types.insert(field.name.clone(), data_type);
        }

        Ok(types)
    }
}
