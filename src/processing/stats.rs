// Statistical queries returning plain values
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;

use super::{compare_values, Arguments, ProcessingError};
use crate::data::{DataSet, Value};

/// Type of statistical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsType {
    RowCount,
    NullCount,
    Sum,
    Mean,
    Min,
    Max,
}

impl StatsType {
    fn needs_column(self) -> bool {
        !matches!(self, StatsType::RowCount | StatsType::NullCount)
    }
}

/// Statistical processor computing a single value from a dataset
pub struct StatsProcessor {
    column: Option<String>,
    stats_type: StatsType,
}

impl StatsProcessor {
    /// Create a new stats processor
    pub fn new(column: Option<String>, stats_type: StatsType) -> Self {
        StatsProcessor { column, stats_type }
    }

    /// Create a row count processor
    pub fn row_count() -> Self {
        Self::new(None, StatsType::RowCount)
    }

    /// Create a mean processor
    pub fn mean(column: &str) -> Self {
        Self::new(Some(column.to_string()), StatsType::Mean)
    }

    /// Create a sum processor
    pub fn sum(column: &str) -> Self {
        Self::new(Some(column.to_string()), StatsType::Sum)
    }

    pub fn from_arguments(stats_type: StatsType, args: &Arguments) -> Result<Self, ProcessingError> {
        let column = match args.get(0, "column") {
            Some(_) => Some(args.string(0, "column")?),
            None if stats_type.needs_column() => {
                return Err(ProcessingError::InvalidArgument(format!(
                    "{:?} needs a column",
                    stats_type
                )))
            }
            None => None,
        };
        Ok(Self::new(column, stats_type))
    }

    /// Get the non-null values of the configured column
    fn column_values<'a>(&self, input: &'a DataSet) -> Result<Vec<&'a Value>, ProcessingError> {
        let column = self.column.as_deref().unwrap_or_default();
        let index = input
            .schema
            .index_of(column)
            .ok_or_else(|| ProcessingError::ColumnNotFound(column.to_string()))?;

        Ok(input.column_values(index).filter(|v| !v.is_null()).collect())
    }

    /// Get numeric values from a column
    fn numeric_values(&self, input: &DataSet) -> Result<Vec<f64>, ProcessingError> {
        self.column_values(input)?
            .into_iter()
            .map(|value| {
                value.as_f64().ok_or_else(|| {
                    ProcessingError::InvalidOperation(format!(
                        "Column '{}' holds non-numeric value '{}'",
                        self.column.as_deref().unwrap_or_default(),
                        value
                    ))
                })
            })
            .collect()
    }

    /// Compute the statistic
    pub fn compute(&self, input: &DataSet) -> Result<Value, ProcessingError> {
        match self.stats_type {
            StatsType::RowCount => Ok(Value::from(input.len())),
            StatsType::NullCount => match &self.column {
                Some(column) => {
                    let index = input
                        .schema
                        .index_of(column)
                        .ok_or_else(|| ProcessingError::ColumnNotFound(column.clone()))?;
                    Ok(Value::from(input.column_values(index).filter(|v| v.is_null()).count()))
                }
                None => Ok(Value::from(input.null_count())),
            },
            StatsType::Sum => {
                let values = self.column_values(input)?;
                if values.iter().all(|v| matches!(v, Value::Integer(_))) {
                    let total = values
                        .iter()
                        .filter_map(|v| v.as_i64())
                        .try_fold(0i64, i64::checked_add)
                        .ok_or_else(|| {
                            ProcessingError::InvalidOperation(format!(
                                "Sum of column '{}' overflows a 64-bit integer",
                                self.column.as_deref().unwrap_or_default()
                            ))
                        })?;
                    Ok(Value::Integer(total))
                } else {
                    Ok(Value::Float(self.numeric_values(input)?.iter().sum()))
                }
            }
            StatsType::Mean => {
                let values = self.numeric_values(input)?;
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                Ok(Value::Float(values.iter().sum::<f64>() / values.len() as f64))
            }
            StatsType::Min => self.extreme(input, Ordering::Less),
            StatsType::Max => self.extreme(input, Ordering::Greater),
        }
    }

    fn extreme(&self, input: &DataSet, wanted: Ordering) -> Result<Value, ProcessingError> {
        let values = self.column_values(input)?;
        let best = values.into_iter().fold(None::<&Value>, |best, value| match best {
            Some(current) if compare_values(value, current) != wanted => Some(current),
            _ => Some(value),
        });
        Ok(best.cloned().unwrap_or(Value::Null))
    }
}
