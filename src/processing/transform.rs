// Column-level transforms
// Author: Gabriel Demetrios Lafis

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use super::{Arguments, DataProcessor, ProcessingError};
use crate::data::{DataSet, DataType, Field, Row, Schema, Value};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

fn column_index(input: &DataSet, column: &str) -> Result<usize, ProcessingError> {
    input
        .schema
        .index_of(column)
        .ok_or_else(|| ProcessingError::ColumnNotFound(column.to_string()))
}

/// Select specific columns from a dataset
pub struct SelectTransform {
    columns: Vec<String>,
}

impl SelectTransform {
    /// Create a new select transform with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        SelectTransform { columns }
    }

    /// `select("a", "b")`, `select(["a", "b"])` or `select(columns=[..])`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let columns = args.columns("columns")?;
        if columns.is_empty() {
            return Err(ProcessingError::InvalidArgument(
                "select needs at least one column".to_string(),
            ));
        }
        Ok(Self::new(columns))
    }
}

impl DataProcessor for SelectTransform {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let indices = self
            .columns
            .iter()
            .map(|col| column_index(input, col))
            .collect::<Result<Vec<_>, _>>()?;

        let fields = indices.iter().map(|&i| input.schema.fields[i].clone()).collect();
        let mut result = DataSet::new(Schema::new(fields));
        result.metadata = input.metadata.clone();

        for row in &input.data {
            let values = indices.iter().map(|&i| row.values[i].clone()).collect();
            result.add_row(Row::new(values))?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "select"
    }
}

/// Drop columns from a dataset
pub struct DropColumnsTransform {
    columns: Vec<String>,
}

impl DropColumnsTransform {
    /// Create a new drop columns transform
    pub fn new(columns: Vec<String>) -> Self {
        DropColumnsTransform { columns }
    }

    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        Ok(Self::new(args.columns("columns")?))
    }
}

impl DataProcessor for DropColumnsTransform {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        for col in &self.columns {
            column_index(input, col)?;
        }

        let keep: Vec<usize> = input
            .schema
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !self.columns.contains(&field.name))
            .map(|(i, _)| i)
            .collect();

        let fields = keep.iter().map(|&i| input.schema.fields[i].clone()).collect();
        let mut result = DataSet::new(Schema::new(fields));
        result.metadata = input.metadata.clone();

        for row in &input.data {
            let values = keep.iter().map(|&i| row.values[i].clone()).collect();
            result.add_row(Row::new(values))?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "drop_columns"
    }
}

/// Rename columns in a dataset
pub struct RenameTransform {
    renames: Vec<(String, String)>, // (old_name, new_name)
}

impl RenameTransform {
    /// Create a new rename transform with the given column renames
    pub fn new(renames: Vec<(String, String)>) -> Self {
        RenameTransform { renames }
    }

    /// `rename(columns={old: new})`, `rename({old: new})` or `rename(old=new)`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let mapping = match args.get(0, "columns") {
            Some(Value::Map(map)) => map.clone(),
            Some(other) => {
                return Err(ProcessingError::InvalidArgument(format!(
                    "rename expects a mapping, got {}",
                    other.kind()
                )))
            }
            None => args.kwargs.clone(),
        };

        let renames = mapping
            .into_iter()
            .map(|(old, new)| match new {
                Value::String(new) => Ok((old, new)),
                other => Err(ProcessingError::InvalidArgument(format!(
                    "new name for '{}' must be a string, got {}",
                    old,
                    other.kind()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(renames))
    }
}

impl DataProcessor for RenameTransform {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        let mut fields = input.schema.fields.clone();

        for (old_name, new_name) in &self.renames {
            let i = column_index(input, old_name)?;
            fields[i].name = new_name.clone();
        }

        let mut names = HashSet::new();
        for field in &fields {
            if !names.insert(&field.name) {
                return Err(ProcessingError::InvalidArgument(format!(
                    "Duplicate column name '{}' after rename",
                    field.name
                )));
            }
        }

        let mut result = DataSet::new(Schema::new(fields));
        result.metadata = input.metadata.clone();
        result.data = input.data.clone();

        Ok(result)
    }

    fn name(&self) -> &str {
        "rename"
    }
}

/// Add a column holding the same value on every row
pub struct AddColumnTransform {
    name: String,
    value: Value,
    data_type: DataType,
}

impl AddColumnTransform {
    /// Create a new add column transform with a constant value
    pub fn with_constant(name: &str, data_type: DataType, value: Value) -> Self {
        AddColumnTransform {
            name: name.to_string(),
            value,
            data_type,
        }
    }

    /// `add_column(name, value)`; the column type follows the value
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let name = args.string(0, "name")?;
        let value = args.require(1, "value")?.clone();
        let data_type = match &value {
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::DateTime(_) => DataType::DateTime,
            Value::Null | Value::String(_) => DataType::String,
            Value::Array(_) | Value::Map(_) => {
                return Err(ProcessingError::NotSupported(
                    "nested values cannot fill a column".to_string(),
                ))
            }
        };
        Ok(Self::with_constant(&name, data_type, value))
    }
}

impl DataProcessor for AddColumnTransform {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        if input.schema.index_of(&self.name).is_some() {
            return Err(ProcessingError::InvalidArgument(format!(
                "Column '{}' already exists",
                self.name
            )));
        }

        let mut fields = input.schema.fields.clone();
        fields.push(Field::new(self.name.clone(), self.data_type, self.value.is_null()));

        let mut result = DataSet::new(Schema::new(fields));
        result.metadata = input.metadata.clone();

        for row in &input.data {
            let mut values = row.values.clone();
            values.push(self.value.clone());
            result.add_row(Row::new(values))?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "add_column"
    }
}

/// Cast columns to new data types
pub struct CastTransform {
    columns: IndexMap<String, DataType>,
}

impl CastTransform {
    /// Create a new cast transform
    pub fn new(columns: IndexMap<String, DataType>) -> Self {
        CastTransform { columns }
    }

    /// Cast a single column
    pub fn column(column: &str, target_type: DataType) -> Self {
        let mut columns = IndexMap::new();
        columns.insert(column.to_string(), target_type);
        Self::new(columns)
    }

    /// `cast(col="int")` or `cast({col: "int"})`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let mut requested: Vec<(&String, &Value)> = Vec::new();
        for arg in &args.args {
            let map = arg.as_map().ok_or_else(|| {
                ProcessingError::InvalidArgument(format!(
                    "cast expects a mapping of column to type, got {}",
                    arg.kind()
                ))
            })?;
            requested.extend(map.iter());
        }
        requested.extend(args.kwargs.iter());

        let mut columns = IndexMap::new();
        for (column, type_name) in requested {
            let data_type = type_name
                .as_str()
                .and_then(DataType::parse)
                .ok_or_else(|| {
                    ProcessingError::InvalidArgument(format!(
                        "unknown type '{}' for column '{}'",
                        type_name, column
                    ))
                })?;
            columns.insert(column.clone(), data_type);
        }

        if columns.is_empty() {
            return Err(ProcessingError::InvalidArgument(
                "cast needs at least one column".to_string(),
            ));
        }

        Ok(Self::new(columns))
    }
}

impl DataProcessor for CastTransform {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let targets = self
            .columns
            .iter()
            .map(|(column, target)| Ok((column_index(input, column)?, *target)))
            .collect::<Result<Vec<_>, ProcessingError>>()?;

        let mut fields = input.schema.fields.clone();
        for &(i, target) in &targets {
            fields[i].data_type = target;
        }

        let mut result = DataSet::new(Schema::new(fields));
        result.metadata = input.metadata.clone();

        for row in &input.data {
            let mut values = row.values.clone();
            for &(i, target) in &targets {
                values[i] = cast_value(&values[i], target)?;
            }
            result.add_row(Row::new(values))?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "cast"
    }
}

/// Cast a value to the target type. Null stays null for every type.
pub fn cast_value(value: &Value, target: DataType) -> Result<Value, ProcessingError> {
    let refused = || {
        ProcessingError::InvalidOperation(format!("Cannot cast '{}' to {}", value, target))
    };

    match (value, target) {
        (Value::Null, _) => Ok(Value::Null),

        (Value::Boolean(b), DataType::Boolean) => Ok(Value::Boolean(*b)),
        (Value::Boolean(b), DataType::Integer) => Ok(Value::Integer(i64::from(*b))),
        (Value::Boolean(b), DataType::Float) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),

        (Value::Integer(i), DataType::Boolean) => Ok(Value::Boolean(*i != 0)),
        (Value::Integer(i), DataType::Integer) => Ok(Value::Integer(*i)),
        (Value::Integer(i), DataType::Float) => Ok(Value::Float(*i as f64)),

        (Value::Float(f), DataType::Boolean) => Ok(Value::Boolean(*f != 0.0)),
        (Value::Float(f), DataType::Integer) => {
            float_to_integer(f.trunc()).map(Value::Integer).ok_or_else(refused)
        }
        (Value::Float(f), DataType::Float) => Ok(Value::Float(*f)),

        (Value::String(s), DataType::Boolean) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Boolean(true)),
            "false" | "no" | "0" => Ok(Value::Boolean(false)),
            _ => Err(refused()),
        },
        (Value::String(s), DataType::Integer) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::Integer(i));
            }
            match s.parse::<f64>() {
                Ok(f) if f.fract() == 0.0 => float_to_integer(f).map(Value::Integer).ok_or_else(refused),
                _ => Err(refused()),
            }
        }
        (Value::String(s), DataType::Float) => {
            s.trim().parse::<f64>().map(Value::Float).map_err(|_| refused())
        }
        (Value::String(s), DataType::DateTime) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .ok_or_else(refused),

        (Value::DateTime(dt), DataType::DateTime) => Ok(Value::DateTime(*dt)),

        (Value::Array(_) | Value::Map(_), _) => Err(ProcessingError::NotSupported(format!(
            "Cast from {} to {} not supported",
            value.kind(),
            target
        ))),
        (_, DataType::String) => Ok(Value::String(value.to_string())),

        _ => Err(ProcessingError::NotSupported(format!(
            "Cast from {} to {} not supported",
            value.kind(),
            target
        ))),
    }
}

/// An integral float as `i64`, or `None` when it does not fit
fn float_to_integer(f: f64) -> Option<i64> {
    // 2^63; i64::MAX itself is not representable as f64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
