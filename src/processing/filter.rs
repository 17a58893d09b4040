// Row-level operations: missing values, filtering, slicing, ordering, sampling
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Arguments, DataProcessor, ProcessingError};
use crate::data::{DataSet, Row, Value};
use crate::utils::validate_fraction;

fn column_indices(input: &DataSet, columns: &[String]) -> Result<Vec<usize>, ProcessingError> {
    columns
        .iter()
        .map(|col| {
            input
                .schema
                .index_of(col)
                .ok_or_else(|| ProcessingError::ColumnNotFound(col.clone()))
        })
        .collect()
}

/// Total order used for sorting and comparisons. Null sorts first; numbers
/// compare across integer and float; mismatched kinds compare equal.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

/// Drop rows holding a null, optionally only looking at some columns
pub struct DropMissingProcessor {
    subset: Option<Vec<String>>,
}

impl DropMissingProcessor {
    pub fn new(subset: Option<Vec<String>>) -> Self {
        DropMissingProcessor { subset }
    }

    /// `drop_missing()` or `drop_missing(subset=[..])`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let subset = args.columns("subset")?;
        Ok(Self::new(if subset.is_empty() { None } else { Some(subset) }))
    }
}

impl DataProcessor for DropMissingProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let indices = match &self.subset {
            Some(columns) => Some(column_indices(input, columns)?),
            None => None,
        };

        let mut result = DataSet::empty_like(input);
        for row in &input.data {
            let missing = match &indices {
                Some(indices) => indices.iter().any(|&i| row.values[i].is_null()),
                None => row.has_null(),
            };
            if !missing {
                result.add_row(row.clone())?;
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "drop_missing"
    }
}

/// Replace nulls with a value
pub struct FillMissingProcessor {
    value: Value,
    columns: Option<Vec<String>>,
}

impl FillMissingProcessor {
    pub fn new(value: Value, columns: Option<Vec<String>>) -> Self {
        FillMissingProcessor { value, columns }
    }

    /// `fill_missing(value)`, `fill_missing(value, columns)` or `fill_missing(value, columns=[..])`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let value = args.require(0, "value")?.clone();
        if value.is_null() {
            return Err(ProcessingError::InvalidArgument(
                "fill value must not be null".to_string(),
            ));
        }

        if args.args.len() > 2 {
            return Err(ProcessingError::InvalidArgument(format!(
                "fill_missing takes at most 2 positional arguments, got {}",
                args.args.len()
            )));
        }

        let columns = match args.get(1, "columns") {
            None | Some(Value::Null) => None,
            Some(value) => Some(super::column_names(value, "columns")?),
        };
        Ok(Self::new(value, columns))
    }
}

impl DataProcessor for FillMissingProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let targets = match &self.columns {
            Some(columns) => column_indices(input, columns)?,
            None => (0..input.schema.fields.len()).collect(),
        };

        let mut result = DataSet::empty_like(input);
        for row in &input.data {
            let mut values = row.values.clone();
            for &i in &targets {
                if values[i].is_null() {
                    values[i] = self.value.clone();
                }
            }
            result.add_row(Row::new(values))?;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "fill_missing"
    }
}

/// Comparison used by [`FilterProcessor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
}

impl CompareOp {
    pub fn parse(op: &str) -> Option<CompareOp> {
        match op {
            "==" | "eq" => Some(CompareOp::Eq),
            "!=" | "ne" => Some(CompareOp::Ne),
            ">" | "gt" => Some(CompareOp::Gt),
            ">=" | "ge" => Some(CompareOp::Ge),
            "<" | "lt" => Some(CompareOp::Lt),
            "<=" | "le" => Some(CompareOp::Le),
            "contains" => Some(CompareOp::Contains),
            _ => None,
        }
    }

    fn matches(self, cell: &Value, operand: &Value) -> bool {
        if let CompareOp::Contains = self {
            return match (cell, operand) {
                (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
                _ => false,
            };
        }

        // Null only takes part in equality tests
        if cell.is_null() || operand.is_null() {
            let both = cell.is_null() && operand.is_null();
            return match self {
                CompareOp::Eq => both,
                CompareOp::Ne => !both,
                _ => false,
            };
        }

        let ordering = compare_values(cell, operand);
        match self {
            CompareOp::Eq => ordering == Ordering::Equal && comparable(cell, operand),
            CompareOp::Ne => ordering != Ordering::Equal || !comparable(cell, operand),
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less && comparable(cell, operand),
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater && comparable(cell, operand),
            CompareOp::Contains => false,
        }
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    a.kind() == b.kind() || (a.as_f64().is_some() && b.as_f64().is_some())
}

/// Keep rows where a column compares true against a value
pub struct FilterProcessor {
    column: String,
    op: CompareOp,
    value: Value,
}

impl FilterProcessor {
    pub fn new(column: &str, op: CompareOp, value: Value) -> Self {
        FilterProcessor {
            column: column.to_string(),
            op,
            value,
        }
    }

    /// Create a filter that keeps rows where a column equals a value
    pub fn equals(column: &str, value: Value) -> Self {
        Self::new(column, CompareOp::Eq, value)
    }

    /// Create a filter that keeps rows where a column is greater than a value
    pub fn greater_than(column: &str, value: Value) -> Self {
        Self::new(column, CompareOp::Gt, value)
    }

    /// `filter(column, op, value)`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let column = args.string(0, "column")?;
        let op_name = args.string(1, "op")?;
        let op = CompareOp::parse(&op_name).ok_or_else(|| {
            ProcessingError::InvalidArgument(format!("unknown comparison '{}'", op_name))
        })?;
        let value = args.require(2, "value")?.clone();
        Ok(Self::new(&column, op, value))
    }
}

impl DataProcessor for FilterProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let i = input
            .schema
            .index_of(&self.column)
            .ok_or_else(|| ProcessingError::ColumnNotFound(self.column.clone()))?;

        let mut result = DataSet::empty_like(input);
        for row in &input.data {
            if self.op.matches(&row.values[i], &self.value) {
                result.add_row(row.clone())?;
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "filter"
    }
}

/// Limit the number of rows in a dataset
pub struct LimitProcessor {
    limit: usize,
}

impl LimitProcessor {
    /// Create a new limit processor
    pub fn new(limit: usize) -> Self {
        LimitProcessor { limit }
    }

    /// `head()` keeps five rows, `head(n)` keeps `n`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        Ok(Self::new(args.count_or(0, "n", 5)?))
    }
}

impl DataProcessor for LimitProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        let mut result = DataSet::empty_like(input);
        result.data = input.data.iter().take(self.limit).cloned().collect();
        Ok(result)
    }

    fn name(&self) -> &str {
        "head"
    }
}

/// Skip a number of rows in a dataset
pub struct SkipProcessor {
    skip: usize,
}

impl SkipProcessor {
    /// Create a new skip processor
    pub fn new(skip: usize) -> Self {
        SkipProcessor { skip }
    }

    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let skip = args.count_or(0, "n", 0)?;
        Ok(Self::new(skip))
    }
}

impl DataProcessor for SkipProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        let mut result = DataSet::empty_like(input);
        result.data = input.data.iter().skip(self.skip).cloned().collect();
        Ok(result)
    }

    fn name(&self) -> &str {
        "skip"
    }
}

/// Stable sort on one or more columns
pub struct SortProcessor {
    by: Vec<String>,
    ascending: bool,
}

impl SortProcessor {
    pub fn new(by: Vec<String>, ascending: bool) -> Self {
        SortProcessor { by, ascending }
    }

    /// `sort_values(by)` or `sort_values(by=[..], ascending=false)`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let by = super::column_names(args.require(0, "by")?, "by")?;
        let ascending = args.flag_or(1, "ascending", true)?;
        Ok(Self::new(by, ascending))
    }
}

impl DataProcessor for SortProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        input.check_rows()?;
        let indices = column_indices(input, &self.by)?;

        let mut result = DataSet::empty_like(input);
        result.data = input.data.clone();
        result.data.sort_by(|a, b| {
            for &i in &indices {
                let ordering = compare_values(&a.values[i], &b.values[i]);
                if ordering != Ordering::Equal {
                    return if self.ascending { ordering } else { ordering.reverse() };
                }
            }
            Ordering::Equal
        });

        Ok(result)
    }

    fn name(&self) -> &str {
        "sort_values"
    }
}

/// Draw `round(fraction * rows)` rows without replacement.
///
/// Chosen rows keep their original relative order.
pub fn sample_rows<R: Rng + ?Sized>(input: &DataSet, fraction: f64, rng: &mut R) -> DataSet {
    let len = input.len();
    let amount = ((fraction * len as f64).round() as usize).min(len);

    let mut chosen = rand::seq::index::sample(rng, len, amount).into_vec();
    chosen.sort_unstable();

    let mut result = DataSet::empty_like(input);
    result.data = chosen.into_iter().map(|i| input.data[i].clone()).collect();
    result
}

/// Sample rows from a dataset
pub struct SampleProcessor {
    fraction: f64,
    seed: Option<u64>,
}

impl SampleProcessor {
    /// Create a new sample processor
    pub fn new(fraction: f64, seed: Option<u64>) -> Self {
        SampleProcessor { fraction, seed }
    }

    /// `sample(frac)` or `sample(frac=0.5, seed=7)`
    pub fn from_arguments(args: &Arguments) -> Result<Self, ProcessingError> {
        let fraction = args.require(0, "frac")?.as_f64().ok_or_else(|| {
            ProcessingError::InvalidArgument("'frac' must be a number".to_string())
        })?;
        let seed = match args.get(1, "seed") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .and_then(|s| u64::try_from(s).ok())
                    .ok_or_else(|| {
                        ProcessingError::InvalidArgument(
                            "'seed' must be a non-negative integer".to_string(),
                        )
                    })?,
            ),
        };
        Ok(Self::new(fraction, seed))
    }
}

impl DataProcessor for SampleProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        validate_fraction(self.fraction, "frac", true).map_err(ProcessingError::InvalidArgument)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(sample_rows(input, self.fraction, &mut rng))
    }

    fn name(&self) -> &str {
        "sample"
    }
}
