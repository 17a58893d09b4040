// Pipeline serialization
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{History, Operation};
use crate::data::Value;
use crate::processing::Arguments;
use crate::utils::{AppError, AppResult};

/// Current pipeline document version
pub const PIPELINE_VERSION: &str = "0.1";

/// One replayable step: `{operation, arguments: {args, kwargs}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub operation: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl From<&Operation> for PipelineRecord {
    fn from(operation: &Operation) -> Self {
        PipelineRecord {
            operation: operation.name().to_string(),
            arguments: operation.arguments(),
        }
    }
}

/// Projects a history onto a portable pipeline
pub struct PipelineSerializer;

impl PipelineSerializer {
    /// Build the pipeline for a history.
    ///
    /// Output order is history order. Nothing is filtered, merged or checked,
    /// and the history is left untouched, so repeated calls agree.
    pub fn build<'a, I>(history: I) -> Vec<PipelineRecord>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        history.into_iter().map(PipelineRecord::from).collect()
    }
}

/// A built pipeline packaged for hand-off to a replay engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    pub version: String,
    pub name: String,
    /// Ratio of the sample the steps were recorded on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_ratio: Option<f64>,
    pub steps: Vec<PipelineRecord>,
}

impl PipelineDocument {
    pub fn new(name: impl Into<String>, steps: Vec<PipelineRecord>) -> Self {
        PipelineDocument {
            version: PIPELINE_VERSION.to_string(),
            name: name.into(),
            sample_ratio: None,
            steps,
        }
    }

    pub fn from_history(name: impl Into<String>, history: &History) -> Self {
        Self::new(name, PipelineSerializer::build(history))
    }

    pub fn with_sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = Some(ratio);
        self
    }

    pub fn to_json(&self) -> AppResult<String> {
        self.check_arguments()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        self.check_arguments()?;
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize in the named format, `json` or `yaml`
    pub fn to_format(&self, format: &str) -> AppResult<String> {
        match format {
            "json" => self.to_json(),
            "yaml" | "yml" => self.to_yaml(),
            other => Err(AppError::Config(format!("Unsupported pipeline format '{}'", other))),
        }
    }

    /// Save to a file; the extension picks the format
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let path = path.as_ref();
        let contents = self.to_format(extension(path)?)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load from a file; the extension picks the format
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match extension(path)? {
            "json" => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }
}

impl PipelineDocument {
    /// NaN and infinities have no JSON form and would load back as null
    fn check_arguments(&self) -> AppResult<()> {
        for (index, step) in self.steps.iter().enumerate() {
            let arguments = &step.arguments;
            if arguments.args.iter().chain(arguments.kwargs.values()).any(is_non_finite) {
                return Err(AppError::Serialization(format!(
                    "Step {} ('{}') has a non-finite float argument",
                    index, step.operation
                )));
            }
        }
        Ok(())
    }
}

fn is_non_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => !f.is_finite(),
        Value::Array(values) => values.iter().any(is_non_finite),
        Value::Map(map) => map.values().any(is_non_finite),
        _ => false,
    }
}

fn extension(path: &Path) -> AppResult<&str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext @ ("json" | "yaml" | "yml")) => Ok(ext),
        _ => Err(AppError::Config(format!(
            "Unsupported pipeline file: {}",
            path.display()
        ))),
    }
}
