// Pipeline replay
// Author: Gabriel Demetrios Lafis

use std::sync::Arc;

use log::debug;

use super::{PipelineRecord, ProxyError};
use crate::data::Value;
use crate::processing::{Capability, CapabilityRegistry, Outcome};

/// Result of replaying a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Replay<T> {
    /// The input after every container-producing step
    pub result: T,
    /// Plain values produced along the way, by operation name
    pub values: Vec<(String, Value)>,
}

/// Applies pipeline steps, in order, through a capability registry
pub struct PipelineReplayer<T> {
    capabilities: Arc<CapabilityRegistry<T>>,
}

impl<T: Clone> PipelineReplayer<T> {
    pub fn new(capabilities: impl Into<Arc<CapabilityRegistry<T>>>) -> Self {
        PipelineReplayer {
            capabilities: capabilities.into(),
        }
    }

    /// Replay `steps` on a copy of `input`; stops at the first failing step
    pub fn replay(&self, input: &T, steps: &[PipelineRecord]) -> Result<Replay<T>, ProxyError> {
        let mut current = input.clone();
        let mut values = Vec::new();

        for (index, step) in steps.iter().enumerate() {
            debug!("replay step {}: '{}'", index, step.operation);

            let outcome = match self.capabilities.resolve(&step.operation) {
                None => return Err(ProxyError::UnknownCapability(step.operation.clone())),
                Some(Capability::Attribute(getter)) => Outcome::Value(getter(&current)),
                Some(Capability::Method(method)) => method(&current, &step.arguments)?,
            };

            match outcome {
                Outcome::Object(next) => current = next,
                Outcome::Value(value) => values.push((step.operation.clone(), value)),
            }
        }

        Ok(Replay {
            result: current,
            values,
        })
    }
}
