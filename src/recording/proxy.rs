// Operation-recording proxy
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    ChainPolicy, History, Operation, PipelineDocument, PipelineRecord, PipelineReplayer,
    PipelineSerializer, ProxyError, Recordable, Replay, SameType, DEFAULT_SAMPLE_RATIO,
};
use crate::data::{DataSet, Value};
use crate::processing::{Arguments, Capability, CapabilityRegistry, Outcome};
use crate::typing::{apply_column_types, TypeAssigner};
use crate::utils::{validate_fraction, SessionConfig};

/// What a successful [`RecordingProxy::invoke`] hands back
pub enum Invocation<'p, T> {
    /// The call produced a new sample; keep calling through the proxy
    Chained(&'p mut RecordingProxy<T>),
    /// The call produced something else, returned as-is
    Returned(Outcome<T>),
}

impl<'p, T> Invocation<'p, T> {
    pub fn is_chained(&self) -> bool {
        matches!(self, Invocation::Chained(_))
    }

    /// The proxy, if the call chained
    pub fn proxy(self) -> Option<&'p mut RecordingProxy<T>> {
        match self {
            Invocation::Chained(proxy) => Some(proxy),
            Invocation::Returned(_) => None,
        }
    }

    /// The plain value, if the call returned one
    pub fn value(self) -> Option<Value> {
        match self {
            Invocation::Returned(Outcome::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The returned outcome, if the call did not chain
    pub fn outcome(self) -> Option<Outcome<T>> {
        match self {
            Invocation::Chained(_) => None,
            Invocation::Returned(outcome) => Some(outcome),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Invocation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Invocation::Chained(_) => f.write_str("Chained"),
            Invocation::Returned(outcome) => f.debug_tuple("Returned").field(outcome).finish(),
        }
    }
}

/// Wraps a working sample and records every completed invocation on it.
///
/// One proxy serves one caller at a time; `invoke` takes `&mut self`, so
/// sharing a proxy across threads needs an external lock. The full dataset
/// is held behind an [`Arc`] and may be shared between proxies.
pub struct RecordingProxy<T> {
    full: Arc<T>,
    sample: T,
    sample_ratio: f64,
    history: History,
    capabilities: Arc<CapabilityRegistry<T>>,
    chain_policy: Box<dyn ChainPolicy<T> + Send + Sync>,
}

impl<T: Recordable> RecordingProxy<T> {
    /// Create a proxy over a `sample_ratio` sample of `full`
    pub fn create(full: T, sample_ratio: f64) -> Result<Self, ProxyError> {
        Self::builder(full).sample_ratio(sample_ratio).build()
    }

    /// Create a proxy using the ratio and seed of a session configuration
    pub fn from_config(full: T, config: &SessionConfig) -> Result<Self, ProxyError> {
        Self::builder(full).session(config).build()
    }

    pub fn builder(full: T) -> RecordingProxyBuilder<T> {
        Self::shared(Arc::new(full))
    }

    /// Start a proxy over a full dataset other proxies may also hold
    pub fn shared(full: Arc<T>) -> RecordingProxyBuilder<T> {
        RecordingProxyBuilder {
            full,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            seed: None,
            capabilities: None,
            chain_policy: None,
        }
    }
}

impl<T> RecordingProxy<T> {
    /// Invoke `name` on the current sample.
    ///
    /// Attributes are read and returned without being recorded. Methods are
    /// called with `arguments`; once the call succeeds it is appended to the
    /// history. A container result accepted by the chain policy becomes the
    /// new sample and the proxy itself is returned; any other result is
    /// returned unchanged. A failed call leaves sample and history as they were.
    pub fn invoke(&mut self, name: &str, arguments: Arguments) -> Result<Invocation<'_, T>, ProxyError> {
        let capabilities = Arc::clone(&self.capabilities);
        let method = match capabilities.resolve(name) {
            None => return Err(ProxyError::UnknownCapability(name.to_string())),
            Some(Capability::Attribute(getter)) => {
                trace!("read attribute '{}'", name);
                return Ok(Invocation::Returned(Outcome::Value(getter(&self.sample))));
            }
            Some(Capability::Method(method)) => method,
        };

        let result = method(&self.sample, &arguments).map_err(|err| {
            warn!("'{}' failed: {}", name, err);
            ProxyError::Operation(err)
        })?;

        debug!(
            "recorded '{}' with {} args and {} kwargs",
            name,
            arguments.args.len(),
            arguments.kwargs.len()
        );
        self.history.record(Operation::new(name, arguments));

        match result {
            Outcome::Object(next) if self.chain_policy.is_same_container(&self.sample, &next) => {
                self.sample = next;
                Ok(Invocation::Chained(self))
            }
            other => Ok(Invocation::Returned(other)),
        }
    }

    /// Invoke `name` with no arguments
    pub fn call(&mut self, name: &str) -> Result<Invocation<'_, T>, ProxyError> {
        self.invoke(name, Arguments::new())
    }

    /// The live sample; reading it records nothing
    pub fn sample(&self) -> &T {
        &self.sample
    }

    /// The dataset the sample was drawn from
    pub fn full_dataset(&self) -> &Arc<T> {
        &self.full
    }

    pub fn sample_ratio(&self) -> f64 {
        self.sample_ratio
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn capabilities(&self) -> &CapabilityRegistry<T> {
        &self.capabilities
    }

    /// Build the pipeline for the current history
    pub fn pipeline(&self) -> Vec<PipelineRecord> {
        PipelineSerializer::build(&self.history)
    }

    /// Package the current history as a named pipeline document
    pub fn export_pipeline(&self, name: &str) -> PipelineDocument {
        PipelineDocument::from_history(name, &self.history).with_sample_ratio(self.sample_ratio)
    }
}

impl<T: Clone> RecordingProxy<T> {
    /// Replay the recorded history against the full dataset
    pub fn replay_on_full(&self) -> Result<Replay<T>, ProxyError> {
        PipelineReplayer::new(Arc::clone(&self.capabilities)).replay(&self.full, &self.pipeline())
    }
}

impl RecordingProxy<DataSet> {
    /// Run a type assigner on the live sample and return the retyped copy.
    ///
    /// Neither recorded nor applied to the sample.
    pub fn assign_column_types<A>(&self, assigner: &A) -> Result<DataSet, ProxyError>
    where
        A: TypeAssigner + ?Sized,
    {
        let types = assigner.assign_types(&self.sample)?;
        info!("assigning types to {} columns", types.len());
        Ok(apply_column_types(&self.sample, &types)?)
    }
}

impl<T: fmt::Debug> fmt::Debug for RecordingProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RecordingProxy")
            .field("sample", &self.sample)
            .field("sample_ratio", &self.sample_ratio)
            .field("history", &self.history)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Configures a [`RecordingProxy`]
pub struct RecordingProxyBuilder<T> {
    full: Arc<T>,
    sample_ratio: f64,
    seed: Option<u64>,
    capabilities: Option<Arc<CapabilityRegistry<T>>>,
    chain_policy: Option<Box<dyn ChainPolicy<T> + Send + Sync>>,
}

impl<T: Recordable> RecordingProxyBuilder<T> {
    /// Fraction of the full dataset to sample, in `(0, 1]`
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = ratio;
        self
    }

    /// Seed the sampler for a reproducible sample
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Take ratio and seed from a session configuration
    pub fn session(mut self, config: &SessionConfig) -> Self {
        self.sample_ratio = config.sample_ratio;
        self.seed = config.seed;
        self
    }

    /// Replace the type's default operation surface
    pub fn capabilities(mut self, capabilities: impl Into<Arc<CapabilityRegistry<T>>>) -> Self {
        self.capabilities = Some(capabilities.into());
        self
    }

    /// Replace the default [`SameType`] policy
    pub fn chain_policy<P>(mut self, policy: P) -> Self
    where
        P: ChainPolicy<T> + Send + Sync + 'static,
    {
        self.chain_policy = Some(Box::new(policy));
        self
    }

    /// Validate the ratio and draw the sample
    pub fn build(self) -> Result<RecordingProxy<T>, ProxyError> {
        validate_fraction(self.sample_ratio, "sample_ratio", false)
            .map_err(ProxyError::Configuration)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sample = self.full.sample(self.sample_ratio, &mut rng);

        info!("recording proxy created with sample ratio {}", self.sample_ratio);

        Ok(RecordingProxy {
            full: self.full,
            sample,
            sample_ratio: self.sample_ratio,
            history: History::new(),
            capabilities: self
                .capabilities
                .unwrap_or_else(|| Arc::new(T::capabilities())),
            chain_policy: self.chain_policy.unwrap_or_else(|| Box::new(SameType)),
        })
    }
}
