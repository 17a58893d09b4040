// Recording module: operation-recording proxy and pipeline export
// Author: Gabriel Demetrios Lafis

mod history;
mod pipeline;
mod proxy;
mod replay;

pub use history::*;
pub use pipeline::*;
pub use proxy::*;
pub use replay::*;

use rand::Rng;
use thiserror::Error;

use crate::data::DataSet;
use crate::processing::{dataset_capabilities, sample_rows, CapabilityRegistry, ProcessingError};

/// Default fraction of the full dataset kept as the working sample
pub const DEFAULT_SAMPLE_RATIO: f64 = 0.3;

/// Represents an error raised by a recording proxy or a replay
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The name resolves to nothing on the current sample
    #[error("Unknown capability '{0}'")]
    UnknownCapability(String),
    /// The forwarded call failed; carries the operation's own error
    #[error(transparent)]
    Operation(#[from] ProcessingError),
}

/// A container type that can be sampled and driven through a recording proxy
pub trait Recordable: Sized {
    /// Draw a working sample holding `ratio` of the rows
    fn sample<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Self;

    /// The operation surface exposed by every instance of the type
    fn capabilities() -> CapabilityRegistry<Self>;
}

impl Recordable for DataSet {
    fn sample<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Self {
        sample_rows(self, ratio, rng)
    }

    fn capabilities() -> CapabilityRegistry<Self> {
        dataset_capabilities()
    }
}

/// Decides whether a call result replaces the proxy's sample.
///
/// Only consulted when a call returns an instance of the container type.
/// Returning `false` hands the instance back to the caller untouched.
pub trait ChainPolicy<T> {
    fn is_same_container(&self, current: &T, candidate: &T) -> bool;
}

/// Every instance of the container type chains
#[derive(Debug, Clone, Copy, Default)]
pub struct SameType;

impl<T> ChainPolicy<T> for SameType {
    fn is_same_container(&self, _current: &T, _candidate: &T) -> bool {
        true
    }
}

/// Chains when the wrapped predicate holds
pub struct ChainIf<F>(pub F);

impl<T, F> ChainPolicy<T> for ChainIf<F>
where
    F: Fn(&T, &T) -> bool,
{
    fn is_same_container(&self, current: &T, candidate: &T) -> bool {
        (self.0)(current, candidate)
    }
}
