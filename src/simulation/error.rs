//! Error types shared by every simulation module.

use thiserror::Error;

use super::agent::AgentType;
use super::brain::BrainType;

/// Errors raised by the simulation engine.
///
/// Configuration problems fail fast with one of these variants. Recoverable
/// population conditions (extinction, empty genome pools) are never reported
/// through this type; they are handled and logged by the orchestrator.
#[derive(Error, Debug)]
pub enum SimError {
    /// A layer was appended whose input width does not match the previous layer.
    #[error("layer expects {got} inputs but previous layer produces {expected}")]
    LayerWidth {
        /// Output width of the previous layer.
        expected: usize,
        /// Input width declared by the rejected layer.
        got: usize,
    },

    /// An input vector does not match the first layer's input width.
    #[error("brain expects {expected} inputs, got {got}")]
    InputWidth {
        /// Declared input width.
        expected: usize,
        /// Length of the supplied vector.
        got: usize,
    },

    /// A weight vector does not match the brain's weight count.
    #[error("genome has {got} weights, brain needs {expected}")]
    GenomeLength {
        /// Weight count of the target brain.
        expected: usize,
        /// Length of the supplied genome.
        got: usize,
    },

    /// A brain type was requested for an agent type that does not own it.
    #[error("brain {brain:?} is not part of the {agent:?} brain set")]
    InvalidBrain {
        /// Agent type the brain was requested for.
        agent: AgentType,
        /// Offending brain type.
        brain: BrainType,
    },

    /// The spatial index could not be built.
    #[error("spatial index error: {0}")]
    Spatial(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No worker thread pool could be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Filesystem failure (persistence, config loading).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;
