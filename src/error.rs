//! Errors raised while building or stepping a chain.
use thiserror::Error;

/// Everything that can go wrong inside the ReCom engine.
///
/// A rejected recombination step is *not* an error; see
/// [crate::recom::StepOutcome].
#[derive(Debug, Error)]
pub enum RecomError {
    /// The input graph or its metadata is inconsistent.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// The subgraph induced by two districts is not connected, so it has
    /// no spanning tree.
    #[error("subgraph induced by districts {a} and {b} is disconnected")]
    DisconnectedSubgraph { a: usize, b: usize },
    /// A district has no neighboring districts.
    #[error("district {district} has no neighboring districts")]
    NoNeighbor { district: usize },
    /// A relabeling would break the partition invariant.
    #[error("invalid relabel: {0}")]
    InvalidRelabel(String),
    /// Chain parameters are out of range or could not be parsed.
    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
