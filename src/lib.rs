//! Library definition for gmcmc: ReCom ensembles for districting plan
//! outlier analysis.
pub mod buffers;
pub mod config;
pub mod district;
pub mod error;
pub mod graph;
pub mod init;
pub mod partition;
pub mod plan;
pub mod recom;
pub mod spanning_tree;
pub mod stats;
pub mod votes;

pub use crate::config::ChainConfig;
pub use crate::error::RecomError;
pub use crate::plan::{PlanGraph, Precinct};
pub use crate::recom::run::{multi_chain, run_chain, ChainDriver, ChainPhase, ChainResult};
pub use crate::recom::{RecomParams, RecomProposal, RecomStep, StepOutcome};
pub use crate::votes::{Party, VoteTally};
