//! Statistics for Markov chains.

/// Chain step counts.
mod counts;
/// Per-plan election metrics.
mod election;
/// Sampled plan ensembles.
mod ensemble;
/// I/O for statistics.
mod writers;

pub use crate::stats::counts::ChainCounts;
pub use crate::stats::election::{
    district_efficiency_gap, efficiency_gap_of, plan_efficiency_gap, record, seats_won_by,
    wasted_votes, DistrictResult, EfficiencyGap, SampleRecord, Seats,
};
pub use crate::stats::ensemble::{Ensemble, EnsembleSummary};
pub use crate::stats::writers::{JSONLWriter, NullWriter, StatsWriter, TSVWriter};
