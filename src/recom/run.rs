//! Runners for ReCom.
//!
//! A runner orchestrates the recombination step and handles setup,
//! burn-in, the collection of sample statistics, and (optionally)
//! multithreading.
//!
//! [`ChainDriver`] runs a single chain as an explicit state machine,
//! one round per call to [`ChainDriver::advance`]. [`multi_chain`] runs
//! several independent chains in parallel.
use super::{RecomParams, RecomStep, StepOutcome};
use crate::config::ChainConfig;
use crate::error::RecomError;
use crate::plan::PlanGraph;
use crate::stats::{ChainCounts, Ensemble, EnsembleSummary, NullWriter, SampleRecord, StatsWriter};
use crossbeam::scope;
use crossbeam_channel::unbounded;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Burn-in rounds between progress messages (verbose mode).
const BURN_IN_LOG_INTERVAL: usize = 25;
/// Sampling rounds between progress messages (verbose mode).
const SAMPLING_LOG_INTERVAL: usize = 20;

/// The phases of a chain run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPhase {
    /// The baseline has been computed but not yet reported.
    Initializing,
    /// Cooling rounds; records are discarded.
    BurningIn,
    /// Every round's record is appended to the ensemble.
    Sampling,
    /// All rounds have run.
    Done,
}

/// Everything a finished chain produced.
#[derive(Clone, Debug)]
pub struct ChainResult {
    /// The statistics of the plan the chain started from.
    pub baseline: SampleRecord,
    pub ensemble: Ensemble,
    pub counts: ChainCounts,
    /// The plan after the last round.
    pub plan: PlanGraph,
}

impl ChainResult {
    pub fn summary(&self) -> EnsembleSummary {
        self.ensemble.summary(&self.baseline)
    }
}

/// Drives a single ReCom chain through burn-in and sampling.
///
/// The chain owns its plan; every round mutates that one plan in place
/// (on commit) rather than restarting from the starting plan.
pub struct ChainDriver {
    plan: PlanGraph,
    config: ChainConfig,
    params: RecomParams,
    rng: SmallRng,
    recom: RecomStep,
    phase: ChainPhase,
    /// Rounds completed in the current phase.
    round: usize,
    baseline: SampleRecord,
    ensemble: Ensemble,
    counts: ChainCounts,
}

impl ChainDriver {
    /// Prepares a chain starting from `plan`.
    ///
    /// Fails with [RecomError::InvalidConfig] if `config` is out of range.
    pub fn new(plan: PlanGraph, config: ChainConfig, rng_seed: u64) -> Result<ChainDriver, RecomError> {
        config.validate()?;
        let baseline = SampleRecord::of(&plan);
        let recom = RecomStep::new(plan.node_count());
        Ok(ChainDriver {
            params: config.params(),
            ensemble: Ensemble::with_capacity(config.sampling_rounds),
            rng: SmallRng::seed_from_u64(rng_seed),
            plan,
            config,
            recom,
            phase: ChainPhase::Initializing,
            round: 0,
            baseline,
            counts: ChainCounts::default(),
        })
    }

    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    /// The chain's current plan.
    pub fn plan(&self) -> &PlanGraph {
        &self.plan
    }

    /// The statistics of the starting plan.
    pub fn baseline(&self) -> &SampleRecord {
        &self.baseline
    }

    /// The records sampled so far.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn counts(&self) -> &ChainCounts {
        &self.counts
    }

    /// The phase to enter once `phase` has run all of its rounds.
    fn next_phase(&self, phase: ChainPhase) -> ChainPhase {
        match phase {
            ChainPhase::Initializing if self.config.cooling_rounds > 0 => ChainPhase::BurningIn,
            ChainPhase::Initializing | ChainPhase::BurningIn if self.config.sampling_rounds > 0 => {
                ChainPhase::Sampling
            }
            _ => ChainPhase::Done,
        }
    }

    fn enter(&mut self, phase: ChainPhase, writer: &mut dyn StatsWriter) -> Result<(), RecomError> {
        self.phase = phase;
        self.round = 0;
        if phase == ChainPhase::Done {
            let summary = self.ensemble.summary(&self.baseline);
            writer.close(&summary, &self.counts)?;
            if self.config.verbose {
                info!(
                    samples = summary.samples,
                    baseline_gap = summary.baseline_gap,
                    baseline_percentile = summary.baseline_percentile,
                    mean_gap = summary.mean_gap,
                    committed = self.counts.committed,
                    rejected = self.counts.rejected,
                    "chain finished"
                );
            }
        }
        Ok(())
    }

    /// Runs one recombination step against the chain's plan.
    fn step(&mut self) -> Result<StepOutcome, RecomError> {
        let outcome = self.recom.step(&mut self.plan, &self.params, &mut self.rng)?;
        self.counts.observe(&outcome);
        if let StepOutcome::Rejected {
            dists,
            trees,
            attempts,
        } = &outcome
        {
            debug!(
                phase = ?self.phase,
                round = self.round,
                a = dists.0,
                b = dists.1,
                trees = *trees,
                attempts = *attempts,
                "step rejected"
            );
        }
        Ok(outcome)
    }

    /// Executes one round (or the initialization transition) and returns
    /// the phase the chain is in afterwards.
    ///
    /// If the recombination step itself fails, the round does not count
    /// and the plan is unchanged. If the writer fails, the round has
    /// already been applied, counted and recorded in the ensemble; calling
    /// `advance` again continues with the next round.
    pub fn advance(&mut self, writer: &mut dyn StatsWriter) -> Result<ChainPhase, RecomError> {
        match self.phase {
            ChainPhase::Initializing => {
                writer.init(&self.plan, &self.baseline)?;
                let next = self.next_phase(ChainPhase::Initializing);
                self.enter(next, writer)?;
            }
            ChainPhase::BurningIn => {
                self.step()?;
                self.round += 1;
                if self.config.verbose && self.round % BURN_IN_LOG_INTERVAL == 0 {
                    info!(
                        round = self.round,
                        of = self.config.cooling_rounds,
                        "burning in"
                    );
                }
                if self.round == self.config.cooling_rounds {
                    let next = self.next_phase(ChainPhase::BurningIn);
                    self.enter(next, writer)?;
                }
            }
            // A writer failure on the last round leaves the transition pending.
            ChainPhase::Sampling if self.round == self.config.sampling_rounds => {
                self.enter(ChainPhase::Done, writer)?;
            }
            ChainPhase::Sampling => {
                let outcome = self.step()?;
                self.round += 1;
                self.ensemble.push(SampleRecord::of(&self.plan));
                if let Some(record) = self.ensemble.records().last() {
                    writer.step(self.round as u64, &self.plan, &outcome, record)?;
                }
                if self.config.verbose && self.round % SAMPLING_LOG_INTERVAL == 0 {
                    info!(
                        round = self.round,
                        of = self.config.sampling_rounds,
                        committed = self.counts.committed,
                        rejected = self.counts.rejected,
                        "sampling"
                    );
                }
                if self.round == self.config.sampling_rounds {
                    self.enter(ChainPhase::Done, writer)?;
                }
            }
            ChainPhase::Done => {}
        }
        Ok(self.phase)
    }

    /// Runs the chain to completion.
    pub fn run(&mut self, writer: &mut dyn StatsWriter) -> Result<(), RecomError> {
        while self.advance(writer)? != ChainPhase::Done {}
        Ok(())
    }

    /// Consumes the driver, returning what the chain produced so far.
    pub fn into_result(self) -> ChainResult {
        ChainResult {
            baseline: self.baseline,
            ensemble: self.ensemble,
            counts: self.counts,
            plan: self.plan,
        }
    }
}

/// Runs a chain from `plan` to completion, streaming records to `writer`.
pub fn run_chain(
    plan: PlanGraph,
    config: ChainConfig,
    rng_seed: u64,
    writer: &mut dyn StatsWriter,
) -> Result<ChainResult, RecomError> {
    let mut driver = ChainDriver::new(plan, config, rng_seed)?;
    driver.run(writer)?;
    Ok(driver.into_result())
}

/// Runs `n_chains` independent chains from `plan` in parallel.
///
/// Chain `i` runs on its own copy of the plan with RNG seed
/// `rng_seed + i`. Results are returned in chain order; if any chain
/// fails, the error of the lowest-indexed failing chain is returned.
///
/// # Arguments
///
/// * `plan` - The plan every chain starts from (not modified).
/// * `config` - The configuration shared by all chains.
/// * `rng_seed` - The base RNG seed.
/// * `n_chains` - The number of chains (one thread each).
pub fn multi_chain(
    plan: &PlanGraph,
    config: &ChainConfig,
    rng_seed: u64,
    n_chains: usize,
) -> Result<Vec<ChainResult>, RecomError> {
    config.validate()?;
    let (result_send, result_recv) = unbounded();
    scope(|scope| {
        for chain_idx in 0..n_chains {
            let result_send = result_send.clone();
            let plan = plan.clone();
            let config = config.clone();
            scope.spawn(move |_| {
                let seed = rng_seed.wrapping_add(chain_idx as u64);
                let result = run_chain(plan, config, seed, &mut NullWriter);
                // The receiver outlives the scope.
                let _ = result_send.send((chain_idx, result));
            });
        }
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
    drop(result_send);

    let mut results: Vec<(usize, Result<ChainResult, RecomError>)> = result_recv.iter().collect();
    results.sort_by_key(|(chain_idx, _)| *chain_idx);
    results.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::votes::VoteTally;

    fn grid_plan() -> PlanGraph {
        let mut graph = Graph::rect_grid(6, 6);
        graph.votes = (0..36)
            .map(|i| if i % 3 == 0 { VoteTally::new(1, 0) } else { VoteTally::new(0, 1) })
            .collect();
        let assignments: Vec<u32> = (0..36).map(|i| (i % 6) as u32).collect();
        PlanGraph::from_graph(graph, &assignments).unwrap()
    }

    fn config(cooling_rounds: usize, sampling_rounds: usize) -> ChainConfig {
        ChainConfig {
            cooling_rounds,
            sampling_rounds,
            balance_tolerance: 0.2,
            ..ChainConfig::default()
        }
    }

    #[test]
    fn phases_advance_in_order() {
        let mut driver = ChainDriver::new(grid_plan(), config(2, 3), 1).unwrap();
        let mut writer = NullWriter;
        assert_eq!(driver.phase(), ChainPhase::Initializing);
        let phases: Vec<ChainPhase> = (0..7).map(|_| driver.advance(&mut writer).unwrap()).collect();
        assert_eq!(
            phases,
            vec![
                ChainPhase::BurningIn,
                ChainPhase::BurningIn,
                ChainPhase::Sampling,
                ChainPhase::Sampling,
                ChainPhase::Sampling,
                ChainPhase::Done,
                ChainPhase::Done,
            ]
        );
        assert_eq!(driver.ensemble().len(), 3);
        assert_eq!(driver.counts().rounds(), 5);
    }

    #[test]
    fn zero_rounds() {
        let mut driver = ChainDriver::new(grid_plan(), config(0, 0), 1).unwrap();
        assert_eq!(driver.advance(&mut NullWriter).unwrap(), ChainPhase::Done);
        assert!(driver.ensemble().is_empty());

        let mut driver = ChainDriver::new(grid_plan(), config(0, 4), 1).unwrap();
        assert_eq!(driver.advance(&mut NullWriter).unwrap(), ChainPhase::Sampling);
        driver.run(&mut NullWriter).unwrap();
        assert_eq!(driver.ensemble().len(), 4);
    }

    #[test]
    fn baseline_is_the_starting_plan() {
        let plan = grid_plan();
        let expected = SampleRecord::of(&plan);
        let result = run_chain(plan, config(10, 10), 7, &mut NullWriter).unwrap();
        assert_eq!(result.baseline, expected);
        assert!(result.plan.view().all_districts_connected());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = ChainConfig {
            attempt_budget: 0,
            ..ChainConfig::default()
        };
        assert!(matches!(
            ChainDriver::new(grid_plan(), bad.clone(), 1),
            Err(RecomError::InvalidConfig(_))
        ));
        assert!(multi_chain(&grid_plan(), &bad, 1, 2).is_err());
    }

    #[test]
    fn chains_are_deterministic() {
        let first = run_chain(grid_plan(), config(5, 20), 12345, &mut NullWriter).unwrap();
        let second = run_chain(grid_plan(), config(5, 20), 12345, &mut NullWriter).unwrap();
        assert_eq!(first.ensemble, second.ensemble);
        assert_eq!(first.counts, second.counts);
        assert!(first.plan.same_assignment(&second.plan));
    }

    #[test]
    fn multi_chain_matches_sequential_runs() {
        let plan = grid_plan();
        let results = multi_chain(&plan, &config(3, 8), 100, 3).unwrap();
        assert_eq!(results.len(), 3);
        for (idx, result) in results.iter().enumerate() {
            let expected = run_chain(plan.clone(), config(3, 8), 100 + idx as u64, &mut NullWriter).unwrap();
            assert_eq!(result.ensemble, expected.ensemble);
        }
        // The shared starting plan is untouched.
        assert!(plan.same_assignment(&grid_plan()));
    }

    /// Fails once, on the given sampling round.
    struct FailingWriter {
        fail_at: u64,
        failed: bool,
        closed: usize,
    }

    impl StatsWriter for FailingWriter {
        fn init(&mut self, _plan: &PlanGraph, _baseline: &SampleRecord) -> std::io::Result<()> {
            Ok(())
        }

        fn step(
            &mut self,
            round: u64,
            _plan: &PlanGraph,
            _outcome: &StepOutcome,
            _record: &SampleRecord,
        ) -> std::io::Result<()> {
            if round == self.fail_at && !self.failed {
                self.failed = true;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            Ok(())
        }

        fn close(&mut self, _summary: &EnsembleSummary, _counts: &ChainCounts) -> std::io::Result<()> {
            self.closed += 1;
            Ok(())
        }
    }

    #[test]
    fn writer_failure_keeps_ensemble_in_step() {
        for &fail_at in [1u64, 7, 20].iter() {
            let mut writer = FailingWriter {
                fail_at,
                failed: false,
                closed: 0,
            };
            let mut driver = ChainDriver::new(grid_plan(), config(3, 20), 5).unwrap();
            let err = driver.run(&mut writer).unwrap_err();
            assert!(matches!(err, RecomError::Io(_)));
            assert_eq!(driver.phase(), ChainPhase::Sampling);
            assert_eq!(driver.ensemble().len(), fail_at as usize);
            assert_eq!(driver.counts().rounds(), 3 + fail_at as usize);
            // The failed round's record describes the plan as it stands.
            assert_eq!(
                driver.ensemble().records().last(),
                Some(&SampleRecord::of(driver.plan()))
            );

            driver.run(&mut writer).unwrap();
            assert_eq!(driver.phase(), ChainPhase::Done);
            assert_eq!(driver.ensemble().len(), 20);
            assert_eq!(driver.counts().rounds(), 23);
            assert_eq!(writer.closed, 1);
        }
    }

    #[test]
    fn writer_failure_matches_uninterrupted_run() {
        let mut writer = FailingWriter {
            fail_at: 4,
            failed: false,
            closed: 0,
        };
        let mut driver = ChainDriver::new(grid_plan(), config(3, 10), 9).unwrap();
        assert!(driver.run(&mut writer).is_err());
        driver.run(&mut writer).unwrap();
        let expected = run_chain(grid_plan(), config(3, 10), 9, &mut NullWriter).unwrap();
        assert_eq!(driver.ensemble(), &expected.ensemble);
        assert!(driver.plan().same_assignment(&expected.plan));
    }
}
