//! Chain configuration.
use crate::error::RecomError;
use crate::recom::RecomParams;
use serde::{Deserialize, Serialize};

/// Parameters of a ReCom chain run.
///
/// Parsed from JSON with camelCase keys, e.g.
/// `{"coolingRounds": 50, "samplingRounds": 200, "balanceTolerance": 0.05}`.
/// Missing keys take their defaults; unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Burn-in rounds whose records are discarded.
    pub cooling_rounds: usize,
    /// Rounds recorded into the ensemble.
    pub sampling_rounds: usize,
    /// Relative population tolerance ε, in (0, 1).
    pub balance_tolerance: f64,
    /// Failed cut attempts allowed per round.
    pub attempt_budget: usize,
    /// Log progress while the chain runs.
    pub verbose: bool,
}

impl Default for ChainConfig {
    fn default() -> ChainConfig {
        ChainConfig {
            cooling_rounds: 50,
            sampling_rounds: 200,
            balance_tolerance: 0.05,
            attempt_budget: 1000,
            verbose: false,
        }
    }
}

impl ChainConfig {
    /// Parses and validates a JSON configuration string.
    pub fn from_json_str(raw: &str) -> Result<ChainConfig, RecomError> {
        let config: ChainConfig =
            serde_json::from_str(raw).map_err(|e| RecomError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all parameters are in range.
    pub fn validate(&self) -> Result<(), RecomError> {
        if !(self.balance_tolerance > 0.0 && self.balance_tolerance < 1.0) {
            return Err(RecomError::InvalidConfig(format!(
                "balanceTolerance must be in (0, 1), got {}",
                self.balance_tolerance
            )));
        }
        if self.attempt_budget == 0 {
            return Err(RecomError::InvalidConfig(
                "attemptBudget must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The per-step parameters of this configuration.
    pub fn params(&self) -> RecomParams {
        RecomParams {
            balance_tolerance: self.balance_tolerance,
            attempt_budget: self.attempt_budget,
        }
    }
}
