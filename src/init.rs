//! Utility functions for loading precinct graph and plan data.
use crate::error::RecomError;
use crate::plan::{PlanGraph, Precinct};
use crate::votes::{Party, VoteTally};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

/// A precinct's voting history: either the label of the party it voted
/// for, or explicit per-party counts.
#[derive(Deserialize)]
#[serde(untagged)]
enum VotingHistory {
    Party(String),
    Counts(VoteTally),
}

/// District labels may be strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum DistrictLabel {
    Name(String),
    Number(i64),
}

#[derive(Deserialize)]
struct RawPrecinct {
    adjacent_nodes: Vec<String>,
    population: i64,
    voting_history: VotingHistory,
    district: DistrictLabel,
}

/// Parses a plan from a JSON object keyed by precinct id, e.g.
///
/// ```json
/// {
///   "p1": {"adjacent_nodes": ["p2"], "population": 10,
///          "voting_history": "D", "district": "A"},
///   "p2": {"adjacent_nodes": ["p1"], "population": 12,
///          "voting_history": {"D": 40, "R": 35}, "district": "B"}
/// }
/// ```
///
/// Precincts are indexed in sorted id order. Adjacency may be listed on
/// one or both endpoints.
pub fn from_precinct_json_str(raw: &str) -> std::result::Result<PlanGraph, RecomError> {
    let data: BTreeMap<String, RawPrecinct> =
        serde_json::from_str(raw).map_err(|e| RecomError::MalformedInput(e.to_string()))?;

    let mut precincts = Vec::<Precinct>::with_capacity(data.len());
    let mut adjacency = Vec::<(String, String)>::new();
    for (id, node) in data.into_iter() {
        let votes = match node.voting_history {
            VotingHistory::Party(label) => match Party::from_label(&label) {
                Some(party) => VoteTally::from(party),
                None => {
                    return Err(RecomError::MalformedInput(format!(
                        "Precinct '{}' has unknown party label '{}'",
                        id, label
                    )))
                }
            },
            VotingHistory::Counts(tally) => tally,
        };
        let district = match node.district {
            DistrictLabel::Name(name) => name,
            DistrictLabel::Number(number) => number.to_string(),
        };
        adjacency.extend(
            node.adjacent_nodes
                .into_iter()
                .map(|neighbor| (id.clone(), neighbor)),
        );
        precincts.push(Precinct {
            id,
            population: node.population,
            votes,
            district,
        });
    }
    PlanGraph::load(&precincts, &adjacency)
}

/// Loads a plan from a precinct JSON file (see [from_precinct_json_str]).
///
/// # Arguments
///
/// * `path` - the path of the precinct JSON file.
pub fn from_precinct_json(path: &str) -> Result<PlanGraph> {
    let raw = fs::read_to_string(path).with_context(|| format!("Could not load graph {}", path))?;
    let plan = from_precinct_json_str(&raw).with_context(|| format!("Could not parse graph {}", path))?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "c": {"adjacent_nodes": ["a"], "population": 30, "voting_history": {"D": 1, "R": 4}, "district": 2},
        "a": {"adjacent_nodes": ["b", "c"], "population": 10, "voting_history": "D", "district": 1},
        "b": {"adjacent_nodes": ["a", "c"], "population": 20, "voting_history": "R", "district": 1}
    }"#;

    #[test]
    fn loads_mixed_schema() {
        let plan = from_precinct_json_str(TRIANGLE).unwrap();
        assert_eq!(plan.node_count(), 3);
        assert_eq!(plan.graph().ids, vec!["a", "b", "c"]);
        assert_eq!(plan.graph().pops, vec![10, 20, 30]);
        assert_eq!(plan.graph().edges.len(), 3);
        assert_eq!(plan.graph().votes[0], VoteTally::new(1, 0));
        assert_eq!(plan.graph().votes[2], VoteTally::new(1, 4));
        assert_eq!(plan.district_label(0), "1");
        assert_eq!(plan.district_label(1), "2");
        assert_eq!(plan.partition().assignments, vec![0, 0, 1]);
    }

    #[test]
    fn rejects_bad_input() {
        let cases = [
            r#"{"a": {"adjacent_nodes": ["zz"], "population": 1, "voting_history": "D", "district": "A"}}"#,
            r#"{"a": {"adjacent_nodes": [], "population": 1, "voting_history": "G", "district": "A"}}"#,
            r#"{"a": {"adjacent_nodes": [], "population": -1, "voting_history": "D", "district": "A"}}"#,
            r#"{"a": {"adjacent_nodes": [], "voting_history": "D", "district": "A"}}"#,
            r#"{"a": {"adjacent_nodes": ["a"], "population": 1, "voting_history": "D", "district": "A"}}"#,
            r#"{}"#,
            r#"[1, 2]"#,
        ];
        for raw in cases.iter() {
            let err = from_precinct_json_str(raw).unwrap_err();
            assert!(matches!(err, RecomError::MalformedInput(_)), "{}", raw);
        }
    }

    #[test]
    fn rejects_vote_totals_beyond_u32() {
        let cases = [
            r#"{"a": {"adjacent_nodes": [], "population": 1, "voting_history": {"D": 3000000000, "R": 3000000000}, "district": "A"}}"#,
            r#"{
                "a": {"adjacent_nodes": ["b"], "population": 1, "voting_history": {"D": 3000000000, "R": 0}, "district": "A"},
                "b": {"adjacent_nodes": ["a"], "population": 1, "voting_history": {"D": 3000000000, "R": 0}, "district": "B"}
            }"#,
        ];
        for raw in cases.iter() {
            let err = from_precinct_json_str(raw).unwrap_err();
            assert!(matches!(err, RecomError::MalformedInput(_)), "{}", raw);
        }
    }

    #[test]
    fn missing_file_has_context() {
        let err = from_precinct_json("/nonexistent/graph.json").unwrap_err();
        assert!(format!("{:#}", err).contains("Could not load graph"));
    }
}
