//! Districting plans: a fixed precinct graph plus a mutable label layer.
use crate::district::DistrictView;
use crate::error::RecomError;
use crate::graph::Graph;
use crate::partition::Partition;
use crate::votes::VoteTally;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A precinct as handed over by a graph-loading collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct Precinct {
    /// Unique precinct identifier.
    pub id: String,
    /// Total population (must be non-negative).
    pub population: i64,
    /// Votes cast in the precinct.
    pub votes: VoteTally,
    /// Label of the district the precinct starts in.
    pub district: String,
}

/// The state of a ReCom chain: an immutable precinct [Graph] and the
/// district assignment layered on top of it.
///
/// The graph is shared, so cloning a plan only copies the assignment.
/// Labels are dense indices `0..num_districts()`, assigned in sorted
/// order of the original district label strings.
#[derive(Clone, Debug)]
pub struct PlanGraph {
    graph: Arc<Graph>,
    partition: Partition,
    labels: Arc<Vec<String>>,
    id_to_node: Arc<HashMap<String, usize>>,
}

impl PlanGraph {
    /// Builds a plan from precincts and an adjacency relation between
    /// precinct ids.
    ///
    /// Fails with [RecomError::MalformedInput] if an adjacency endpoint
    /// is not a known precinct, a population is negative, an id is
    /// duplicated, or there are no precincts at all.
    pub fn load(precincts: &[Precinct], adjacency: &[(String, String)]) -> Result<PlanGraph, RecomError> {
        if precincts.is_empty() {
            return Err(RecomError::MalformedInput("Plan has no precincts".to_string()));
        }

        let mut id_to_node = HashMap::<String, usize>::with_capacity(precincts.len());
        let mut pops = Vec::<u32>::with_capacity(precincts.len());
        for (node, precinct) in precincts.iter().enumerate() {
            if id_to_node.insert(precinct.id.clone(), node).is_some() {
                return Err(RecomError::MalformedInput(format!(
                    "Duplicate precinct id '{}'",
                    precinct.id
                )));
            }
            if precinct.population < 0 {
                return Err(RecomError::MalformedInput(format!(
                    "Precinct '{}' has negative population {}",
                    precinct.id, precinct.population
                )));
            }
            if precinct.population > u32::MAX as i64 {
                return Err(RecomError::MalformedInput(format!(
                    "Precinct '{}' has population {} (too large)",
                    precinct.id, precinct.population
                )));
            }
            pops.push(precinct.population as u32);
        }

        let mut edge_list = Vec::<(usize, usize)>::with_capacity(adjacency.len());
        for (src, dst) in adjacency.iter() {
            let lookup = |id: &String| {
                id_to_node.get(id).copied().ok_or_else(|| {
                    RecomError::MalformedInput(format!(
                        "Adjacency ({}, {}) references unknown precinct '{}'",
                        src, dst, id
                    ))
                })
            };
            edge_list.push((lookup(src)?, lookup(dst)?));
        }

        let labels: Vec<String> = precincts
            .iter()
            .map(|p| p.district.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let label_to_dist: HashMap<&str, u32> = labels
            .iter()
            .enumerate()
            .map(|(dist, label)| (label.as_str(), dist as u32))
            .collect();
        let assignments: Vec<u32> = precincts
            .iter()
            .map(|p| label_to_dist[p.district.as_str()])
            .collect();

        let graph = Graph::from_edges(
            precincts.iter().map(|p| p.id.clone()).collect(),
            pops,
            precincts.iter().map(|p| p.votes).collect(),
            &edge_list,
        )?;
        let partition = Partition::from_assignments(&graph, &assignments)?;
        Ok(PlanGraph {
            graph: Arc::new(graph),
            partition,
            labels: Arc::new(labels),
            id_to_node: Arc::new(id_to_node),
        })
    }

    /// Builds a plan from an existing graph and dense assignment vector.
    /// District `i` is labeled `i.to_string()`.
    pub fn from_graph(graph: Graph, assignments: &[u32]) -> Result<PlanGraph, RecomError> {
        let partition = Partition::from_assignments(&graph, assignments)?;
        let labels = (0..partition.num_dists).map(|d| d.to_string()).collect();
        let id_to_node = graph
            .ids
            .iter()
            .enumerate()
            .map(|(node, id)| (id.clone(), node))
            .collect();
        Ok(PlanGraph {
            graph: Arc::new(graph),
            partition,
            labels: Arc::new(labels),
            id_to_node: Arc::new(id_to_node),
        })
    }

    /// The underlying precinct graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The current district assignment.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Splits the plan into the shared graph and the mutable assignment.
    pub(crate) fn parts_mut(&mut self) -> (&Graph, &mut Partition) {
        (self.graph.as_ref(), &mut self.partition)
    }

    /// Read-only district queries over the current assignment.
    pub fn view(&self) -> DistrictView<'_> {
        DistrictView::new(&self.graph, &self.partition)
    }

    pub fn num_districts(&self) -> usize {
        self.partition.num_dists as usize
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The original label of district `dist`.
    pub fn district_label(&self, dist: usize) -> &str {
        &self.labels[dist]
    }

    /// The dense index of the district originally labeled `label`.
    pub fn district_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// The node index of precinct `id`.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.id_to_node.get(id).copied()
    }

    /// Assigns `nodes` to district `dist`, atomically.
    ///
    /// This is the only general mutator of a plan. Either every node
    /// moves, or (on error) nothing does.
    pub fn relabel(&mut self, nodes: &[usize], dist: usize) -> Result<(), RecomError> {
        if dist > u32::MAX as usize {
            return Err(RecomError::InvalidRelabel(format!("District {} is out of range", dist)));
        }
        let (graph, partition) = self.parts_mut();
        partition.relabel(graph, nodes, dist as u32)
    }

    /// (precinct id, district label) pairs in node order, for rendering.
    pub fn assignment_labels(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph
            .ids
            .iter()
            .zip(self.partition.assignments.iter())
            .map(move |(id, &dist)| (id.as_str(), self.labels[dist as usize].as_str()))
    }

    /// Returns whether two plans assign every precinct identically.
    pub fn same_assignment(&self, other: &PlanGraph) -> bool {
        self.partition.assignments == other.partition.assignments
    }
}
