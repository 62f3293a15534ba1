//! The ReCom (recombination) proposal.
//!
//! A recombination step merges two adjacent districts, draws a random
//! spanning tree of the merged region, and cuts one tree edge so that the
//! two resulting pieces are population-balanced. Both pieces are
//! connected by construction (they are subtrees).
//!
//! See DeFord, Duchin, and Solomon, "Recombination: A family of Markov
//! chains for redistricting" (arXiv: 1911.05725).
use crate::buffers::{SpanningTreeBuffer, SplitBuffer, SubgraphBuffer};
use crate::error::RecomError;
use crate::graph::Graph;
use crate::partition::Partition;
use crate::plan::PlanGraph;
use crate::spanning_tree::{RMSTSampler, SpanningTreeSampler};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

pub mod run;

/// Parameters of a single recombination step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RecomParams {
    /// Relative population tolerance ε: a cut into pieces `a` and `b` is
    /// valid iff `|a - b| < ε (a + b)`.
    pub balance_tolerance: f64,
    /// The number of failed cut attempts (over all spanning trees drawn)
    /// before the step gives up.
    pub attempt_budget: usize,
}

impl Default for RecomParams {
    fn default() -> RecomParams {
        RecomParams {
            balance_tolerance: 0.05,
            attempt_budget: 1000,
        }
    }
}

impl RecomParams {
    /// Returns whether splitting a region into populations `a` and `b`
    /// is within tolerance.
    pub fn is_balanced(&self, a: u32, b: u32) -> bool {
        let diff = (a as f64 - b as f64).abs();
        diff < self.balance_tolerance * (a as f64 + b as f64)
    }
}

/// A (valid) ReCom proposal: the new contents of two districts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecomProposal {
    /// The label of the `a`-district.
    pub a_label: usize,
    /// The label of the `b`-district.
    pub b_label: usize,
    /// The population of the new `a`-district.
    pub a_pop: u32,
    /// The population of the new `b`-district.
    pub b_pop: u32,
    /// The node indices in the new `a`-district.
    pub a_nodes: Vec<usize>,
    /// The node indices in the new `b`-district.
    pub b_nodes: Vec<usize>,
}

impl RecomProposal {
    /// Returns a dummy proposal with preallocated node buffers of size `n`.
    pub fn new_buffer(n: usize) -> RecomProposal {
        RecomProposal {
            a_label: 0,
            b_label: 0,
            a_pop: 0,
            b_pop: 0,
            a_nodes: Vec::<usize>::with_capacity(n),
            b_nodes: Vec::<usize>::with_capacity(n),
        }
    }

    /// Clears the node buffers of the proposal.
    pub fn clear(&mut self) {
        self.a_nodes.clear();
        self.b_nodes.clear();
    }
}

/// The result of one recombination step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// A balanced cut was found and applied to the plan.
    Committed(RecomProposal),
    /// The attempt budget ran out; the plan is unchanged.
    Rejected {
        /// The districts that were merged.
        dists: (usize, usize),
        /// Spanning trees drawn.
        trees: usize,
        /// Cut edges tested.
        attempts: usize,
    },
}

impl StepOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, StepOutcome::Committed(_))
    }

    /// The districts that were merged in this step.
    pub fn dists(&self) -> (usize, usize) {
        match self {
            StepOutcome::Committed(proposal) => (proposal.a_label, proposal.b_label),
            StepOutcome::Rejected { dists, .. } => *dists,
        }
    }
}

/// The outcome of searching for balanced cuts, before anything is committed.
#[derive(Clone, Debug, PartialEq)]
pub enum CutSearch {
    /// A balanced cut was found on the `trees`-th tree after `attempts`
    /// failed edges.
    Found {
        proposal: RecomProposal,
        trees: usize,
        attempts: usize,
    },
    /// The attempt budget ran out.
    Exhausted { trees: usize, attempts: usize },
}

/// Picks a district uniformly at random, then one of its neighbors
/// uniformly at random.
pub fn random_dist_pair(
    graph: &Graph,
    partition: &Partition,
    rng: &mut SmallRng,
) -> Result<(usize, usize), RecomError> {
    let view = crate::district::DistrictView::new(graph, partition);
    let dist_a = rng.gen_range(0..partition.num_dists) as usize;
    let neighbors = view.neighboring_districts(dist_a);
    match neighbors.choose(rng) {
        Some(&dist_b) => Ok((dist_a, dist_b)),
        None => Err(RecomError::NoNeighbor { district: dist_a }),
    }
}

/// Orients the spanning tree in `tree` from `root` with a BFS and computes
/// the population below every node.
fn orient_tree(subgraph: &Graph, tree: &SpanningTreeBuffer, root: usize, buf: &mut SplitBuffer) {
    buf.deque.push_back(root);
    buf.visited[root] = true;
    while let Some(next) = buf.deque.pop_front() {
        buf.order.push(next);
        for &neighbor in tree.st[next].iter() {
            if !buf.visited[neighbor] {
                buf.visited[neighbor] = true;
                buf.deque.push_back(neighbor);
                buf.succ[next].push(neighbor);
                buf.pred[neighbor] = next;
            }
        }
    }
    // Children come after their parents in BFS order, so a reverse pass
    // accumulates subtree populations bottom-up.
    for &node in buf.order.iter().rev() {
        let below: u32 = buf.succ[node].iter().map(|&child| buf.tree_pops[child]).sum();
        buf.tree_pops[node] = subgraph.pops[node] + below;
    }
}

/// Fills `proposal` with the split obtained by cutting the tree edge
/// above `cut_node`: the subtree below the edge becomes the `a`-district.
fn extract_split(
    subgraph: &Graph,
    raw_nodes: &[usize],
    cut_node: usize,
    a: usize,
    b: usize,
    buf: &mut SplitBuffer,
    proposal: &mut RecomProposal,
) {
    proposal.clear();
    buf.deque.clear();
    buf.deque.push_back(cut_node);
    while let Some(next) = buf.deque.pop_front() {
        buf.in_a[next] = true;
        proposal.a_nodes.push(raw_nodes[next]);
        for &child in buf.succ[next].iter() {
            buf.deque.push_back(child);
        }
    }
    for index in 0..subgraph.node_count() {
        if !buf.in_a[index] {
            proposal.b_nodes.push(raw_nodes[index]);
        }
    }
    proposal.a_label = a;
    proposal.b_label = b;
    proposal.a_pop = buf.tree_pops[cut_node];
    proposal.b_pop = subgraph.total_pop - proposal.a_pop;
}

/// Searches random spanning trees of `subgraph` for a balanced cut.
///
/// Tree edges are tested in a freshly shuffled order for every tree.
/// Each failed edge counts against `params.attempt_budget`; once the
/// budget is spent, the search gives up.
///
/// # Arguments
///
/// * `subgraph` - The subgraph induced by the two merged districts.
/// * `raw_nodes` - Maps subgraph node indices to parent graph indices.
/// * `a`, `b` - The labels of the merged districts.
/// * `params` - Balance tolerance and attempt budget.
/// * `sampler` - Draws spanning trees.
/// * `st_buf`, `split_buf`, `proposal` - Scratch buffers.
/// * `rng` - Used for trees and edge order.
#[allow(clippy::too_many_arguments)]
pub fn find_balanced_cut(
    subgraph: &Graph,
    raw_nodes: &[usize],
    a: usize,
    b: usize,
    params: &RecomParams,
    sampler: &mut dyn SpanningTreeSampler,
    st_buf: &mut SpanningTreeBuffer,
    split_buf: &mut SplitBuffer,
    proposal: &mut RecomProposal,
    rng: &mut SmallRng,
) -> Result<CutSearch, RecomError> {
    let n = subgraph.node_count();
    let mut trees = 0;
    let mut attempts = 0;
    if n < 2 || params.attempt_budget == 0 {
        return Ok(CutSearch::Exhausted { trees, attempts });
    }
    loop {
        sampler
            .random_spanning_tree(subgraph, st_buf, rng)
            .map_err(|_| RecomError::DisconnectedSubgraph { a, b })?;
        trees += 1;

        split_buf.clear();
        let root = rng.gen_range(0..n);
        orient_tree(subgraph, st_buf, root, split_buf);
        split_buf
            .cut_candidates
            .extend(split_buf.order.iter().copied().filter(|&node| node != root));
        split_buf.cut_candidates.shuffle(rng);

        for idx in 0..split_buf.cut_candidates.len() {
            let node = split_buf.cut_candidates[idx];
            let below = split_buf.tree_pops[node];
            if params.is_balanced(below, subgraph.total_pop - below) {
                extract_split(subgraph, raw_nodes, node, a, b, split_buf, proposal);
                return Ok(CutSearch::Found {
                    proposal: proposal.clone(),
                    trees,
                    attempts,
                });
            }
            attempts += 1;
            if attempts >= params.attempt_budget {
                return Ok(CutSearch::Exhausted { trees, attempts });
            }
        }
    }
}

/// Reusable state for recombination steps on one plan.
pub struct RecomStep {
    sampler: RMSTSampler,
    subgraph_buf: SubgraphBuffer,
    st_buf: SpanningTreeBuffer,
    split_buf: SplitBuffer,
    proposal_buf: RecomProposal,
}

impl RecomStep {
    /// Allocates buffers for plans on graphs with `n` nodes.
    pub fn new(n: usize) -> RecomStep {
        RecomStep {
            sampler: RMSTSampler::new(n),
            subgraph_buf: SubgraphBuffer::new(n, n),
            st_buf: SpanningTreeBuffer::new(n),
            split_buf: SplitBuffer::new(n),
            proposal_buf: RecomProposal::new_buffer(n),
        }
    }

    /// Draws a recombination proposal for `plan` without modifying it.
    pub fn propose(
        &mut self,
        plan: &PlanGraph,
        params: &RecomParams,
        rng: &mut SmallRng,
    ) -> Result<(CutSearch, (usize, usize)), RecomError> {
        let (graph, partition) = (plan.graph(), plan.partition());
        let (dist_a, dist_b) = random_dist_pair(graph, partition, rng)?;
        partition.subgraph(graph, &mut self.subgraph_buf, dist_a, dist_b);
        let search = find_balanced_cut(
            &self.subgraph_buf.graph,
            &self.subgraph_buf.raw_nodes,
            dist_a,
            dist_b,
            params,
            &mut self.sampler,
            &mut self.st_buf,
            &mut self.split_buf,
            &mut self.proposal_buf,
            rng,
        )?;
        Ok((search, (dist_a, dist_b)))
    }

    /// Runs one recombination step against `plan`, committing the first
    /// balanced cut found. On [StepOutcome::Rejected] or on error, `plan`
    /// is untouched.
    pub fn step(
        &mut self,
        plan: &mut PlanGraph,
        params: &RecomParams,
        rng: &mut SmallRng,
    ) -> Result<StepOutcome, RecomError> {
        let (search, dists) = self.propose(plan, params, rng)?;
        match search {
            CutSearch::Found { proposal, .. } => {
                let (_, partition) = plan.parts_mut();
                partition.update(&proposal);
                Ok(StepOutcome::Committed(proposal))
            }
            CutSearch::Exhausted { trees, attempts } => Ok(StepOutcome::Rejected {
                dists,
                trees,
                attempts,
            }),
        }
    }
}
