//! Functions for generating random spanning trees.
use crate::buffers::SpanningTreeBuffer;
use crate::error::RecomError;
use crate::graph::{Edge, Graph};
use petgraph::unionfind::UnionFind;
use rand::rngs::SmallRng;
use rand::Rng;

pub trait SpanningTreeSampler {
    /// Samples a random spanning tree of `graph` using `rng`; inserts the
    /// tree into `buf`.
    ///
    /// Fails with [RecomError::DisconnectedSubgraph] if `graph` is not
    /// connected. (The error carries no district labels; callers that know
    /// them should fill them in.)
    fn random_spanning_tree(
        &mut self,
        graph: &Graph,
        buf: &mut SpanningTreeBuffer,
        rng: &mut SmallRng,
    ) -> Result<(), RecomError>;
}

/// Samples random spanning trees by drawing an independent uniform
/// weight in [0, 1) for every edge and taking the maximum-weight spanning
/// tree (Kruskal's algorithm).
///
/// This only approximates the uniform distribution over spanning trees,
/// but every spanning tree of a connected graph has non-zero probability.
pub struct RMSTSampler {
    /// Buffer for weighted edges (weight, edge index).
    edges_by_weight: Vec<(f64, usize)>,
}

impl RMSTSampler {
    /// Initializes a random MST sampler for a graph with approximate size `n`.
    pub fn new(n: usize) -> RMSTSampler {
        RMSTSampler {
            edges_by_weight: Vec::<(f64, usize)>::with_capacity(8 * n),
        }
    }
}

/// Given edges sorted by decreasing weight, finds the maximum spanning
/// tree of `graph` using Kruskal's algorithm and inserts it into `buf`.
fn maximum_spanning_tree(
    graph: &Graph,
    buf: &mut SpanningTreeBuffer,
    edges_by_weight: &[(f64, usize)],
) -> Result<(), RecomError> {
    buf.clear();
    let n = graph.node_count();
    if n == 0 {
        return Ok(());
    }

    // Union-find over the nodes keeps track of the components joined so far.
    let mut uf = UnionFind::<usize>::new(n);
    let n_edges = n - 1;
    for &(_, edge_idx) in edges_by_weight.iter() {
        if buf.edges.len() == n_edges {
            break;
        }
        let Edge(src, dst) = graph.edges[edge_idx];
        if uf.union(src, dst) {
            buf.st[src].push(dst);
            buf.st[dst].push(src);
            buf.edges.push(Edge(src, dst));
        }
    }
    if buf.edges.len() != n_edges {
        return Err(RecomError::DisconnectedSubgraph { a: 0, b: 0 });
    }
    Ok(())
}

impl SpanningTreeSampler for RMSTSampler {
    /// Draws a random spanning tree of a graph by sampling random edge weights
    /// and finding the maximum spanning tree (using Kruskal's algorithm).
    /// The buffer `buf` is updated in place.
    ///
    /// # Arguments
    /// * `graph` - The graph to form a spanning tree from.
    /// * `buf` - The buffer to insert the spanning tree into.
    /// * `rng` - A random number generator (used to generate random edge weights).
    fn random_spanning_tree(
        &mut self,
        graph: &Graph,
        buf: &mut SpanningTreeBuffer,
        rng: &mut SmallRng,
    ) -> Result<(), RecomError> {
        self.edges_by_weight.clear();
        for edge_idx in 0..graph.edges.len() {
            self.edges_by_weight.push((rng.gen::<f64>(), edge_idx));
        }
        // Weights are continuous; exact ties have probability zero.
        self.edges_by_weight.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
        maximum_spanning_tree(graph, buf, &self.edges_by_weight)
    }
}
