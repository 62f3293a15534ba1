//! A lightweight precinct graph with population and vote metadata.
use crate::error::RecomError;
use crate::votes::VoteTally;

/// Edges are pairs of node indices.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Edge(pub usize, pub usize);

/// A lightweight graph with population and vote metadata.
///
/// Nodes are precincts, represented implicitly by the indices
/// `0..pops.len()`. Once built, a graph is never mutated by the chain;
/// only the district labels layered on top of it (see
/// [crate::partition::Partition]) change.
#[derive(Clone, Debug)]
pub struct Graph {
    /// External precinct identifiers, by node index.
    /// (Empty for subgraph buffers.)
    pub ids: Vec<String>,
    /// The graph's edges, represented as pairs of node indices `(u, v)`
    /// with `u < v`, sorted by the first element of the pair.
    pub edges: Vec<Edge>,
    /// The population at each node.
    pub pops: Vec<u32>,
    /// The two-party vote tally at each node.
    /// (Empty for subgraph buffers.)
    pub votes: Vec<VoteTally>,
    /// The graph's adjacencies (list-of-lists format).
    pub neighbors: Vec<Vec<usize>>,
    /// Maps between node indices and blocks of edges in `edges`.
    /// The nth element corresponds to the starting index of the
    /// block of edges in `edges` of the form (n, *).
    pub edges_start: Vec<usize>,
    /// The total population over all nodes.
    pub total_pop: u32,
}

impl Graph {
    /// Builds a graph from per-node data and an undirected edge list.
    ///
    /// Edges may be listed in either direction and more than once; they
    /// are symmetrized and deduplicated. Self-loops and out-of-range
    /// endpoints are rejected.
    pub fn from_edges(
        ids: Vec<String>,
        pops: Vec<u32>,
        votes: Vec<VoteTally>,
        edge_list: &[(usize, usize)],
    ) -> Result<Graph, RecomError> {
        let n = pops.len();
        if ids.len() != n || votes.len() != n {
            return Err(RecomError::MalformedInput(format!(
                "Mismatch: {} ids, {} populations, {} vote records",
                ids.len(),
                n,
                votes.len()
            )));
        }
        let mut neighbors = vec![Vec::<usize>::new(); n];
        for &(u, v) in edge_list.iter() {
            if u >= n || v >= n {
                return Err(RecomError::MalformedInput(format!(
                    "Edge ({}, {}) references a node outside of 0..{}",
                    u, v, n
                )));
            }
            if u == v {
                return Err(RecomError::MalformedInput(format!(
                    "Node {} is adjacent to itself",
                    ids[u]
                )));
            }
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
        for adj in neighbors.iter_mut() {
            adj.sort_unstable();
            adj.dedup();
        }

        let mut edges = Vec::<Edge>::with_capacity(edge_list.len());
        let mut edges_start = vec![0 as usize; n];
        for (index, adj) in neighbors.iter().enumerate() {
            edges_start[index] = edges.len();
            for &neighbor in adj.iter() {
                if neighbor > index {
                    edges.push(Edge(index, neighbor));
                }
            }
        }

        let total_pop = pops
            .iter()
            .try_fold(0 as u32, |acc, &p| acc.checked_add(p))
            .ok_or_else(|| {
                RecomError::MalformedInput("Total population overflows u32".to_string())
            })?;
        // Bounds every district tally and total below.
        let total_votes: u64 = votes
            .iter()
            .map(|tally| tally.dem as u64 + tally.rep as u64)
            .sum();
        if total_votes > u32::MAX as u64 {
            return Err(RecomError::MalformedInput(format!(
                "Total votes ({}) overflow u32",
                total_votes
            )));
        }
        Ok(Graph {
            ids,
            edges,
            pops,
            votes,
            neighbors,
            edges_start,
            total_pop,
        })
    }

    /// Returns a `width` × `height` grid graph with rook adjacency and a
    /// population of 1 at each node. Node `(x, y)` has index `y * width + x`.
    pub fn rect_grid(width: usize, height: usize) -> Graph {
        let n = width * height;
        let mut edge_list = Vec::<(usize, usize)>::with_capacity(2 * n);
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if x + 1 < width {
                    edge_list.push((idx, idx + 1));
                }
                if y + 1 < height {
                    edge_list.push((idx, idx + width));
                }
            }
        }
        let ids = (0..n).map(|idx| idx.to_string()).collect();
        // Grid construction can't produce a malformed graph.
        Graph::from_edges(ids, vec![1; n], vec![VoteTally::default(); n], &edge_list)
            .unwrap_or_else(|e| panic!("invalid grid: {}", e))
    }

    /// Returns a new graph with preallocated containers for `n` nodes and
    /// `8 * n` edges.
    pub fn new_buffer(n: usize) -> Graph {
        Graph {
            ids: Vec::new(),
            pops: Vec::<u32>::with_capacity(n),
            votes: Vec::new(),
            neighbors: vec![Vec::<usize>::with_capacity(8); n],
            edges: Vec::<Edge>::with_capacity(8 * n),
            edges_start: vec![0 as usize; n],
            total_pop: 0,
        }
    }

    /// Resets a graph's containers.
    /// (Useful when using a graph as a subgraph buffer.)
    pub fn clear(&mut self) {
        self.pops.clear();
        for adj in self.neighbors.iter_mut() {
            adj.clear();
        }
        self.edges.clear();
        self.edges_start.fill(0);
        self.total_pop = 0;
    }

    /// The number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.pops.len()
    }

    /// Returns whether `nodes` induce a connected subgraph.
    /// The empty set is (vacuously) connected.
    pub fn nodes_connected(&self, nodes: &[usize]) -> bool {
        if nodes.is_empty() {
            return true;
        }
        let mut in_set = vec![false; self.neighbors.len()];
        for &node in nodes.iter() {
            in_set[node] = true;
        }
        let mut visited = vec![false; self.neighbors.len()];
        let mut stack = vec![nodes[0]];
        visited[nodes[0]] = true;
        let mut seen = 1;
        while let Some(next) = stack.pop() {
            for &neighbor in self.neighbors[next].iter() {
                if in_set[neighbor] && !visited[neighbor] {
                    visited[neighbor] = true;
                    seen += 1;
                    stack.push(neighbor);
                }
            }
        }
        // `nodes` may contain duplicates.
        seen == in_set.iter().filter(|&&member| member).count()
    }
}
