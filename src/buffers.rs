//! Buffer data structures to avoid memory reallocation.
pub use self::spanning_tree::SpanningTreeBuffer;
pub use self::split::SplitBuffer;
pub use self::subgraph::SubgraphBuffer;

/// Buffers are intended to be lightweight, reusable containers
/// that improve the efficiency of inner loops. In most buffers,
/// fields are intended to be mutated directly, and invariants
/// are not strictly enforced.

/// Buffer for subgraphs.
mod subgraph {
    use crate::graph::Graph;

    /// A reusable buffer for subgraphs of a [Graph] (the "parent graph").
    #[derive(Clone, Debug)]
    pub struct SubgraphBuffer {
        /// The nodes in the subgraph (as parent graph indices).
        pub raw_nodes: Vec<usize>,
        /// A mapping between node IDs in the parent graph and the indices
        /// of `raw_nodes` (which are node IDs in `graph`). If a node
        /// does not appear in the subgraph, its index is `None`.
        pub node_to_idx: Vec<Option<usize>>,
        /// A subgraph of the parent graph, with nodes relabeled to have
        /// consecutive node IDs.
        pub graph: Graph,
    }

    impl SubgraphBuffer {
        /// Creates a new [SubgraphBuffer] of size `b` for a graph of size `n`.
        pub fn new(n: usize, b: usize) -> SubgraphBuffer {
            SubgraphBuffer {
                raw_nodes: Vec::<usize>::with_capacity(b),
                node_to_idx: vec![None; n],
                graph: Graph::new_buffer(b),
            }
        }

        /// Resets the buffer.
        pub fn clear(&mut self) {
            for &node in self.raw_nodes.iter() {
                self.node_to_idx[node] = None;
            }
            self.raw_nodes.clear();
            self.graph.clear();
        }

        /// The number of nodes currently in the subgraph.
        pub fn len(&self) -> usize {
            self.raw_nodes.len()
        }

        pub fn is_empty(&self) -> bool {
            self.raw_nodes.is_empty()
        }
    }
}

/// Buffer for spanning trees.
mod spanning_tree {
    use crate::graph::Edge;

    /// A reusable spanning tree buffer.
    #[derive(Clone, Debug)]
    pub struct SpanningTreeBuffer {
        /// The neighbors of each node in the tree (list-of-lists representation).
        pub st: Vec<Vec<usize>>,
        /// The tree's edges, in the order they were added.
        pub edges: Vec<Edge>,
    }

    impl SpanningTreeBuffer {
        /// Creates a buffer for a spanning tree of a subgraph
        /// within a graph of size `n`.
        pub fn new(n: usize) -> SpanningTreeBuffer {
            SpanningTreeBuffer {
                st: vec![Vec::<usize>::with_capacity(8); n],
                edges: Vec::<Edge>::with_capacity(n),
            }
        }

        /// Resets the buffer.
        pub fn clear(&mut self) {
            for node in self.st.iter_mut() {
                node.clear();
            }
            self.edges.clear();
        }
    }
}

/// Buffer for spanning tree splits (used in ReCom).
mod split {
    use std::collections::VecDeque;

    /// A reusable buffer for splits of a spanning tree.
    ///
    /// Finding population-balanced cuts of a spanning tree is the key
    /// step of a recombination. A BFS orients the tree from a root; every
    /// tree edge is then `(pred[u], u)` for a unique non-root node `u`,
    /// and cutting it separates the subtree below `u` from the rest.
    pub struct SplitBuffer {
        /// Boolean representation of whether a node has been visited in the BFS.
        pub visited: Vec<bool>,
        /// The predecessor of each node in the BFS orientation.
        pub pred: Vec<usize>,
        /// The successors of each node in the BFS orientation.
        pub succ: Vec<Vec<usize>>,
        /// Nodes in BFS order (root first).
        pub order: Vec<usize>,
        /// A deque used for the BFS and for collecting subtrees.
        pub deque: VecDeque<usize>,
        /// The populations of the subtrees rooted at each node
        /// in the BFS orientation.
        pub tree_pops: Vec<u32>,
        /// Non-root nodes, each standing for the tree edge above it,
        /// in the order they will be tested.
        pub cut_candidates: Vec<usize>,
        /// Boolean representation of whether a node is in the `a`-half of a split.
        pub in_a: Vec<bool>,
    }

    impl SplitBuffer {
        /// Creates a new split buffer for a graph of size `n`.
        pub fn new(n: usize) -> SplitBuffer {
            SplitBuffer {
                visited: vec![false; n],
                pred: vec![0; n],
                succ: vec![Vec::<usize>::with_capacity(8); n],
                order: Vec::<usize>::with_capacity(n),
                deque: VecDeque::<usize>::with_capacity(n),
                tree_pops: vec![0 as u32; n],
                cut_candidates: Vec::<usize>::with_capacity(n),
                in_a: vec![false; n],
            }
        }

        /// Resets the buffer.
        pub fn clear(&mut self) {
            self.visited.fill(false);
            for node in self.succ.iter_mut() {
                node.clear();
            }
            self.order.clear();
            self.deque.clear();
            self.cut_candidates.clear();
            self.in_a.fill(false);
            self.tree_pops.fill(0);
            self.pred.fill(0);
        }
    }
}
