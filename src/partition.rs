//! Data structures for partitionings (districting plans).
use crate::buffers::SubgraphBuffer;
use crate::error::RecomError;
use crate::graph::{Edge, Graph};
use crate::recom::RecomProposal;

/// A partitioning (districting plan) on top of a [Graph].
/// The graph is referenced implicitly (we don't store a reference to it).
///
/// Every node carries exactly one label in `0..num_dists`, and every
/// label is carried by at least one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// The number of districts (parts) in the partitioning.
    pub num_dists: u32,
    /// An assignment vector mapping nodes in the graph to
    /// district labels.
    pub assignments: Vec<u32>,
    /// The population in each district.
    pub dist_pops: Vec<u32>,
    /// The nodes in each district (a list-of-lists representation).
    /// This should be consistent with `assignments`; each list is sorted.
    pub dist_nodes: Vec<Vec<usize>>,
}

impl Partition {
    /// Builds a partition from a 0-indexed assignment vector.
    pub fn from_assignments(graph: &Graph, assignments: &[u32]) -> Result<Partition, RecomError> {
        let num_dists = match assignments.iter().max() {
            None => return Err(RecomError::MalformedInput("Empty assignment vector".to_string())),
            Some(&max) => max + 1,
        };
        if assignments.len() != graph.node_count() {
            return Err(RecomError::MalformedInput(format!(
                "Mismatch: graph has {} nodes, assignment vector has {} nodes",
                graph.node_count(),
                assignments.len()
            )));
        }

        let mut dist_nodes = vec![Vec::<usize>::new(); num_dists as usize];
        let mut dist_pops = vec![0 as u32; num_dists as usize];
        for (node, &assignment) in assignments.iter().enumerate() {
            dist_nodes[assignment as usize].push(node);
            dist_pops[assignment as usize] += graph.pops[node];
        }
        if let Some(dist) = dist_nodes.iter().position(|nodes| nodes.is_empty()) {
            return Err(RecomError::MalformedInput(format!(
                "District {} has no nodes",
                dist
            )));
        }
        Ok(Partition {
            num_dists,
            assignments: assignments.to_vec(),
            dist_pops,
            dist_nodes,
        })
    }

    /// Updates a [Partition] to reflect a `proposal`.
    ///
    /// The proposal's two halves must together cover exactly the nodes
    /// of districts `a_label` and `b_label`.
    pub fn update(&mut self, proposal: &RecomProposal) {
        self.dist_nodes[proposal.a_label].clone_from(&proposal.a_nodes);
        self.dist_nodes[proposal.b_label].clone_from(&proposal.b_nodes);
        self.dist_nodes[proposal.a_label].sort_unstable();
        self.dist_nodes[proposal.b_label].sort_unstable();
        self.dist_pops[proposal.a_label] = proposal.a_pop;
        self.dist_pops[proposal.b_label] = proposal.b_pop;
        for &node in proposal.a_nodes.iter() {
            self.assignments[node] = proposal.a_label as u32;
        }
        for &node in proposal.b_nodes.iter() {
            self.assignments[node] = proposal.b_label as u32;
        }
    }

    /// Assigns `nodes` to district `label`.
    ///
    /// The request is validated in full before anything is mutated: if
    /// any node is out of range, the label is out of range, or the move
    /// would leave some district without nodes, an error is returned and
    /// the partition is unchanged.
    pub fn relabel(&mut self, graph: &Graph, nodes: &[usize], label: u32) -> Result<(), RecomError> {
        if label >= self.num_dists {
            return Err(RecomError::InvalidRelabel(format!(
                "District {} is out of range (plan has {} districts)",
                label, self.num_dists
            )));
        }
        if let Some(&node) = nodes.iter().find(|&&node| node >= self.assignments.len()) {
            return Err(RecomError::InvalidRelabel(format!(
                "Node {} is out of range (graph has {} nodes)",
                node,
                self.assignments.len()
            )));
        }

        let mut moving = nodes.to_vec();
        moving.sort_unstable();
        moving.dedup();
        let mut sizes: Vec<usize> = self.dist_nodes.iter().map(|nodes| nodes.len()).collect();
        for &node in moving.iter() {
            let prev = self.assignments[node] as usize;
            if prev != label as usize {
                sizes[prev] -= 1;
                sizes[label as usize] += 1;
            }
        }
        if let Some(dist) = sizes.iter().position(|&size| size == 0) {
            return Err(RecomError::InvalidRelabel(format!(
                "Relabeling would leave district {} with no nodes",
                dist
            )));
        }

        let mut touched = vec![false; self.num_dists as usize];
        for &node in moving.iter() {
            let prev = self.assignments[node];
            if prev != label {
                self.dist_pops[prev as usize] -= graph.pops[node];
                self.dist_pops[label as usize] += graph.pops[node];
                self.assignments[node] = label;
                touched[prev as usize] = true;
                touched[label as usize] = true;
            }
        }
        for (dist, _) in touched.iter().enumerate().filter(|(_, &t)| t) {
            self.dist_nodes[dist] = self
                .assignments
                .iter()
                .enumerate()
                .filter(|(_, &a)| a as usize == dist)
                .map(|(node, _)| node)
                .collect();
        }
        Ok(())
    }

    /// Copies the subgraph induced by the union of districts `a` and `b`
    /// into a buffer.
    ///
    /// The resulting subgraph has relabeled node IDs: nodes
    /// [0..# of nodes in district `a`] are from district `a`, and the
    /// remaining nodes are from district `b`. The `node_to_idx` member
    /// of the subgraph buffer contains a mapping between the node IDs
    /// of the parent graph and these new node IDs.
    ///
    /// # Arguments
    ///
    /// * `graph` - The underlying graph of the [Partition].
    /// * `buf` - The buffer to copy the nodes into.
    /// * `a` - The label of the `a`-district.
    /// * `b` - The label of the `b`-district.
    pub fn subgraph(&self, graph: &Graph, buf: &mut SubgraphBuffer, a: usize, b: usize) {
        buf.clear();
        buf.raw_nodes.extend_from_slice(&self.dist_nodes[a]);
        buf.raw_nodes.extend_from_slice(&self.dist_nodes[b]);
        for (idx, &node) in buf.raw_nodes.iter().enumerate() {
            buf.node_to_idx[node] = Some(idx);
        }
        for (idx, &node) in buf.raw_nodes.iter().enumerate() {
            buf.graph.edges_start[idx] = buf.graph.edges.len();
            for &neighbor in graph.neighbors[node].iter() {
                if let Some(neighbor_idx) = buf.node_to_idx[neighbor] {
                    buf.graph.neighbors[idx].push(neighbor_idx);
                    if neighbor_idx > idx {
                        buf.graph.edges.push(Edge(idx, neighbor_idx));
                    }
                }
            }
            buf.graph.pops.push(graph.pops[node]);
        }
        buf.graph.total_pop = self.dist_pops[a] + self.dist_pops[b];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_assignments_rect_grid_2x2() {
        let grid = Graph::rect_grid(2, 2);
        let partition = Partition::from_assignments(&grid, &[0, 0, 0, 1]).unwrap();
        assert_eq!(partition.num_dists, 2);
        assert_eq!(partition.assignments, vec![0, 0, 0, 1]);
        assert_eq!(partition.dist_pops, vec![3, 1]);
        assert_eq!(partition.dist_nodes, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn from_assignments_missing_district() {
        let grid = Graph::rect_grid(2, 2);
        let err = Partition::from_assignments(&grid, &[0, 0, 0, 2]).unwrap_err();
        assert_eq!(err.to_string(), "malformed input: District 1 has no nodes");
    }

    #[test]
    fn from_assignments_length_mismatch() {
        let grid = Graph::rect_grid(2, 2);
        let err = Partition::from_assignments(&grid, &[0, 0, 1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed input: Mismatch: graph has 4 nodes, assignment vector has 3 nodes"
        );
    }

    #[test]
    fn from_assignments_empty() {
        let grid = Graph::rect_grid(2, 2);
        assert!(Partition::from_assignments(&grid, &[]).is_err());
    }

    #[test]
    fn relabel_moves_nodes_and_populations() {
        let grid = Graph::rect_grid(2, 2);
        let mut partition = Partition::from_assignments(&grid, &[0, 0, 1, 1]).unwrap();
        partition.relabel(&grid, &[1, 1], 1).unwrap();
        assert_eq!(partition.assignments, vec![0, 1, 1, 1]);
        assert_eq!(partition.dist_pops, vec![1, 3]);
        assert_eq!(partition.dist_nodes, vec![vec![0], vec![1, 2, 3]]);
    }

    #[test]
    fn relabel_is_all_or_nothing() {
        let grid = Graph::rect_grid(2, 2);
        let mut partition = Partition::from_assignments(&grid, &[0, 0, 1, 1]).unwrap();
        let before = partition.clone();

        // Node 9 doesn't exist; node 0 must not move either.
        assert!(partition.relabel(&grid, &[0, 9], 1).is_err());
        assert_eq!(partition, before);

        // Emptying district 0 is not allowed.
        assert!(partition.relabel(&grid, &[0, 1], 1).is_err());
        assert_eq!(partition, before);

        assert!(partition.relabel(&grid, &[0], 2).is_err());
        assert_eq!(partition, before);
    }

    #[test]
    fn subgraph_relabels_nodes() {
        let grid = Graph::rect_grid(3, 1);
        let partition = Partition::from_assignments(&grid, &[0, 1, 2]).unwrap();
        let mut buf = SubgraphBuffer::new(3, 3);
        partition.subgraph(&grid, &mut buf, 2, 1);
        assert_eq!(buf.raw_nodes, vec![2, 1]);
        assert_eq!(buf.graph.pops, vec![1, 1]);
        assert_eq!(buf.graph.edges, vec![Edge(0, 1)]);
        assert_eq!(buf.graph.total_pop, 2);
        assert_eq!(buf.node_to_idx, vec![None, Some(1), Some(0)]);

        // Reusing the buffer clears the previous subgraph.
        partition.subgraph(&grid, &mut buf, 0, 1);
        assert_eq!(buf.raw_nodes, vec![0, 1]);
        assert_eq!(buf.node_to_idx, vec![Some(0), Some(1), None]);
        assert_eq!(buf.graph.neighbors[0], vec![1]);
    }
}
