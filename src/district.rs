//! Read-only district queries over a partition.
use crate::buffers::SubgraphBuffer;
use crate::graph::Graph;
use crate::partition::Partition;
use crate::votes::VoteTally;

/// Derived, read-only queries about the districts of a [Partition].
///
/// Nothing here is cached; every query is computed from the current
/// assignment, so a view can never disagree with its partition.
#[derive(Clone, Copy)]
pub struct DistrictView<'a> {
    graph: &'a Graph,
    partition: &'a Partition,
}

impl<'a> DistrictView<'a> {
    pub fn new(graph: &'a Graph, partition: &'a Partition) -> DistrictView<'a> {
        DistrictView { graph, partition }
    }

    pub fn num_districts(&self) -> usize {
        self.partition.num_dists as usize
    }

    /// The nodes in district `dist` (sorted).
    pub fn nodes_of(&self, dist: usize) -> &'a [usize] {
        &self.partition.dist_nodes[dist]
    }

    /// Nodes outside district `dist` that are adjacent to at least one
    /// node inside it (sorted, without duplicates).
    pub fn node_boundary(&self, dist: usize) -> Vec<usize> {
        let mut boundary: Vec<usize> = self
            .nodes_of(dist)
            .iter()
            .flat_map(|&node| self.graph.neighbors[node].iter())
            .copied()
            .filter(|&neighbor| self.partition.assignments[neighbor] as usize != dist)
            .collect();
        boundary.sort_unstable();
        boundary.dedup();
        boundary
    }

    /// The districts that share at least one edge with district `dist`
    /// (sorted, without duplicates).
    pub fn neighboring_districts(&self, dist: usize) -> Vec<usize> {
        let mut dists: Vec<usize> = self
            .node_boundary(dist)
            .into_iter()
            .map(|node| self.partition.assignments[node] as usize)
            .collect();
        dists.sort_unstable();
        dists.dedup();
        dists
    }

    /// Copies the subgraph induced by districts `a` and `b` into `buf`.
    /// (See [Partition::subgraph].)
    pub fn induced_subgraph_into(&self, a: usize, b: usize, buf: &mut SubgraphBuffer) {
        self.partition.subgraph(self.graph, buf, a, b);
    }

    /// Returns the subgraph induced by districts `a` and `b` in a fresh buffer.
    pub fn induced_subgraph(&self, a: usize, b: usize) -> SubgraphBuffer {
        let size = self.nodes_of(a).len() + self.nodes_of(b).len();
        let mut buf = SubgraphBuffer::new(self.graph.node_count(), size);
        self.induced_subgraph_into(a, b, &mut buf);
        buf
    }

    /// The total population of an arbitrary set of nodes.
    pub fn population(&self, nodes: &[usize]) -> u32 {
        nodes.iter().map(|&node| self.graph.pops[node]).sum()
    }

    /// The total population of district `dist`.
    pub fn total_population(&self, dist: usize) -> u32 {
        self.partition.dist_pops[dist]
    }

    /// The vote tally of district `dist`.
    pub fn votes(&self, dist: usize) -> VoteTally {
        self.nodes_of(dist)
            .iter()
            .map(|&node| self.graph.votes[node])
            .sum()
    }

    /// The vote tallies of all districts, by district index.
    pub fn all_votes(&self) -> Vec<VoteTally> {
        (0..self.num_districts()).map(|dist| self.votes(dist)).collect()
    }

    /// Returns whether `nodes` induce a connected subgraph.
    pub fn is_connected(&self, nodes: &[usize]) -> bool {
        self.graph.nodes_connected(nodes)
    }

    /// Returns whether every district is non-empty and connected.
    pub fn all_districts_connected(&self) -> bool {
        self.partition
            .dist_nodes
            .iter()
            .all(|nodes| !nodes.is_empty() && self.graph.nodes_connected(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 4x4 grid split into four 2x2 quadrants:
    ///
    /// ```text
    ///  0 0 1 1
    ///  0 0 1 1
    ///  2 2 3 3
    ///  2 2 3 3
    /// ```
    fn quadrants() -> (Graph, Partition) {
        let grid = Graph::rect_grid(4, 4);
        let assignments = vec![0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3];
        let partition = Partition::from_assignments(&grid, &assignments).unwrap();
        (grid, partition)
    }

    #[test]
    fn neighboring_districts_generalize_past_two() {
        let (grid, partition) = quadrants();
        let view = DistrictView::new(&grid, &partition);
        // Diagonal quadrants only touch at a corner (no rook edge).
        assert_eq!(view.neighboring_districts(0), vec![1, 2]);
        assert_eq!(view.neighboring_districts(1), vec![0, 3]);
        assert_eq!(view.neighboring_districts(3), vec![1, 2]);
    }

    #[test]
    fn node_boundary_of_quadrant() {
        let (grid, partition) = quadrants();
        let view = DistrictView::new(&grid, &partition);
        assert_eq!(view.node_boundary(0), vec![2, 6, 8, 9]);
    }

    #[test]
    fn single_district_has_no_neighbors() {
        let grid = Graph::rect_grid(2, 2);
        let partition = Partition::from_assignments(&grid, &[0, 0, 0, 0]).unwrap();
        let view = DistrictView::new(&grid, &partition);
        assert!(view.neighboring_districts(0).is_empty());
    }

    #[test]
    fn populations_and_subgraphs() {
        let (grid, partition) = quadrants();
        let view = DistrictView::new(&grid, &partition);
        assert_eq!(view.total_population(2), 4);
        assert_eq!(view.population(&[0, 1, 15]), 3);

        let sub = view.induced_subgraph(0, 1);
        assert_eq!(sub.len(), 8);
        assert_eq!(sub.graph.node_count(), 8);
        assert_eq!(sub.graph.total_pop, 8);
        // Two 2x2 blocks (4 edges each) joined by two edges.
        assert_eq!(sub.graph.edges.len(), 10);
    }

    #[test]
    fn connectivity_checks() {
        let (grid, partition) = quadrants();
        let view = DistrictView::new(&grid, &partition);
        assert!(view.all_districts_connected());
        assert!(!view.is_connected(&[0, 5, 10]));

        let striped = Partition::from_assignments(
            &grid,
            &[0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        )
        .unwrap();
        assert!(!DistrictView::new(&grid, &striped).all_districts_connected());
    }
}
