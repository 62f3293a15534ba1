//! Plan fixtures for long-running tests and benchmarks.
use gmcmc::graph::Graph;
use gmcmc::init::from_precinct_json;
use gmcmc::plan::PlanGraph;
use std::path::PathBuf;

/// The location of the graph JSON data w.r.t. the project manifest.
const GRAPH_FIXTURES_DIR: &str = "graphs";

/// 6x6 grid graph (rook adjacency, unit node populations, one vote per
/// node, six column-stripe districts labeled 0..5).
const SIX_FILENAME: &str = "6x6.json";

/// 10x10 grid graph (rook adjacency, populations in 90..=110, explicit
/// vote counts, four quadrant districts labeled A..D).
const TEN_FILENAME: &str = "10x10.json";

/// Loads a plan fixture by key (`"6x6"` or `"10x10"`).
pub fn default_fixture(key: &str) -> PlanGraph {
    let filename = match key {
        "6x6" => SIX_FILENAME,
        "10x10" => TEN_FILENAME,
        bad => panic!("Unknown graph fixture '{}'", bad),
    };

    // stable dir: see https://stackoverflow.com/a/30004252
    let mut full_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    full_path.push(GRAPH_FIXTURES_DIR);
    full_path.push(filename);
    let path_str = full_path.to_string_lossy().into_owned();
    from_precinct_json(&path_str).unwrap()
}

/// A `width` x `height` grid plan with unit populations, built in memory.
/// Node `(x, y)` has index `y * width + x` and starts in district
/// `district(x, y)`.
pub fn grid_fixture(width: usize, height: usize, district: impl Fn(usize, usize) -> u32) -> PlanGraph {
    let graph = Graph::rect_grid(width, height);
    let assignments: Vec<u32> = (0..width * height)
        .map(|idx| district(idx % width, idx / width))
        .collect();
    PlanGraph::from_graph(graph, &assignments).unwrap()
}
