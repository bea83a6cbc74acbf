use maze_planner::{
    AlgorithmId, GridWorld, MetricsCollector, PathPlanner, SearchParams, SearchRequest,
};

// Runs every algorithm (or the ones named on the command line, e.g.
// `cargo run --example compare -- astar bfs`) on the maze below and prints a
// comparison table. Set RUST_LOG=debug to follow the searches.
//
// - # marks a wall
// - 2-9 mark terrain that costs that much to enter
// - S and G mark the start and the goal

const MAZE: &str = "
S.....#.........
.####.#.#######.
.#....#.#.....#.
.#.####.#.###.#.
.#......#...#.#.
.########.#.#.#.
..........#.#...
.#########..####
.#.....333......
.#.###.###.####.
...#.......#...G
";

fn main() {
    env_logger::init();
    let map = GridWorld::parse_ascii(MAZE).expect("maze is well formed");
    let (start, goal) = (map.start.unwrap(), map.goal.unwrap());
    let grid = map.grid;
    println!("{grid}");

    let algorithms: Vec<AlgorithmId> = match std::env::args().skip(1).collect::<Vec<_>>() {
        names if names.is_empty() => AlgorithmId::ALL.to_vec(),
        names => names
            .iter()
            .map(|name| name.parse().unwrap_or_else(|e| panic!("{e}")))
            .collect(),
    };

    let mut planner = PathPlanner::new();
    let mut metrics = MetricsCollector::new();
    let params = SearchParams::default().with_max_depth(60);
    for algorithm in algorithms {
        let request = SearchRequest::new(&grid, start, goal, algorithm).with_params(params.clone());
        let result = planner.request_path(&request, &mut metrics);
        println!(
            "{:<14} {:?}, {} moves, cost {}, {} nodes",
            algorithm.label(),
            result.termination,
            result.path_length(),
            result.path_cost,
            result.nodes_explored
        );
    }
    println!();
    print!("{metrics}");
}
