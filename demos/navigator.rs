use maze_planner::{
    AgentSpec, AlgorithmId, Cell, GridWorld, HeuristicId, MetricsCollector, Navigator,
    NavigatorConfig, NavigatorEvent,
};

// Three agents cross a 20x12 room, each planning with a different algorithm and a
// small expansion budget per tick. Halfway through a wall is dropped across the room
// and every agent replans around it.

const DT: f32 = 0.1;

fn main() {
    env_logger::init();
    let mut grid = GridWorld::new(20, 12);
    grid.set_rect(Cell::planar(6, 0), 1, 8, true).unwrap();
    grid.update();

    let config = NavigatorConfig::default().with_expansions_per_tick(16);
    let mut navigator = Navigator::new(config).unwrap();
    let mut metrics = MetricsCollector::new();
    let goal = Cell::planar(19, 11);
    let agents = [
        navigator.spawn(Cell::planar(0, 0), goal, AlgorithmId::AStar),
        navigator
            .spawn_with(
                AgentSpec::new(Cell::planar(0, 11), goal, AlgorithmId::Greedy)
                    .with_heuristic(HeuristicId::Euclidean)
                    .with_speed(6.0),
            )
            .unwrap(),
        navigator.spawn(Cell::planar(0, 5), goal, AlgorithmId::Bidirectional),
    ];
    for &id in &agents {
        navigator.request_plan(id).unwrap();
    }

    for tick in 0..400 {
        if tick == 5 {
            grid.set_rect(Cell::planar(12, 2), 1, 10, true).unwrap();
            grid.update();
            println!("tick {tick}: wall added\n{grid}");
        }
        for event in navigator.update(&grid, DT, &mut metrics) {
            match event {
                NavigatorEvent::Moved { .. } => {}
                event => println!("tick {tick}: {event:?}"),
            }
        }
        if navigator.agents().all(|a| a.position() == a.goal()) {
            println!("all agents arrived after {tick} ticks");
            break;
        }
    }
    for agent in navigator.agents() {
        println!(
            "{} ({}): {:?} at {}, walked {} cells",
            agent.id(),
            agent.algorithm(),
            agent.state(),
            agent.position(),
            agent.history().len()
        );
    }
    println!();
    print!("{metrics}");
}
