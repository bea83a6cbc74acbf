//! # maze_planner
//!
//! Grid pathfinding with nine interchangeable strategies behind one request/result
//! contract: breadth-first, depth-first, Dijkstra, A*, greedy best-first, beam,
//! bidirectional breadth-first, iterative deepening and a genetic planner.
//!
//! A [GridWorld] holds walkability, per-cell traversal costs and optional links
//! between layers. It pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! so that unreachable goals can be detected without flood-filling.
//! [plan] runs a single [SearchRequest] to completion, while [PathPlanner]
//! can spread a search over several frames with a bounded number of expansions per
//! frame. Every run is recorded in a [MetricsCollector], and a [Navigator] moves
//! agents along planned paths with blocking, displacement and replanning.
//!
//! ```
//! use maze_planner::{plan, AlgorithmId, Cell, GridWorld, SearchRequest};
//!
//! let grid = GridWorld::from_ascii(
//!     "...\n\
//!      .#.\n\
//!      ...",
//! )
//! .unwrap();
//! let request = SearchRequest::new(&grid, Cell::planar(0, 0), Cell::planar(2, 2), AlgorithmId::AStar);
//! let result = plan(&request);
//! assert!(result.success);
//! assert_eq!(result.path_length(), 4);
//! ```
mod search_context;

pub mod cell;
pub mod error;
pub mod grid_world;
pub mod heuristic;
pub mod metrics;
pub mod navigator;
pub mod planner;
pub mod solver;

pub use cell::Cell;
pub use error::{PlanError, Result};
pub use grid_world::{AsciiMap, Connectivity, GridWorld};
pub use heuristic::HeuristicId;
pub use metrics::{AlgorithmStats, MetricsCollector};
pub use navigator::{
    Agent, AgentId, AgentSpec, AgentState, BlockReason, Navigator, NavigatorConfig,
    NavigatorEvent,
};
pub use planner::{PathPlanner, PlanProgress};
pub use solver::{
    plan, AlgorithmId, GridSolver, Progress, Search, SearchParams, SearchRequest, SearchResult,
    Termination,
};

/// Traversal cost of entering a cell. Costs are integers of at least 1.
pub type Cost = i32;

/// Inline capacity for neighbour lists: eight planar moves before spilling to the heap.
pub const N_SMALLVEC_SIZE: usize = 8;

pub const DEFAULT_BEAM_WIDTH: usize = 10;
pub const DEFAULT_POPULATION_SIZE: usize = 50;
pub const DEFAULT_GENERATIONS: usize = 100;
pub const DEFAULT_MUTATION_RATE: f64 = 0.1;
/// Upper bound on the default IDS depth limit.
pub const IDS_DEPTH_CAP: usize = 100;
/// Shortest genome the genetic planner evolves, whatever the start-goal distance.
pub const MIN_GENOME_LENGTH: usize = 20;
/// Default bound on an agent's position history.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;
