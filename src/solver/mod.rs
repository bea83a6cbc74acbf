use crate::cell::Cell;
use crate::error::{PlanError, Result};
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::{
    Cost, DEFAULT_BEAM_WIDTH, DEFAULT_GENERATIONS, DEFAULT_MUTATION_RATE, DEFAULT_POPULATION_SIZE,
    IDS_DEPTH_CAP,
};
use core::fmt;
use log::{info, warn};
use std::str::FromStr;
use std::time::{Duration, Instant};

pub mod astar;
pub mod beam;
pub mod bfs;
pub mod bidirectional;
pub mod dfs;
pub mod dijkstra;
pub mod genetic;
pub mod greedy;
pub mod ids;

use astar::AstarSolver;
use beam::BeamSolver;
use bfs::BfsSolver;
use bidirectional::BidirectionalSolver;
use dfs::DfsSolver;
use dijkstra::DijkstraSolver;
use genetic::GeneticSolver;
use greedy::GreedySolver;
use ids::IdsSolver;

/// The nine interchangeable search strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmId {
    Bfs,
    Dfs,
    Dijkstra,
    AStar,
    Greedy,
    Beam,
    Bidirectional,
    Ids,
    Genetic,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 9] = [
        AlgorithmId::Bfs,
        AlgorithmId::Dfs,
        AlgorithmId::Dijkstra,
        AlgorithmId::AStar,
        AlgorithmId::Greedy,
        AlgorithmId::Beam,
        AlgorithmId::Bidirectional,
        AlgorithmId::Ids,
        AlgorithmId::Genetic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlgorithmId::Bfs => "BFS",
            AlgorithmId::Dfs => "DFS",
            AlgorithmId::Dijkstra => "DIJKSTRA",
            AlgorithmId::AStar => "ASTAR",
            AlgorithmId::Greedy => "GREEDY",
            AlgorithmId::Beam => "BEAM",
            AlgorithmId::Bidirectional => "BIDIRECTIONAL",
            AlgorithmId::Ids => "IDS",
            AlgorithmId::Genetic => "GENETIC",
        }
    }

    /// Whether the strategy returns a shortest path on a grid where every move costs 1
    /// (given an admissible heuristic where one is used). Dijkstra and A* stay optimal
    /// under weighted costs; BFS, bidirectional BFS and IDS ignore costs entirely.
    pub fn is_optimal_on_unit_grid(&self) -> bool {
        matches!(
            self,
            AlgorithmId::Bfs
                | AlgorithmId::Dijkstra
                | AlgorithmId::AStar
                | AlgorithmId::Bidirectional
                | AlgorithmId::Ids
        )
    }

    /// Whether the strategy takes traversal costs into account.
    pub fn uses_costs(&self) -> bool {
        matches!(self, AlgorithmId::Dijkstra | AlgorithmId::AStar)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AlgorithmId {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<AlgorithmId> {
        let id = match s.trim().to_ascii_lowercase().as_str() {
            "bfs" | "breadth-first" | "breadth-first search" => AlgorithmId::Bfs,
            "dfs" | "depth-first" | "depth-first search" => AlgorithmId::Dfs,
            "dijkstra" | "ucs" | "uniform-cost search" => AlgorithmId::Dijkstra,
            "a*" | "astar" | "a* search" => AlgorithmId::AStar,
            "greedy" | "greedy bfs" | "greedy best-first" | "hill climbing" => AlgorithmId::Greedy,
            "beam" | "beam search" => AlgorithmId::Beam,
            "bidirectional" | "bidirectional bfs" | "bidirectional search" => {
                AlgorithmId::Bidirectional
            }
            "ids" | "iterative deepening" | "iterative deepening search" => AlgorithmId::Ids,
            "genetic" | "ga" | "genetic algorithm" => AlgorithmId::Genetic,
            _ => return Err(PlanError::UnknownAlgorithm(s.to_owned())),
        };
        Ok(id)
    }
}

/// Algorithm-specific knobs. Every strategy ignores the fields it does not use.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchParams {
    /// Beam search: candidates kept per depth level.
    pub beam_width: usize,
    /// IDS: deepest limit tried. `None` uses `min(3 * manhattan, IDS_DEPTH_CAP)`.
    pub max_depth: Option<usize>,
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    /// Seed of the genetic planner's random number generator.
    pub seed: u64,
    /// A*: scale applied to the heuristic. Above 1 this is weighted A*, which
    /// expands fewer nodes but may return longer paths.
    pub heuristic_weight: f32,
}

impl Default for SearchParams {
    fn default() -> SearchParams {
        SearchParams {
            beam_width: DEFAULT_BEAM_WIDTH,
            max_depth: None,
            population_size: DEFAULT_POPULATION_SIZE,
            generations: DEFAULT_GENERATIONS,
            mutation_rate: DEFAULT_MUTATION_RATE,
            seed: 0,
            heuristic_weight: 1.0,
        }
    }
}

impl SearchParams {
    pub fn with_beam_width(mut self, beam_width: usize) -> SearchParams {
        self.beam_width = beam_width;
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> SearchParams {
        self.max_depth = Some(max_depth);
        self
    }
    pub fn with_population_size(mut self, population_size: usize) -> SearchParams {
        self.population_size = population_size;
        self
    }
    pub fn with_generations(mut self, generations: usize) -> SearchParams {
        self.generations = generations;
        self
    }
    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> SearchParams {
        self.mutation_rate = mutation_rate;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> SearchParams {
        self.seed = seed;
        self
    }
    pub fn with_heuristic_weight(mut self, heuristic_weight: f32) -> SearchParams {
        self.heuristic_weight = heuristic_weight;
        self
    }

    /// IDS depth limit for the given endpoints.
    pub fn depth_limit(&self, start: &Cell, goal: &Cell) -> usize {
        self.max_depth.unwrap_or_else(|| {
            ((3 * start.manhattan_distance(goal)) as usize)
                .min(IDS_DEPTH_CAP)
                .max(1)
        })
    }

    /// Checks every field, whichever algorithm ends up reading it.
    pub fn validate(&self) -> Result<()> {
        self.check_beam()?;
        self.check_genetic()?;
        self.check_heuristic_weight()
    }

    /// Checks only the fields `algorithm` reads.
    pub fn validate_for(&self, algorithm: AlgorithmId) -> Result<()> {
        match algorithm {
            AlgorithmId::Beam => self.check_beam(),
            AlgorithmId::Genetic => self.check_genetic(),
            AlgorithmId::AStar => self.check_heuristic_weight(),
            _ => Ok(()),
        }
    }

    fn check_beam(&self) -> Result<()> {
        if self.beam_width == 0 {
            return Err(PlanError::parameter("beam_width", "must be at least 1"));
        }
        Ok(())
    }

    fn check_genetic(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(PlanError::parameter(
                "population_size",
                "must be at least 2",
            ));
        }
        if self.generations == 0 {
            return Err(PlanError::parameter("generations", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(PlanError::parameter(
                "mutation_rate",
                format!("{} is not within [0, 1]", self.mutation_rate),
            ));
        }
        Ok(())
    }

    fn check_heuristic_weight(&self) -> Result<()> {
        if !self.heuristic_weight.is_finite() || self.heuristic_weight < 0.0 {
            return Err(PlanError::parameter(
                "heuristic_weight",
                format!("{} is not a finite non-negative number", self.heuristic_weight),
            ));
        }
        Ok(())
    }
}

/// One planning call against a grid snapshot.
#[derive(Clone, Debug)]
pub struct SearchRequest<'a> {
    pub grid: &'a GridWorld,
    pub start: Cell,
    pub goal: Cell,
    pub algorithm: AlgorithmId,
    pub heuristic: HeuristicId,
    pub params: SearchParams,
}

impl<'a> SearchRequest<'a> {
    /// A request with default parameters and the default heuristic for the grid's
    /// connectivity.
    pub fn new(grid: &'a GridWorld, start: Cell, goal: Cell, algorithm: AlgorithmId) -> Self {
        SearchRequest {
            grid,
            start,
            goal,
            algorithm,
            heuristic: HeuristicId::default_for(grid.connectivity()),
            params: SearchParams::default(),
        }
    }
    pub fn with_heuristic(mut self, heuristic: HeuristicId) -> Self {
        self.heuristic = heuristic;
        self
    }
    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    /// The checks run before any algorithm: endpoints in bounds and walkable,
    /// the parameters the chosen algorithm reads in range.
    pub fn validate(&self) -> Result<()> {
        self.grid.check_walkable(&self.start)?;
        self.grid.check_walkable(&self.goal)?;
        self.params.validate_for(self.algorithm)
    }
}

/// Why a search stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    GoalReached,
    /// The reachable space (or beam) ran out without meeting the goal.
    Exhausted,
    /// IDS exceeded its depth limit or the genetic planner ran out of generations.
    BudgetExhausted,
    /// The request failed validation; no algorithm ran.
    InvalidRequest(PlanError),
    /// A stepwise plan was dropped because the grid changed under it.
    Cancelled,
}

/// Outcome of a planning call.
///
/// When `success` is set, `path` starts at the requested start, ends at the goal and
/// every consecutive pair is a legal move on the grid. Failed searches leave `path`
/// empty; the genetic planner instead reports its best attempt in `partial_path`.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub success: bool,
    pub path: Vec<Cell>,
    pub partial_path: Vec<Cell>,
    pub nodes_explored: usize,
    pub elapsed: Duration,
    pub algorithm: AlgorithmId,
    /// Sum of traversal costs along `path`.
    pub path_cost: Cost,
    pub termination: Termination,
}

impl SearchResult {
    /// Number of moves in the path.
    pub fn path_length(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub(crate) fn invalid(algorithm: AlgorithmId, error: PlanError) -> SearchResult {
        SearchResult {
            success: false,
            path: Vec::new(),
            partial_path: Vec::new(),
            nodes_explored: 0,
            elapsed: Duration::ZERO,
            algorithm,
            path_cost: 0,
            termination: Termination::InvalidRequest(error),
        }
    }

    pub(crate) fn cancelled(
        algorithm: AlgorithmId,
        nodes_explored: usize,
        elapsed: Duration,
    ) -> SearchResult {
        SearchResult {
            success: false,
            path: Vec::new(),
            partial_path: Vec::new(),
            nodes_explored,
            elapsed,
            algorithm,
            path_cost: 0,
            termination: Termination::Cancelled,
        }
    }

    pub(crate) fn from_progress(
        grid: &GridWorld,
        algorithm: AlgorithmId,
        progress: Progress,
        nodes_explored: usize,
        elapsed: Duration,
    ) -> SearchResult {
        let (path, partial_path, termination) = match progress {
            Progress::Found(path) => (path, Vec::new(), Termination::GoalReached),
            Progress::NotFound {
                partial,
                budget_exhausted,
            } => (
                Vec::new(),
                partial,
                if budget_exhausted {
                    Termination::BudgetExhausted
                } else {
                    Termination::Exhausted
                },
            ),
            Progress::Pending => (Vec::new(), Vec::new(), Termination::Cancelled),
        };
        SearchResult {
            success: termination == Termination::GoalReached,
            path_cost: grid.path_cost(&path),
            path,
            partial_path,
            nodes_explored,
            elapsed,
            algorithm,
            termination,
        }
    }
}

/// State of a search after a bounded round of expansions.
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    Pending,
    Found(Vec<Cell>),
    NotFound {
        partial: Vec<Cell>,
        budget_exhausted: bool,
    },
}

impl Progress {
    pub(crate) fn exhausted() -> Progress {
        Progress::NotFound {
            partial: Vec::new(),
            budget_exhausted: false,
        }
    }
}

/// A resumable search. Each solver owns its frontier and visited structures, so a
/// plan can be advanced a few expansions at a time across frames or run to completion.
pub trait GridSolver {
    /// Expands at most `max_expansions` nodes (fitness evaluations for the genetic
    /// planner) and reports whether the search finished.
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress;

    fn nodes_explored(&self) -> usize;

    /// Runs the search to completion.
    fn run(&mut self, grid: &GridWorld) -> Progress {
        loop {
            match self.step(grid, usize::MAX) {
                Progress::Pending => continue,
                done => return done,
            }
        }
    }
}

/// Closed set of strategies, dispatched by [AlgorithmId].
pub enum Search {
    Bfs(BfsSolver),
    Dfs(DfsSolver),
    Dijkstra(DijkstraSolver),
    AStar(AstarSolver),
    Greedy(GreedySolver),
    Beam(BeamSolver),
    Bidirectional(BidirectionalSolver),
    Ids(IdsSolver),
    Genetic(GeneticSolver),
}

impl Search {
    /// Builds the state for `request.algorithm`. The request is not validated here.
    pub fn new(request: &SearchRequest) -> Search {
        let (start, goal) = (request.start, request.goal);
        let heuristic = request.heuristic;
        let params = &request.params;
        match request.algorithm {
            AlgorithmId::Bfs => Search::Bfs(BfsSolver::new(start, goal)),
            AlgorithmId::Dfs => Search::Dfs(DfsSolver::new(start, goal)),
            AlgorithmId::Dijkstra => Search::Dijkstra(DijkstraSolver::new(start, goal)),
            AlgorithmId::AStar => Search::AStar(AstarSolver::new(
                start,
                goal,
                heuristic,
                params.heuristic_weight,
            )),
            AlgorithmId::Greedy => Search::Greedy(GreedySolver::new(start, goal, heuristic)),
            AlgorithmId::Beam => {
                Search::Beam(BeamSolver::new(start, goal, heuristic, params.beam_width))
            }
            AlgorithmId::Bidirectional => {
                Search::Bidirectional(BidirectionalSolver::new(start, goal))
            }
            AlgorithmId::Ids => {
                Search::Ids(IdsSolver::new(start, goal, params.depth_limit(&start, &goal)))
            }
            AlgorithmId::Genetic => {
                Search::Genetic(GeneticSolver::new(start, goal, heuristic, params))
            }
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            Search::Bfs(_) => AlgorithmId::Bfs,
            Search::Dfs(_) => AlgorithmId::Dfs,
            Search::Dijkstra(_) => AlgorithmId::Dijkstra,
            Search::AStar(_) => AlgorithmId::AStar,
            Search::Greedy(_) => AlgorithmId::Greedy,
            Search::Beam(_) => AlgorithmId::Beam,
            Search::Bidirectional(_) => AlgorithmId::Bidirectional,
            Search::Ids(_) => AlgorithmId::Ids,
            Search::Genetic(_) => AlgorithmId::Genetic,
        }
    }
}

impl GridSolver for Search {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        match self {
            Search::Bfs(s) => s.step(grid, max_expansions),
            Search::Dfs(s) => s.step(grid, max_expansions),
            Search::Dijkstra(s) => s.step(grid, max_expansions),
            Search::AStar(s) => s.step(grid, max_expansions),
            Search::Greedy(s) => s.step(grid, max_expansions),
            Search::Beam(s) => s.step(grid, max_expansions),
            Search::Bidirectional(s) => s.step(grid, max_expansions),
            Search::Ids(s) => s.step(grid, max_expansions),
            Search::Genetic(s) => s.step(grid, max_expansions),
        }
    }

    fn nodes_explored(&self) -> usize {
        match self {
            Search::Bfs(s) => s.nodes_explored(),
            Search::Dfs(s) => s.nodes_explored(),
            Search::Dijkstra(s) => s.nodes_explored(),
            Search::AStar(s) => s.nodes_explored(),
            Search::Greedy(s) => s.nodes_explored(),
            Search::Beam(s) => s.nodes_explored(),
            Search::Bidirectional(s) => s.nodes_explored(),
            Search::Ids(s) => s.nodes_explored(),
            Search::Genetic(s) => s.nodes_explored(),
        }
    }
}

/// Validates `request`, runs the selected algorithm to completion and times it.
/// Never fails: configuration errors come back as [Termination::InvalidRequest].
pub fn plan(request: &SearchRequest) -> SearchResult {
    if let Err(error) = request.validate() {
        warn!("Rejected {} request: {}", request.algorithm, error);
        return SearchResult::invalid(request.algorithm, error);
    }
    let before = Instant::now();
    let mut search = Search::new(request);
    let progress = search.run(request.grid);
    let result = SearchResult::from_progress(
        request.grid,
        request.algorithm,
        progress,
        search.nodes_explored(),
        before.elapsed(),
    );
    info!(
        "{} from {} to {}: success={}, length={}, explored={}",
        result.algorithm,
        request.start,
        request.goal,
        result.success,
        result.path_length(),
        result.nodes_explored
    );
    result
}
