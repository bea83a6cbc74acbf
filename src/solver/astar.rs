use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::search_context::SearchContext;
use crate::solver::{GridSolver, Progress};
use crate::Cost;

/// A* over traversal costs. The frontier is ordered by `g + weight * h`, ties going to
/// the node with the larger cost-so-far (the one closer to the goal), then to the
/// earliest inserted.
pub struct AstarSolver {
    goal: Cell,
    heuristic: HeuristicId,
    pub heuristic_factor: f32,
    context: SearchContext<Cell, Cost>,
}

impl AstarSolver {
    pub fn new(start: Cell, goal: Cell, heuristic: HeuristicId, heuristic_factor: f32) -> Self {
        AstarSolver {
            goal,
            heuristic,
            heuristic_factor,
            context: SearchContext::new(start),
        }
    }
}

/// Just the estimate times the heuristic factor.
fn weighted_estimate(heuristic: HeuristicId, factor: f32, cell: &Cell, goal: &Cell) -> Cost {
    let h = heuristic.estimate(cell, goal);
    if factor == 1.0 {
        h
    } else {
        (h as f32 * factor) as Cost
    }
}

impl GridSolver for AstarSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let goal = self.goal;
        let heuristic = self.heuristic;
        let factor = self.heuristic_factor;
        self.context
            .expand(
                max_expansions,
                |node| grid.neighbors_and_cost(node),
                |node, cost| (cost + weighted_estimate(heuristic, factor, node, &goal), cost),
                |node| *node == goal,
                true,
            )
            .into_progress()
    }

    fn nodes_explored(&self) -> usize {
        self.context.expanded()
    }
}
