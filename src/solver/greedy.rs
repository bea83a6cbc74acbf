use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::search_context::SearchContext;
use crate::solver::{GridSolver, Progress};
use crate::Cost;

/// Greedy best-first search: always expands the frontier cell that looks closest to
/// the goal. Cells are marked visited when first queued and never reopened, so the
/// search is fast but the path it returns can be far from shortest.
pub struct GreedySolver {
    goal: Cell,
    heuristic: HeuristicId,
    context: SearchContext<Cell, Cost>,
}

impl GreedySolver {
    pub fn new(start: Cell, goal: Cell, heuristic: HeuristicId) -> GreedySolver {
        GreedySolver {
            goal,
            heuristic,
            context: SearchContext::new(start),
        }
    }
}

impl GridSolver for GreedySolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let goal = self.goal;
        let heuristic = self.heuristic;
        self.context
            .expand(
                max_expansions,
                |node| grid.neighbors_and_cost(node),
                |node, _| (heuristic.estimate(node, &goal), 0),
                |node| *node == goal,
                false,
            )
            .into_progress()
    }

    fn nodes_explored(&self) -> usize {
        self.context.expanded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// With a clear line of sight only the cells on the straight line are expanded.
    #[test]
    fn straight_line() {
        let grid = GridWorld::new(8, 3);
        let goal = Cell::planar(7, 1);
        let mut solver = GreedySolver::new(Cell::planar(0, 1), goal, HeuristicId::Manhattan);
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 8);
        assert_eq!(solver.nodes_explored(), 8);
    }

    /// A dead end facing the goal lures the search in; the path it settles on is
    /// longer than the shortest one.
    #[test]
    fn lured_into_dead_end() {
        let grid = GridWorld::from_ascii(
            "......\n\
             .####.\n\
             ...#..\n\
             ####..\n\
             ......",
        )
        .unwrap();
        let start = Cell::planar(0, 2);
        let goal = Cell::planar(4, 2);
        let mut solver = GreedySolver::new(start, goal, HeuristicId::Manhattan);
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("goal is reachable");
        };
        assert!(grid.validate_path(&path));
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(solver.nodes_explored() > 3);
    }
}
