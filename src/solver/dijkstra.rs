use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::search_context::SearchContext;
use crate::solver::{GridSolver, Progress};
use crate::Cost;

/// Uniform-cost search: the frontier is ordered by accumulated traversal cost, and a
/// cell reached more cheaply later is queued again with the outdated entry skipped
/// when popped. Optimal under any cost model with costs of at least 1.
pub struct DijkstraSolver {
    goal: Cell,
    context: SearchContext<Cell, Cost>,
}

impl DijkstraSolver {
    pub fn new(start: Cell, goal: Cell) -> DijkstraSolver {
        DijkstraSolver {
            goal,
            context: SearchContext::new(start),
        }
    }
}

impl GridSolver for DijkstraSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let goal = self.goal;
        self.context
            .expand(
                max_expansions,
                |node| grid.neighbors_and_cost(node),
                |_, cost| (cost, 0),
                |node| *node == goal,
                true,
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

    /// A band of expensive terrain on the direct route is avoided when a cheaper
    /// detour exists.
    #[test]
    fn avoids_expensive_terrain() {
        let grid = GridWorld::from_ascii(
            "S333G\n\
             .....",
        )
        .unwrap();
        let mut solver = DijkstraSolver::new(Cell::planar(0, 0), Cell::planar(4, 0));
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 7);
        assert_eq!(grid.path_cost(&path), 6);
        assert!(path.contains(&Cell::planar(2, 1)));
    }

    #[test]
    fn exhausts_enclosed_start() {
        let grid = GridWorld::from_ascii(
            ".#.\n\
             ##.\n\
             ...",
        )
        .unwrap();
        let mut solver = DijkstraSolver::new(Cell::planar(0, 0), Cell::planar(2, 2));
        assert_eq!(solver.run(&grid), Progress::exhausted());
        assert_eq!(solver.nodes_explored(), 1);
    }
}
