use indexmap::map::Entry::Vacant;
use log::trace;
use std::collections::VecDeque;

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::search_context::{reverse_path, FxIndexMap, NO_PARENT};
use crate::solver::{GridSolver, Progress};

/// Breadth-first search. Cells are marked visited when enqueued; the parent map keeps
/// them in discovery order, so the queue only holds indices into it.
pub struct BfsSolver {
    goal: Cell,
    parents: FxIndexMap<Cell, usize>,
    queue: VecDeque<usize>,
    explored: usize,
}

impl BfsSolver {
    pub fn new(start: Cell, goal: Cell) -> BfsSolver {
        let mut parents = FxIndexMap::default();
        parents.insert(start, NO_PARENT);
        BfsSolver {
            goal,
            parents,
            queue: VecDeque::from([0]),
            explored: 0,
        }
    }
}

impl GridSolver for BfsSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let mut remaining = max_expansions;
        while remaining > 0 {
            let Some(index) = self.queue.pop_front() else {
                return Progress::exhausted();
            };
            let Some((&node, _)) = self.parents.get_index(index) else {
                continue;
            };
            self.explored += 1;
            remaining -= 1;
            trace!("BFS expands {node}");
            if node == self.goal {
                return Progress::Found(reverse_path(&self.parents, |&p| p, index));
            }
            for neighbor in grid.neighbors(&node) {
                if let Vacant(e) = self.parents.entry(neighbor) {
                    self.queue.push_back(e.index());
                    e.insert(index);
                }
            }
        }
        if self.queue.is_empty() {
            Progress::exhausted()
        } else {
            Progress::Pending
        }
    }

    fn nodes_explored(&self) -> usize {
        self.explored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_around_wall() {
        let grid = GridWorld::from_ascii(
            ".....\n\
             .###.\n\
             ...#.",
        )
        .unwrap();
        let mut solver = BfsSolver::new(Cell::planar(0, 2), Cell::planar(4, 2));
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 9);
        assert!(grid.validate_path(&path));
    }

    /// Stepping one expansion at a time gives the same answer as a full run.
    #[test]
    fn stepwise_matches_run() {
        let grid = GridWorld::new(6, 6);
        let start = Cell::planar(1, 1);
        let goal = Cell::planar(5, 4);
        let mut full = BfsSolver::new(start, goal);
        let expected = full.run(&grid);
        let mut stepped = BfsSolver::new(start, goal);
        let mut steps = 0;
        let result = loop {
            steps += 1;
            match stepped.step(&grid, 1) {
                Progress::Pending => continue,
                done => break done,
            }
        };
        assert_eq!(result, expected);
        assert_eq!(steps, full.nodes_explored());
        assert_eq!(stepped.nodes_explored(), full.nodes_explored());
    }

    /// Ties are broken by neighbour order: east is tried before south.
    #[test]
    fn prefers_east_first() {
        let grid = GridWorld::new(2, 2);
        let mut solver = BfsSolver::new(Cell::planar(0, 0), Cell::planar(1, 1));
        assert_eq!(
            solver.run(&grid),
            Progress::Found(vec![
                Cell::planar(0, 0),
                Cell::planar(1, 0),
                Cell::planar(1, 1)
            ])
        );
    }
}
