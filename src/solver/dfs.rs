use indexmap::map::Entry::Vacant;
use log::trace;

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::search_context::{reverse_path, FxIndexMap, NO_PARENT};
use crate::solver::{GridSolver, Progress};

/// Depth-first search with an explicit stack. A cell is marked visited when pushed,
/// so its parent is whichever expanded cell discovered it first. The last neighbour
/// pushed is explored first.
pub struct DfsSolver {
    goal: Cell,
    parents: FxIndexMap<Cell, usize>,
    stack: Vec<usize>,
    explored: usize,
}

impl DfsSolver {
    pub fn new(start: Cell, goal: Cell) -> DfsSolver {
        let mut parents = FxIndexMap::default();
        parents.insert(start, NO_PARENT);
        DfsSolver {
            goal,
            parents,
            stack: vec![0],
            explored: 0,
        }
    }
}

impl GridSolver for DfsSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        for _ in 0..max_expansions {
            let Some(index) = self.stack.pop() else {
                return Progress::exhausted();
            };
            let Some((&node, _)) = self.parents.get_index(index) else {
                continue;
            };
            self.explored += 1;
            trace!("DFS expands {node}");
            if node == self.goal {
                return Progress::Found(reverse_path(&self.parents, |&p| p, index));
            }
            for neighbor in grid.neighbors(&node) {
                if let Vacant(e) = self.parents.entry(neighbor) {
                    self.stack.push(e.index());
                    e.insert(index);
                }
            }
        }
        if self.stack.is_empty() {
            Progress::exhausted()
        } else {
            Progress::Pending
        }
    }

    fn nodes_explored(&self) -> usize {
        self.explored
    }
}
