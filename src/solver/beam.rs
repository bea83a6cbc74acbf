use indexmap::map::Entry::Vacant;
use log::debug;

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::search_context::{reverse_path, FxIndexMap, NO_PARENT};
use crate::solver::{GridSolver, Progress};
use crate::Cost;

/// Beam search: breadth-first by depth level, but only the `beam_width` candidates
/// with the lowest heuristic survive into the next level. Cells are marked visited
/// when first discovered, including those later pruned, so the search can miss
/// paths that breadth-first search finds.
pub struct BeamSolver {
    goal: Cell,
    heuristic: HeuristicId,
    beam_width: usize,
    parents: FxIndexMap<Cell, usize>,
    layer: Vec<usize>,
    cursor: usize,
    candidates: Vec<(Cost, usize)>,
    depth: usize,
    explored: usize,
}

impl BeamSolver {
    /// A `beam_width` of 0 is treated as 1.
    pub fn new(start: Cell, goal: Cell, heuristic: HeuristicId, beam_width: usize) -> BeamSolver {
        let mut parents = FxIndexMap::default();
        parents.insert(start, NO_PARENT);
        BeamSolver {
            goal,
            heuristic,
            beam_width: beam_width.max(1),
            parents,
            layer: vec![0],
            cursor: 0,
            candidates: Vec::new(),
            depth: 0,
            explored: 0,
        }
    }

    /// Replaces the finished level by the best candidates discovered from it. Returns
    /// false when there is nothing left to explore.
    fn next_layer(&mut self) -> bool {
        if self.candidates.is_empty() {
            return false;
        }
        // Stable, so equal scores keep their discovery order.
        self.candidates.sort_by_key(|&(h, _)| h);
        self.candidates.truncate(self.beam_width);
        self.layer.clear();
        self.layer.extend(self.candidates.drain(..).map(|(_, i)| i));
        self.cursor = 0;
        self.depth += 1;
        debug!("Beam level {} keeps {} cells", self.depth, self.layer.len());
        true
    }
}

impl GridSolver for BeamSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let mut remaining = max_expansions;
        while remaining > 0 {
            if self.cursor == self.layer.len() && !self.next_layer() {
                return Progress::exhausted();
            }
            let index = self.layer[self.cursor];
            self.cursor += 1;
            let Some((&node, _)) = self.parents.get_index(index) else {
                continue;
            };
            self.explored += 1;
            remaining -= 1;
            if node == self.goal {
                return Progress::Found(reverse_path(&self.parents, |&p| p, index));
            }
            for neighbor in grid.neighbors(&node) {
                if let Vacant(e) = self.parents.entry(neighbor) {
                    self.candidates
                        .push((self.heuristic.estimate(&neighbor, &self.goal), e.index()));
                    e.insert(index);
                }
            }
        }
        if self.cursor == self.layer.len() && self.candidates.is_empty() {
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

    /// A beam of one behaves like a greedy walk along the heuristic.
    #[test]
    fn narrow_beam_walks_straight() {
        let grid = GridWorld::new(6, 6);
        let goal = Cell::planar(5, 0);
        let mut solver = BeamSolver::new(Cell::planar(0, 0), goal, HeuristicId::Manhattan, 1);
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 6);
        assert_eq!(solver.nodes_explored(), 6);
    }

    /// Pruning the only way around a wall makes the search fail where breadth-first
    /// search succeeds.
    #[test]
    fn pruned_detour_fails() {
        let grid = GridWorld::from_ascii(
            "S..#G\n\
             .###.\n\
             .....",
        )
        .unwrap();
        let start = Cell::planar(0, 0);
        let goal = Cell::planar(4, 0);
        assert!(grid.reachable(&start, &goal));
        let mut narrow = BeamSolver::new(start, goal, HeuristicId::Manhattan, 1);
        assert_eq!(narrow.run(&grid), Progress::exhausted());
        let mut wide = BeamSolver::new(start, goal, HeuristicId::Manhattan, 10);
        let Progress::Found(path) = wide.run(&grid) else {
            panic!("a wide beam keeps every candidate here");
        };
        assert!(grid.validate_path(&path));
    }

    #[test]
    fn zero_width_keeps_one() {
        let grid = GridWorld::new(4, 1);
        let goal = Cell::planar(3, 0);
        let mut solver = BeamSolver::new(Cell::planar(0, 0), goal, HeuristicId::Manhattan, 0);
        let Progress::Found(path) = solver.run(&grid) else {
            panic!("a single corridor needs no width");
        };
        assert_eq!(path.len(), 4);
    }
}
