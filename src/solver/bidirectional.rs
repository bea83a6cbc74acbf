use indexmap::map::Entry::Vacant;
use log::{debug, trace};
use std::collections::VecDeque;

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::search_context::{reverse_path, FxIndexMap, NO_PARENT};
use crate::solver::{GridSolver, Progress};

/// One direction of the search: a breadth-first tree storing `(parent, depth)` per cell.
struct Frontier {
    parents: FxIndexMap<Cell, (usize, usize)>,
    queue: VecDeque<usize>,
}

impl Frontier {
    fn new(root: Cell) -> Frontier {
        let mut parents = FxIndexMap::default();
        parents.insert(root, (NO_PARENT, 0));
        Frontier {
            parents,
            queue: VecDeque::from([0]),
        }
    }

    /// Depth of the next cell to be expanded.
    fn front_depth(&self) -> Option<usize> {
        self.queue
            .front()
            .and_then(|&i| self.parents.get_index(i))
            .map(|(_, &(_, depth))| depth)
    }

    /// Cells from the root to the cell at `index`.
    fn path_to(&self, index: usize) -> Vec<Cell> {
        reverse_path(&self.parents, |&(p, _)| p, index)
    }
}

/// The best known connection: the tree cell on the expanding side and the cell of
/// the other tree it is adjacent to.
#[derive(Clone, Copy, Debug)]
struct Meeting {
    length: usize,
    forward: usize,
    backward: usize,
}

/// Breadth-first search from both ends at once, alternating one expansion per side.
/// Each expansion checks whether a discovered edge touches the other tree. The best
/// connection is kept until the frontier depths prove that nothing shorter remains,
/// so the path is shortest on unit-cost grids. Traversal costs are ignored.
pub struct BidirectionalSolver {
    forward: Frontier,
    backward: Frontier,
    forward_turn: bool,
    best: Option<Meeting>,
    explored: usize,
}

impl BidirectionalSolver {
    pub fn new(start: Cell, goal: Cell) -> BidirectionalSolver {
        let best = (start == goal).then_some(Meeting {
            length: 0,
            forward: 0,
            backward: NO_PARENT,
        });
        BidirectionalSolver {
            forward: Frontier::new(start),
            backward: Frontier::new(goal),
            forward_turn: true,
            best,
            explored: 0,
        }
    }

    /// Whether the search may stop: one side ran dry, or no pair of unexpanded cells
    /// can be joined by a path shorter than the best one.
    fn settled(&self) -> bool {
        match (self.forward.front_depth(), self.backward.front_depth()) {
            (Some(f), Some(b)) => self.best.is_some_and(|m| f + b >= m.length),
            _ => true,
        }
    }

    fn build_path(&self, meeting: Meeting) -> Vec<Cell> {
        let mut path = self.forward.path_to(meeting.forward);
        let tail = self.backward.path_to(meeting.backward);
        path.extend(tail.into_iter().rev());
        path
    }

    /// Expands one cell of `this` and returns the shortest connection it discovered,
    /// as `(length, index in this, index in other)`.
    fn expand(
        this: &mut Frontier,
        other: &Frontier,
        grid: &GridWorld,
    ) -> Option<(usize, usize, usize)> {
        let index = this.queue.pop_front()?;
        let (&node, &(_, depth)) = this.parents.get_index(index)?;
        trace!("Bidirectional search expands {node} at depth {depth}");
        let mut best: Option<(usize, usize, usize)> = None;
        for neighbor in grid.neighbors(&node) {
            if let Vacant(e) = this.parents.entry(neighbor) {
                this.queue.push_back(e.index());
                e.insert((index, depth + 1));
            }
            if let Some((other_index, _, &(_, other_depth))) = other.parents.get_full(&neighbor) {
                let length = depth + 1 + other_depth;
                if best.map_or(true, |(l, _, _)| length < l) {
                    best = Some((length, index, other_index));
                }
            }
        }
        best
    }
}

impl GridSolver for BidirectionalSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        for _ in 0..max_expansions {
            if self.settled() {
                break;
            }
            let found = if self.forward_turn {
                Self::expand(&mut self.forward, &self.backward, grid).map(
                    |(length, forward, backward)| Meeting {
                        length,
                        forward,
                        backward,
                    },
                )
            } else {
                Self::expand(&mut self.backward, &self.forward, grid).map(
                    |(length, backward, forward)| Meeting {
                        length,
                        forward,
                        backward,
                    },
                )
            };
            self.explored += 1;
            self.forward_turn = !self.forward_turn;
            if let Some(meeting) = found {
                if self.best.map_or(true, |m| meeting.length < m.length) {
                    debug!("Frontiers meet with a path of {} moves", meeting.length);
                    self.best = Some(meeting);
                }
            }
        }
        if !self.settled() {
            return Progress::Pending;
        }
        match self.best {
            Some(meeting) => Progress::Found(self.build_path(meeting)),
            None => Progress::exhausted(),
        }
    }

    fn nodes_explored(&self) -> usize {
        self.explored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_world::Connectivity;
    use itertools::Itertools;

    fn solve(grid: &GridWorld, start: Cell, goal: Cell) -> (Progress, usize) {
        let mut solver = BidirectionalSolver::new(start, goal);
        let progress = solver.run(grid);
        (progress, solver.nodes_explored())
    }

    #[test]
    fn joins_both_halves() {
        let grid = GridWorld::new(7, 1);
        let (progress, _) = solve(&grid, Cell::planar(0, 0), Cell::planar(6, 0));
        assert_eq!(
            progress,
            Progress::Found((0..7).map(|c| Cell::planar(c, 0)).collect())
        );
    }

    #[test]
    fn adjacent_endpoints() {
        let grid = GridWorld::new(2, 1);
        let (progress, explored) = solve(&grid, Cell::planar(0, 0), Cell::planar(1, 0));
        assert_eq!(
            progress,
            Progress::Found(vec![Cell::planar(0, 0), Cell::planar(1, 0)])
        );
        assert_eq!(explored, 1);
    }

    /// Two routes around a wall; the short one is returned without repeated cells.
    #[test]
    fn keeps_best_meeting() {
        let grid = GridWorld::from_ascii(
            "S.......\n\
             .######.\n\
             .######.\n\
             ...G....",
        )
        .unwrap();
        let start = Cell::planar(0, 0);
        let goal = Cell::planar(3, 3);
        let (progress, _) = solve(&grid, start, goal);
        let Progress::Found(path) = progress else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 7);
        assert!(grid.validate_path(&path));
        assert!(path.iter().all_unique());
    }

    #[test]
    fn diagonal_grid() {
        let grid = GridWorld::new(6, 6).with_connectivity(Connectivity::Eight);
        let (progress, _) = solve(&grid, Cell::planar(0, 0), Cell::planar(5, 3));
        let Progress::Found(path) = progress else {
            panic!("goal is reachable");
        };
        assert_eq!(path.len(), 6);
        assert!(grid.validate_path(&path));
    }

    #[test]
    fn separated_endpoints() {
        let grid = GridWorld::from_ascii(
            "..#..\n\
             ..#..",
        )
        .unwrap();
        let (progress, _) = solve(&grid, Cell::planar(0, 0), Cell::planar(4, 0));
        assert_eq!(progress, Progress::exhausted());
    }
}
