use fxhash::FxHashMap;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::solver::{GridSolver, Progress};
use crate::N_SMALLVEC_SIZE;

struct Frame {
    cell: Cell,
    depth: usize,
    neighbors: SmallVec<[Cell; N_SMALLVEC_SIZE]>,
    next: usize,
}

/// Iterative deepening: depth-limited depth-first searches with limits 0, 1, 2, ...
/// up to `max_depth`. Within one iteration a cell is entered again only when reached
/// at a strictly smaller depth than before, which keeps every cell within the limit
/// reachable and makes the first path found a shortest one. Traversal costs are
/// ignored.
///
/// An iteration in which no cell was cut off by the limit has seen everything
/// reachable, so the search stops there instead of deepening further.
pub struct IdsSolver {
    start: Cell,
    goal: Cell,
    max_depth: usize,
    limit: usize,
    started: bool,
    stack: Vec<Frame>,
    best_depth: FxHashMap<Cell, usize>,
    cut_off: bool,
    visits: usize,
}

impl IdsSolver {
    pub fn new(start: Cell, goal: Cell, max_depth: usize) -> IdsSolver {
        IdsSolver {
            start,
            goal,
            max_depth,
            limit: 0,
            started: false,
            stack: Vec::new(),
            best_depth: FxHashMap::default(),
            cut_off: false,
            visits: 0,
        }
    }

    /// The depth limit of the current iteration.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Enters `cell` at `depth`. Returns the path if it is the goal.
    fn visit(&mut self, grid: &GridWorld, cell: Cell, depth: usize) -> Option<Vec<Cell>> {
        self.visits += 1;
        self.best_depth.insert(cell, depth);
        trace!("IDS visits {cell} at depth {depth}");
        if cell == self.goal {
            let mut path: Vec<Cell> = self.stack.iter().map(|f| f.cell).collect();
            path.push(cell);
            return Some(path);
        }
        let neighbors = if depth < self.limit {
            grid.neighbors(&cell)
        } else {
            let deeper = grid.neighbors(&cell).iter().any(|n| {
                self.best_depth
                    .get(n)
                    .map_or(true, |&best| depth + 1 < best)
            });
            self.cut_off |= deeper;
            SmallVec::new()
        };
        self.stack.push(Frame {
            cell,
            depth,
            neighbors,
            next: 0,
        });
        None
    }
}

impl GridSolver for IdsSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        let mut remaining = max_expansions;
        loop {
            if remaining == 0 {
                return Progress::Pending;
            }
            let Some(top) = self.stack.last_mut() else {
                if self.started {
                    if !self.cut_off {
                        debug!("IDS saw every reachable cell within depth {}", self.limit);
                        return Progress::exhausted();
                    }
                    if self.limit >= self.max_depth {
                        debug!("IDS reached its depth cap of {}", self.max_depth);
                        return Progress::NotFound {
                            partial: Vec::new(),
                            budget_exhausted: true,
                        };
                    }
                    self.limit += 1;
                }
                self.started = true;
                self.cut_off = false;
                self.best_depth.clear();
                debug!("IDS iteration with depth limit {}", self.limit);
                remaining -= 1;
                if let Some(path) = self.visit(grid, self.start, 0) {
                    return Progress::Found(path);
                }
                continue;
            };
            if top.next == top.neighbors.len() {
                self.stack.pop();
                continue;
            }
            let neighbor = top.neighbors[top.next];
            top.next += 1;
            let depth = top.depth + 1;
            if self
                .best_depth
                .get(&neighbor)
                .is_some_and(|&best| best <= depth)
            {
                continue;
            }
            remaining -= 1;
            if let Some(path) = self.visit(grid, neighbor, depth) {
                return Progress::Found(path);
            }
        }
    }

    fn nodes_explored(&self) -> usize {
        self.visits
    }
}
