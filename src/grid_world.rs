use crate::cell::Cell;
use crate::error::{PlanError, Result};
use crate::{Cost, N_SMALLVEC_SIZE};
use core::fmt;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{info, warn};
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

/// Straight moves in enumeration order: east, west, south, north.
const CARDINAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
/// Straight moves followed by the four diagonals.
const MOORE: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

fn next_snapshot_id() -> u64 {
    NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Movement model within a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

impl Connectivity {
    /// Planar move offsets in the fixed order every search enumerates them in.
    pub fn directions(&self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::Four => &CARDINAL,
            Connectivity::Eight => &MOORE,
        }
    }
}

/// Walkable/blocked snapshot of a maze with optional per-cell traversal costs.
///
/// Moving into a cell costs that cell's traversal cost (1 unless set otherwise),
/// diagonal moves included. Every mutation assigns a new [snapshot id](Self::snapshot_id),
/// which is how stepwise plans and navigators notice that the maze was regenerated.
///
/// Connected components are kept in a [UnionFind] structure: unblocking a cell joins
/// components directly while blocking one marks them dirty, after which
/// [update](Self::update) or [generate_components](Self::generate_components) must be called
/// before [reachable](Self::reachable) gives exact answers.
#[derive(Clone, Debug)]
pub struct GridWorld {
    width: usize,
    height: usize,
    layers: usize,
    blocked: Vec<bool>,
    costs: FxHashMap<Cell, Cost>,
    links: IndexMap<Cell, SmallVec<[Cell; 2]>, fxhash::FxBuildHasher>,
    connectivity: Connectivity,
    allow_corner_cutting: bool,
    components: UnionFind<usize>,
    components_dirty: bool,
    snapshot_id: u64,
}

impl GridWorld {
    /// An obstacle-free, single-layer, 4-connected grid.
    pub fn new(width: usize, height: usize) -> GridWorld {
        let mut grid = GridWorld {
            width,
            height,
            layers: 1,
            blocked: vec![false; width * height],
            costs: FxHashMap::default(),
            links: IndexMap::default(),
            connectivity: Connectivity::Four,
            allow_corner_cutting: false,
            components: UnionFind::new(width * height),
            components_dirty: false,
            snapshot_id: next_snapshot_id(),
        };
        grid.generate_components();
        grid
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> GridWorld {
        self.connectivity = connectivity;
        self.touch();
        self.generate_components();
        self
    }

    /// Resizes the grid to `layers` stacked floors. Existing cells keep their state and
    /// new floors start free.
    pub fn with_layers(mut self, layers: usize) -> GridWorld {
        let layers = layers.max(1);
        self.blocked.resize(self.width * self.height * layers, false);
        self.layers = layers;
        self.costs.retain(|c, _| (c.layer as usize) < layers);
        self.links
            .retain(|c, _| c.layer >= 0 && (c.layer as usize) < layers);
        for targets in self.links.values_mut() {
            targets.retain(|c| c.layer >= 0 && (c.layer as usize) < layers);
        }
        self.touch();
        self.generate_components();
        self
    }

    /// Whether a diagonal move may squeeze past a blocked orthogonal cell.
    pub fn with_corner_cutting(mut self, allow: bool) -> GridWorld {
        self.allow_corner_cutting = allow;
        self.touch();
        self.generate_components();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn layers(&self) -> usize {
        self.layers
    }
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }
    pub fn allows_corner_cutting(&self) -> bool {
        self.allow_corner_cutting
    }
    pub fn snapshot_id(&self) -> u64 {
        self.snapshot_id
    }
    /// Whether every traversal cost is 1.
    pub fn is_uniform_cost(&self) -> bool {
        self.costs.is_empty()
    }

    fn touch(&mut self) {
        self.snapshot_id = next_snapshot_id();
    }

    pub fn in_bounds(&self, cell: &Cell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && cell.layer >= 0
            && (cell.col as usize) < self.width
            && (cell.row as usize) < self.height
            && (cell.layer as usize) < self.layers
    }

    fn index(&self, cell: &Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(
                (cell.layer as usize * self.height + cell.row as usize) * self.width
                    + cell.col as usize,
            )
        } else {
            None
        }
    }

    fn cell_at(&self, ix: usize) -> Cell {
        let layer_size = self.width * self.height;
        let layer = ix / layer_size;
        let rest = ix % layer_size;
        Cell::new(
            (rest % self.width) as i32,
            (rest / self.width) as i32,
            layer as i32,
        )
    }

    pub fn is_walkable(&self, cell: &Cell) -> bool {
        self.index(cell).is_some_and(|ix| !self.blocked[ix])
    }

    pub fn is_blocked(&self, cell: &Cell) -> bool {
        self.index(cell).is_some_and(|ix| self.blocked[ix])
    }

    /// Fails with the reason a cell cannot be used as a start or goal.
    pub fn check_walkable(&self, cell: &Cell) -> Result<()> {
        match self.index(cell) {
            None => Err(PlanError::OutOfBounds { cell: *cell }),
            Some(ix) if self.blocked[ix] => Err(PlanError::Blocked { cell: *cell }),
            Some(_) => Ok(()),
        }
    }

    /// Traversal cost of entering `cell`.
    pub fn cell_cost(&self, cell: &Cell) -> Cost {
        self.costs.get(cell).copied().unwrap_or(1)
    }

    /// Cost of moving from `from` to the adjacent cell `to`.
    pub fn cost(&self, _from: &Cell, to: &Cell) -> Cost {
        self.cell_cost(to)
    }

    /// Whether a single move from `from` to `to` is allowed: both cells walkable and
    /// either planar neighbours under the connectivity rules or joined by a link.
    pub fn can_step(&self, from: &Cell, to: &Cell) -> bool {
        if !self.is_walkable(from) || !self.is_walkable(to) || from == to {
            return false;
        }
        if from.layer == to.layer {
            let d_col = to.col - from.col;
            let d_row = to.row - from.row;
            if d_col.abs() <= 1 && d_row.abs() <= 1 && self.planar_move_allowed(from, d_col, d_row)
            {
                return true;
            }
        }
        self.links
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    fn planar_move_allowed(&self, from: &Cell, d_col: i32, d_row: i32) -> bool {
        let diagonal = d_col != 0 && d_row != 0;
        if !diagonal {
            return true;
        }
        if self.connectivity == Connectivity::Four {
            return false;
        }
        self.allow_corner_cutting
            || (self.is_walkable(&from.offset(d_col, 0)) && self.is_walkable(&from.offset(0, d_row)))
    }

    /// Walkable neighbours of `cell` in the fixed enumeration order: planar
    /// directions first, then links in insertion order.
    pub fn neighbors(&self, cell: &Cell) -> SmallVec<[Cell; N_SMALLVEC_SIZE]> {
        let mut result: SmallVec<[Cell; N_SMALLVEC_SIZE]> = self
            .connectivity
            .directions()
            .iter()
            .map(|&(d_col, d_row)| cell.offset(d_col, d_row))
            .filter(|n| self.is_walkable(n))
            .filter(|n| self.planar_move_allowed(cell, n.col - cell.col, n.row - cell.row))
            .collect();
        if let Some(targets) = self.links.get(cell) {
            result.extend(targets.iter().copied().filter(|t| self.is_walkable(t)));
        }
        result
    }

    pub fn neighbors_and_cost(&self, cell: &Cell) -> SmallVec<[(Cell, Cost); N_SMALLVEC_SIZE]> {
        self.neighbors(cell)
            .into_iter()
            .map(|n| (n, self.cost(cell, &n)))
            .collect()
    }

    /// Sum of traversal costs along `path`, excluding the first cell.
    pub fn path_cost(&self, path: &[Cell]) -> Cost {
        path.iter()
            .tuple_windows()
            .map(|(a, b)| self.cost(a, b))
            .sum()
    }

    /// Checks that `path` is non-empty and that every consecutive pair is a legal move.
    pub fn validate_path(&self, path: &[Cell]) -> bool {
        !path.is_empty()
            && path.iter().all(|c| self.is_walkable(c))
            && path.iter().tuple_windows().all(|(a, b)| self.can_step(a, b))
    }

    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) -> Result<()> {
        let ix = self
            .index(&cell)
            .ok_or(PlanError::OutOfBounds { cell })?;
        if self.blocked[ix] != blocked && blocked {
            self.components_dirty = true;
        }
        self.blocked[ix] = blocked;
        if !blocked {
            // Diagonal reachability of existing neighbours may depend on this cell, so
            // the 8-connected case is handled by a full regeneration.
            if self.connectivity == Connectivity::Eight && !self.allow_corner_cutting {
                self.components_dirty = true;
            } else {
                for n in self.neighbors(&cell) {
                    if let Some(n_ix) = self.index(&n) {
                        self.components.union(ix, n_ix);
                    }
                }
            }
        }
        self.touch();
        Ok(())
    }

    /// Sets the traversal cost of a cell; 1 restores the default.
    pub fn set_cost(&mut self, cell: Cell, cost: Cost) -> Result<()> {
        if !self.in_bounds(&cell) {
            return Err(PlanError::OutOfBounds { cell });
        }
        if cost < 1 {
            return Err(PlanError::InvalidCost { cell, cost });
        }
        if cost == 1 {
            self.costs.remove(&cell);
        } else {
            self.costs.insert(cell, cost);
        }
        self.touch();
        Ok(())
    }

    /// Blocks or frees the `width` x `height` rectangle whose top-left corner is `corner`.
    pub fn set_rect(&mut self, corner: Cell, width: i32, height: i32, blocked: bool) -> Result<()> {
        for row in corner.row..corner.row + height {
            for col in corner.col..corner.col + width {
                self.set_blocked(Cell::new(col, row, corner.layer), blocked)?;
            }
        }
        Ok(())
    }

    /// Adds a two-way edge between `a` and `b`, typically a staircase between layers.
    pub fn add_link(&mut self, a: Cell, b: Cell) -> Result<()> {
        let a_ix = self.index(&a).ok_or(PlanError::OutOfBounds { cell: a })?;
        let b_ix = self.index(&b).ok_or(PlanError::OutOfBounds { cell: b })?;
        for (from, to) in [(a, b), (b, a)] {
            let targets = self.links.entry(from).or_default();
            if !targets.contains(&to) {
                targets.push(to);
            }
        }
        if !self.blocked[a_ix] && !self.blocked[b_ix] {
            self.components.union(a_ix, b_ix);
        }
        self.touch();
        Ok(())
    }

    /// Retrieves the component id a walkable cell belongs to.
    pub fn component(&self, cell: &Cell) -> Option<usize> {
        self.index(cell).map(|ix| self.components.find(ix))
    }

    /// Checks if start and goal are walkable and on the same component.
    pub fn reachable(&self, start: &Cell, goal: &Cell) -> bool {
        if self.components_dirty {
            warn!("Querying reachability on dirty components; call update() first");
        }
        match (self.index(start), self.index(goal)) {
            (Some(s), Some(g)) if !self.blocked[s] && !self.blocked[g] => {
                self.components.equiv(s, g)
            }
            _ => false,
        }
    }

    pub fn unreachable(&self, start: &Cell, goal: &Cell) -> bool {
        !self.reachable(start, goal)
    }

    pub fn components_dirty(&self) -> bool {
        self.components_dirty
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up walkable neighbours.
    pub fn generate_components(&mut self) {
        let n = self.blocked.len();
        self.components = UnionFind::new(n);
        self.components_dirty = false;
        for ix in 0..n {
            if self.blocked[ix] {
                continue;
            }
            let cell = self.cell_at(ix);
            for neighbor in self.neighbors(&cell) {
                if let Some(n_ix) = self.index(&neighbor) {
                    self.components.union(ix, n_ix);
                }
            }
        }
        info!(
            "Generated connected components for {}x{}x{} grid",
            self.width, self.height, self.layers
        );
    }

    /// Parses a maze drawn in text, one row per line: `#` blocked, `.` free,
    /// `1`-`9` free with that traversal cost, `S` and `G` free start/goal markers.
    /// Blank lines are ignored.
    pub fn parse_ascii(text: &str) -> Result<AsciiMap> {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(PlanError::InvalidMap {
                reason: "map has no rows".to_owned(),
            });
        }
        let mut grid = GridWorld::new(width, rows.len());
        let mut start = None;
        let mut goal = None;
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(PlanError::InvalidMap {
                    reason: format!("row {row} has {} columns, expected {width}", line.chars().count()),
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::planar(col as i32, row as i32);
                match ch {
                    '.' => {}
                    '#' => grid.set_blocked(cell, true)?,
                    'S' => start = Some(cell),
                    'G' => goal = Some(cell),
                    '1'..='9' => grid.set_cost(cell, ch as Cost - '0' as Cost)?,
                    other => {
                        return Err(PlanError::InvalidMap {
                            reason: format!("unexpected character {other:?} at {cell}"),
                        })
                    }
                }
            }
        }
        grid.generate_components();
        Ok(AsciiMap { grid, start, goal })
    }

    pub fn from_ascii(text: &str) -> Result<GridWorld> {
        GridWorld::parse_ascii(text).map(|m| m.grid)
    }
}

/// A grid parsed by [GridWorld::parse_ascii] together with its markers.
#[derive(Clone, Debug)]
pub struct AsciiMap {
    pub grid: GridWorld,
    pub start: Option<Cell>,
    pub goal: Option<Cell>,
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for layer in 0..self.layers as i32 {
            if self.layers > 1 {
                writeln!(f, "Layer {layer}:")?;
            }
            for row in 0..self.height as i32 {
                let line: String = (0..self.width as i32)
                    .map(|col| {
                        let cell = Cell::new(col, row, layer);
                        if self.is_blocked(&cell) {
                            '#'
                        } else {
                            match self.cell_cost(&cell) {
                                1 => '.',
                                c @ 2..=9 => char::from(b'0' + c as u8),
                                _ => '+',
                            }
                        }
                    })
                    .collect();
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}
