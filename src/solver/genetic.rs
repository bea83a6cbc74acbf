use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cell::Cell;
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::solver::{GridSolver, Progress, SearchParams};
use crate::MIN_GENOME_LENGTH;

/// Fitness lost per move that ran into a wall or off the grid.
pub const COLLISION_PENALTY: f64 = 0.25;
/// Fitness lost per move taken, so that shorter walks rank higher.
pub const STEP_WEIGHT: f64 = 0.01;

/// A genome is a fixed-length sequence of indices into the grid's move directions.
type Genome = Vec<u8>;

/// Walk described by a genome: moves into blocked or outside cells are skipped and
/// counted, and the walk ends as soon as the goal is entered.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub path: Vec<Cell>,
    pub collisions: usize,
}

impl Decoded {
    pub fn reaches(&self, goal: &Cell) -> bool {
        self.path.last() == Some(goal)
    }
}

/// Population-based planner. Each generation is ranked by fitness, the top half
/// survives, and children are built by one-point crossover of two survivors plus an
/// occasional point mutation. The best genome is copied unchanged into the next
/// generation, so the best fitness never decreases.
///
/// Evaluating one genome counts as one explored node, and a step evaluates at most
/// `max_expansions` genomes. Every random choice comes from a generator seeded with
/// [SearchParams::seed], so identical requests evolve identically.
pub struct GeneticSolver {
    start: Cell,
    goal: Cell,
    heuristic: HeuristicId,
    population_size: usize,
    generations: usize,
    mutation_rate: f64,
    genome_length: usize,
    rng: StdRng,
    directions: &'static [(i32, i32)],
    population: Vec<Genome>,
    scores: Vec<f64>,
    generation: usize,
    best: Option<(f64, Vec<Cell>)>,
    history: Vec<f64>,
    evaluations: usize,
}

impl GeneticSolver {
    /// Out-of-range parameters are clamped: at least two genomes and one generation,
    /// a mutation rate within `[0, 1]`.
    pub fn new(start: Cell, goal: Cell, heuristic: HeuristicId, params: &SearchParams) -> Self {
        let genome_length = ((2 * start.manhattan_distance(&goal)) as usize).max(MIN_GENOME_LENGTH);
        GeneticSolver {
            start,
            goal,
            heuristic,
            population_size: params.population_size.max(2),
            generations: params.generations.max(1),
            mutation_rate: if params.mutation_rate.is_nan() {
                0.0
            } else {
                params.mutation_rate.clamp(0.0, 1.0)
            },
            genome_length,
            rng: StdRng::seed_from_u64(params.seed),
            directions: &[],
            population: Vec::new(),
            scores: Vec::new(),
            generation: 0,
            best: None,
            history: Vec::new(),
            evaluations: 0,
        }
    }

    /// Highest fitness of each completed generation, oldest first.
    pub fn best_fitness_history(&self) -> &[f64] {
        &self.history
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn genome_length(&self) -> usize {
        self.genome_length
    }

    pub fn decode(&self, grid: &GridWorld, genome: &[u8]) -> Decoded {
        let mut path = vec![self.start];
        let mut collisions = 0;
        let mut current = self.start;
        if current == self.goal {
            return Decoded { path, collisions };
        }
        for &gene in genome {
            let Some(&(d_col, d_row)) = self.directions.get(gene as usize) else {
                continue;
            };
            let next = current.offset(d_col, d_row);
            if !grid.can_step(&current, &next) {
                collisions += 1;
                continue;
            }
            current = next;
            path.push(current);
            if current == self.goal {
                break;
            }
        }
        Decoded { path, collisions }
    }

    pub fn fitness(&self, decoded: &Decoded) -> f64 {
        let end = decoded.path.last().unwrap_or(&self.start);
        let distance = self.heuristic.estimate(end, &self.goal) as f64;
        let steps = decoded.path.len().saturating_sub(1) as f64;
        1.0 / (1.0 + distance + COLLISION_PENALTY * decoded.collisions as f64 + STEP_WEIGHT * steps)
    }

    fn random_genome(&mut self) -> Genome {
        let n_moves = self.directions.len() as u8;
        (0..self.genome_length)
            .map(|_| self.rng.gen_range(0..n_moves))
            .collect()
    }

    fn seed_population(&mut self, grid: &GridWorld) {
        self.directions = grid.connectivity().directions();
        self.population = (0..self.population_size)
            .map(|_| self.random_genome())
            .collect();
        debug!(
            "Seeded {} genomes of length {}",
            self.population_size, self.genome_length
        );
    }

    /// Replaces the fully evaluated population by its offspring.
    fn breed(&mut self) {
        let mut ranked: Vec<usize> = (0..self.population.len()).collect();
        ranked.sort_by(|&a, &b| self.scores[b].total_cmp(&self.scores[a]));
        let survivors: Vec<Genome> = ranked
            .iter()
            .take((self.population_size / 2).max(1))
            .map(|&i| self.population[i].clone())
            .collect();
        let n_moves = self.directions.len() as u8;
        let mut next = Vec::with_capacity(self.population_size);
        // Elitism: the best genome survives unmutated.
        next.push(survivors[0].clone());
        while next.len() < self.population_size {
            let first = &survivors[self.rng.gen_range(0..survivors.len())];
            let second = &survivors[self.rng.gen_range(0..survivors.len())];
            let split = self.rng.gen_range(1..self.genome_length);
            let mut child: Genome = first[..split]
                .iter()
                .chain(&second[split..])
                .copied()
                .collect();
            if self.rng.gen_bool(self.mutation_rate) {
                let at = self.rng.gen_range(0..self.genome_length);
                child[at] = self.rng.gen_range(0..n_moves);
            }
            next.push(child);
        }
        self.population = next;
        self.scores.clear();
    }

    fn best_path(&self) -> Vec<Cell> {
        self.best
            .as_ref()
            .map_or_else(|| vec![self.start], |(_, path)| path.clone())
    }
}

impl GridSolver for GeneticSolver {
    fn step(&mut self, grid: &GridWorld, max_expansions: usize) -> Progress {
        if self.population.is_empty() {
            self.seed_population(grid);
        }
        let mut remaining = max_expansions;
        while remaining > 0 {
            let cursor = self.scores.len();
            if let Some(genome) = self.population.get(cursor) {
                let decoded = self.decode(grid, genome);
                let fitness = self.fitness(&decoded);
                self.evaluations += 1;
                remaining -= 1;
                self.scores.push(fitness);
                if decoded.reaches(&self.goal) {
                    debug!(
                        "Genome {} of generation {} reaches the goal in {} moves",
                        cursor,
                        self.generation,
                        decoded.path.len() - 1
                    );
                    return Progress::Found(decoded.path);
                }
                if self.best.as_ref().map_or(true, |(f, _)| fitness > *f) {
                    self.best = Some((fitness, decoded.path));
                }
                continue;
            }
            let generation_best = self.scores.iter().copied().fold(f64::MIN, f64::max);
            self.history.push(generation_best);
            self.generation += 1;
            debug!(
                "Generation {} best fitness {:.4}",
                self.generation, generation_best
            );
            if self.generation >= self.generations {
                return Progress::NotFound {
                    partial: self.best_path(),
                    budget_exhausted: true,
                };
            }
            self.breed();
        }
        Progress::Pending
    }

    fn nodes_explored(&self) -> usize {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_world::Connectivity;

    fn solver(start: Cell, goal: Cell, params: &SearchParams) -> GeneticSolver {
        GeneticSolver::new(start, goal, HeuristicId::Manhattan, params)
    }

    #[test]
    fn decode_skips_walls() {
        let grid = GridWorld::from_ascii(
            "..#\n\
             ...",
        )
        .unwrap();
        let mut ga = solver(Cell::planar(0, 0), Cell::planar(2, 1), &SearchParams::default());
        ga.directions = grid.connectivity().directions();
        // east, east (wall), south, east
        let decoded = ga.decode(&grid, &[0, 0, 2, 0, 0]);
        assert_eq!(
            decoded.path,
            vec![
                Cell::planar(0, 0),
                Cell::planar(1, 0),
                Cell::planar(1, 1),
                Cell::planar(2, 1)
            ]
        );
        assert_eq!(decoded.collisions, 1);
        assert!(decoded.reaches(&Cell::planar(2, 1)));
    }

    #[test]
    fn fitness_prefers_closer_walks() {
        let ga = solver(Cell::planar(0, 0), Cell::planar(4, 0), &SearchParams::default());
        let near = Decoded {
            path: vec![Cell::planar(0, 0), Cell::planar(1, 0), Cell::planar(2, 0)],
            collisions: 0,
        };
        let far = Decoded {
            path: vec![Cell::planar(0, 0), Cell::planar(0, 1)],
            collisions: 0,
        };
        let bumped = Decoded {
            collisions: 3,
            ..near.clone()
        };
        assert!(ga.fitness(&near) > ga.fitness(&far));
        assert!(ga.fitness(&near) > ga.fitness(&bumped));
    }

    #[test]
    fn genome_length_floor() {
        let params = SearchParams::default();
        assert_eq!(
            solver(Cell::planar(0, 0), Cell::planar(1, 1), &params).genome_length(),
            MIN_GENOME_LENGTH
        );
        assert_eq!(
            solver(Cell::planar(0, 0), Cell::planar(15, 10), &params).genome_length(),
            50
        );
    }

    /// The elite carries over, so the best fitness never drops between generations.
    #[test]
    fn best_fitness_is_monotone() {
        let grid = GridWorld::from_ascii(
            "..........\n\
             .########.\n\
             .#......#.\n\
             .#.####.#.\n\
             ...#..#...",
        )
        .unwrap();
        let params = SearchParams::default().with_generations(30).with_seed(7);
        let mut ga = solver(Cell::planar(0, 4), Cell::planar(4, 4), &params);
        let progress = ga.run(&grid);
        let history = ga.best_fitness_history();
        assert!(history.windows(2).all(|w| w[0] <= w[1]));
        match progress {
            Progress::Found(path) => assert!(grid.validate_path(&path)),
            Progress::NotFound {
                partial,
                budget_exhausted,
            } => {
                assert!(budget_exhausted);
                assert_eq!(history.len(), 30);
                assert_eq!(ga.nodes_explored(), 30 * params.population_size);
                assert!(grid.validate_path(&partial));
            }
            Progress::Pending => unreachable!(),
        }
    }

    #[test]
    fn same_seed_same_result() {
        let grid = GridWorld::new(8, 8).with_connectivity(Connectivity::Eight);
        let params = SearchParams::default().with_seed(42);
        let start = Cell::planar(0, 0);
        let goal = Cell::planar(7, 5);
        let mut first = solver(start, goal, &params);
        let mut second = solver(start, goal, &params);
        assert_eq!(first.run(&grid), second.run(&grid));
        assert_eq!(first.nodes_explored(), second.nodes_explored());
    }

    /// Budgeted steps evaluate exactly that many genomes.
    #[test]
    fn steps_count_evaluations() {
        let grid = GridWorld::from_ascii(
            "...#...\n\
             ...#...",
        )
        .unwrap();
        let params = SearchParams::default()
            .with_population_size(4)
            .with_generations(3);
        let mut ga = solver(Cell::planar(0, 0), Cell::planar(6, 0), &params);
        assert_eq!(ga.step(&grid, 3), Progress::Pending);
        assert_eq!(ga.nodes_explored(), 3);
        let Progress::NotFound { partial, .. } = ga.run(&grid) else {
            panic!("the goal is walled off");
        };
        assert_eq!(partial.first(), Some(&Cell::planar(0, 0)));
        assert_eq!(ga.nodes_explored(), 12);
        assert_eq!(ga.best_fitness_history().len(), 3);
    }

    #[test]
    fn clamps_out_of_range_params() {
        let grid = GridWorld::from_ascii(
            "..#..\n\
             ..#..",
        )
        .unwrap();
        let (start, goal) = (Cell::planar(0, 0), Cell::planar(4, 0));
        let params = SearchParams::default()
            .with_population_size(0)
            .with_generations(0)
            .with_mutation_rate(3.0);
        let mut ga = solver(start, goal, &params);
        assert!(matches!(
            ga.run(&grid),
            Progress::NotFound {
                budget_exhausted: true,
                ..
            }
        ));
        assert_eq!(ga.nodes_explored(), 2);
        assert_eq!(ga.best_fitness_history().len(), 1);
        let nan = SearchParams::default()
            .with_generations(2)
            .with_mutation_rate(f64::NAN);
        let mut ga = solver(start, goal, &nan);
        assert!(matches!(ga.run(&grid), Progress::NotFound { .. }));
        assert_eq!(ga.best_fitness_history().len(), 2);
    }
}
