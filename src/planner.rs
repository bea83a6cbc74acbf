//! Blocking and stepwise planning on top of the [solver](crate::solver) module. The
//! stepwise mode keeps one search alive across calls so that planning for several
//! agents can be spread over frames.
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::grid_world::GridWorld;
use crate::metrics::MetricsCollector;
use crate::solver::{plan, AlgorithmId, GridSolver, Progress, Search, SearchRequest, SearchResult};

/// Outcome of one [PathPlanner::step].
#[derive(Clone, Debug, PartialEq)]
pub enum PlanProgress {
    /// No plan was started.
    Idle,
    Pending,
    Complete(SearchResult),
}

struct ActivePlan {
    search: Search,
    snapshot_id: u64,
    elapsed: Duration,
}

/// Drives one search at a time. Every finished plan is handed to the
/// [MetricsCollector] passed in by the caller.
#[derive(Default)]
pub struct PathPlanner {
    active: Option<ActivePlan>,
}

impl PathPlanner {
    pub fn new() -> PathPlanner {
        PathPlanner::default()
    }

    /// Checks a request without running it: endpoints in bounds and walkable,
    /// parameters in range.
    pub fn validate(request: &SearchRequest) -> Result<()> {
        request.validate()
    }

    /// Runs `request` to completion.
    pub fn request_path(
        &mut self,
        request: &SearchRequest,
        metrics: &mut MetricsCollector,
    ) -> SearchResult {
        let result = plan(request);
        metrics.record(&result);
        result
    }

    /// Starts a stepwise plan, replacing any plan in flight. The search is bound to
    /// the grid snapshot of `request`.
    pub fn start(&mut self, request: &SearchRequest) -> Result<()> {
        if let Err(error) = request.validate() {
            warn!("Rejected {} request: {}", request.algorithm, error);
            return Err(error);
        }
        if let Some(old) = self.active.take() {
            debug!("Dropping unfinished {} plan", old.search.algorithm());
        }
        self.active = Some(ActivePlan {
            search: Search::new(request),
            snapshot_id: request.grid.snapshot_id(),
            elapsed: Duration::ZERO,
        });
        Ok(())
    }

    /// Expands at most `max_expansions` nodes (at least one) of the plan in flight.
    ///
    /// If `grid` is not the snapshot the plan was started against, the plan is
    /// discarded and completes as cancelled.
    pub fn step(
        &mut self,
        grid: &GridWorld,
        max_expansions: usize,
        metrics: &mut MetricsCollector,
    ) -> PlanProgress {
        let Some(active) = self.active.as_mut() else {
            return PlanProgress::Idle;
        };
        if active.snapshot_id != grid.snapshot_id() {
            info!(
                "Grid changed under a pending {} plan, cancelling it",
                active.search.algorithm()
            );
            let result = SearchResult::cancelled(
                active.search.algorithm(),
                active.search.nodes_explored(),
                active.elapsed,
            );
            self.active = None;
            metrics.record(&result);
            return PlanProgress::Complete(result);
        }
        let before = Instant::now();
        let progress = active.search.step(grid, max_expansions.max(1));
        active.elapsed += before.elapsed();
        if progress == Progress::Pending {
            return PlanProgress::Pending;
        }
        let result = SearchResult::from_progress(
            grid,
            active.search.algorithm(),
            progress,
            active.search.nodes_explored(),
            active.elapsed,
        );
        self.active = None;
        debug!(
            "Stepwise {} plan finished: success={}, explored={}",
            result.algorithm, result.success, result.nodes_explored
        );
        metrics.record(&result);
        PlanProgress::Complete(result)
    }

    /// Discards the plan in flight. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    /// Algorithm of the plan in flight.
    pub fn algorithm(&self) -> Option<AlgorithmId> {
        self.active.as_ref().map(|a| a.search.algorithm())
    }
}
