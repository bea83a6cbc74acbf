//! Per-agent path following. The [Navigator] owns every agent's position, path and
//! movement trail; outside code reads them and requests changes through its methods.
//!
//! Each agent moves through `Idle -> Planning -> Moving -> GoalReached`. Planning runs
//! stepwise inside [Navigator::update], a bounded number of expansions per agent per
//! tick. An external effect can freeze an agent ([Navigator::block]); a frozen agent
//! keeps its path and cursor and continues where it stopped once unblocked.
use core::fmt;
use log::{debug, info};
use std::collections::VecDeque;

use crate::cell::Cell;
use crate::error::{PlanError, Result};
use crate::grid_world::GridWorld;
use crate::heuristic::HeuristicId;
use crate::metrics::MetricsCollector;
use crate::planner::{PathPlanner, PlanProgress};
use crate::search_context::FxIndexMap;
use crate::solver::{AlgorithmId, SearchParams, SearchRequest, SearchResult, Termination};
use crate::DEFAULT_HISTORY_LIMIT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "agent #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlockReason {
    /// Held in place by an outside effect, for `remaining` seconds or until unblocked.
    Frozen { remaining: Option<f32> },
    /// The last plan failed. Leaves through [Navigator::request_plan].
    NoPath,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgentState {
    Idle,
    Planning,
    Moving,
    Blocked(BlockReason),
    GoalReached,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NavigatorEvent {
    PlanningStarted(AgentId),
    PathAssigned { agent: AgentId, moves: usize },
    PlanningFailed { agent: AgentId, termination: Termination },
    Moved { agent: AgentId, from: Cell, to: Cell },
    GoalReached(AgentId),
    Blocked { agent: AgentId, reason: BlockReason },
    Resumed(AgentId),
    /// The path was discarded because the maze or the agent's situation changed.
    Replanning(AgentId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigatorConfig {
    /// Cells per second at a speed multiplier of 1.
    pub default_speed: f32,
    /// Search expansions granted to each planning agent per update.
    pub expansions_per_tick: usize,
    /// Longest movement trail kept per agent, `None` for unbounded.
    pub history_limit: Option<usize>,
}

impl Default for NavigatorConfig {
    fn default() -> NavigatorConfig {
        NavigatorConfig {
            default_speed: 4.0,
            expansions_per_tick: 256,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

impl NavigatorConfig {
    pub fn with_default_speed(mut self, speed: f32) -> NavigatorConfig {
        self.default_speed = speed;
        self
    }
    pub fn with_expansions_per_tick(mut self, expansions: usize) -> NavigatorConfig {
        self.expansions_per_tick = expansions;
        self
    }
    pub fn with_history_limit(mut self, limit: Option<usize>) -> NavigatorConfig {
        self.history_limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_speed("default_speed", self.default_speed)?;
        if self.expansions_per_tick == 0 {
            return Err(PlanError::parameter(
                "expansions_per_tick",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn check_speed(name: &str, speed: f32) -> Result<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(PlanError::parameter(
            name,
            format!("{speed} is not a positive number"),
        ))
    }
}

/// Everything needed to spawn an agent. Unset options fall back to the navigator
/// configuration and the default heuristic of the grid.
#[derive(Clone, Debug)]
pub struct AgentSpec {
    pub position: Cell,
    pub goal: Cell,
    pub algorithm: AlgorithmId,
    pub heuristic: Option<HeuristicId>,
    pub params: SearchParams,
    pub speed: Option<f32>,
}

impl AgentSpec {
    pub fn new(position: Cell, goal: Cell, algorithm: AlgorithmId) -> AgentSpec {
        AgentSpec {
            position,
            goal,
            algorithm,
            heuristic: None,
            params: SearchParams::default(),
            speed: None,
        }
    }
    pub fn with_heuristic(mut self, heuristic: HeuristicId) -> AgentSpec {
        self.heuristic = Some(heuristic);
        self
    }
    pub fn with_params(mut self, params: SearchParams) -> AgentSpec {
        self.params = params;
        self
    }
    pub fn with_speed(mut self, speed: f32) -> AgentSpec {
        self.speed = Some(speed);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    position: Cell,
    goal: Cell,
    path: Vec<Cell>,
    path_cursor: usize,
    /// Fraction of the move from `path[path_cursor]` to the next cell already covered.
    progress: f32,
    history: VecDeque<Cell>,
    history_limit: Option<usize>,
    state: AgentState,
    /// State taken up again when a freeze ends.
    resume_to: AgentState,
    algorithm: AlgorithmId,
    heuristic: Option<HeuristicId>,
    params: SearchParams,
    speed: f32,
    speed_multiplier: f32,
    last_result: Option<SearchResult>,
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.id
    }
    pub fn position(&self) -> Cell {
        self.position
    }
    pub fn goal(&self) -> Cell {
        self.goal
    }
    pub fn path(&self) -> &[Cell] {
        &self.path
    }
    pub fn path_cursor(&self) -> usize {
        self.path_cursor
    }
    /// Cells still ahead on the path, the current one included.
    pub fn remaining_path(&self) -> &[Cell] {
        self.path.get(self.path_cursor..).unwrap_or(&[])
    }
    /// Cells left behind, oldest first.
    pub fn history(&self) -> &VecDeque<Cell> {
        &self.history
    }
    pub fn state(&self) -> AgentState {
        self.state
    }
    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }
    /// The heuristic requested at spawn; `None` uses the grid's default.
    pub fn heuristic(&self) -> Option<HeuristicId> {
        self.heuristic
    }
    pub fn speed(&self) -> f32 {
        self.speed
    }
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }
    /// Result of the most recent finished plan.
    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last_result.as_ref()
    }

    /// Position between the current and the next path cell, as `(col, row, layer)`.
    pub fn interpolated_position(&self) -> (f32, f32, f32) {
        let here = self.position;
        let lerp = |a: i32, b: i32| a as f32 + (b - a) as f32 * self.progress;
        match self.path.get(self.path_cursor + 1) {
            Some(next) if self.progress > 0.0 => (
                lerp(here.col, next.col),
                lerp(here.row, next.row),
                lerp(here.layer, next.layer),
            ),
            _ => (here.col as f32, here.row as f32, here.layer as f32),
        }
    }

    fn has_moves_left(&self) -> bool {
        self.path_cursor + 1 < self.path.len()
    }

    fn push_history(&mut self, cell: Cell) {
        self.history.push_back(cell);
        if let Some(limit) = self.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_cursor = 0;
        self.progress = 0.0;
    }

    /// The current state, or for a frozen agent the one it thaws into.
    fn settled_state(&self) -> AgentState {
        if self.is_frozen() {
            self.resume_to
        } else {
            self.state
        }
    }

    fn freeze(&mut self, remaining: Option<f32>) {
        if !self.is_frozen() {
            self.resume_to = self.state;
        }
        self.state = AgentState::Blocked(BlockReason::Frozen { remaining });
    }

    /// Ends a freeze in the state held before it, unless a replan was requested
    /// meanwhile.
    fn thaw(&mut self, events: &mut Vec<NavigatorEvent>) {
        self.state = self.resume_to;
        debug!("{} thawed into {:?}", self.id, self.state);
        events.push(NavigatorEvent::Resumed(self.id));
        if self.state == AgentState::Planning {
            events.push(NavigatorEvent::PlanningStarted(self.id));
        }
    }

    fn is_frozen(&self) -> bool {
        matches!(self.state, AgentState::Blocked(BlockReason::Frozen { .. }))
    }

    /// Moves along the path by `dt` seconds of travel.
    fn advance(&mut self, dt: f32, events: &mut Vec<NavigatorEvent>) {
        if self.state != AgentState::Moving {
            return;
        }
        let mut travel = dt.max(0.0) * self.speed * self.speed_multiplier;
        while travel > 0.0 && self.has_moves_left() {
            let needed = 1.0 - self.progress;
            if travel < needed {
                self.progress += travel;
                break;
            }
            travel -= needed;
            let from = self.path[self.path_cursor];
            self.path_cursor += 1;
            self.progress = 0.0;
            self.position = self.path[self.path_cursor];
            self.push_history(from);
            events.push(NavigatorEvent::Moved {
                agent: self.id,
                from,
                to: self.position,
            });
        }
        if !self.has_moves_left() {
            self.state = AgentState::GoalReached;
            self.progress = 0.0;
            debug!("{} reached {}", self.id, self.position);
            events.push(NavigatorEvent::GoalReached(self.id));
        }
    }
}

struct Slot {
    agent: Agent,
    planner: PathPlanner,
}

impl Slot {
    /// Drops the current path and any plan in flight. Frozen agents stay frozen and
    /// plan once they thaw.
    fn discard_plan(&mut self, events: &mut Vec<NavigatorEvent>) {
        self.planner.cancel();
        self.agent.clear_path();
        if self.agent.is_frozen() {
            self.agent.resume_to = AgentState::Planning;
        } else {
            self.agent.state = AgentState::Planning;
        }
        events.push(NavigatorEvent::Replanning(self.agent.id));
    }

    /// Starts or continues the agent's plan.
    fn plan(
        &mut self,
        grid: &GridWorld,
        expansions: usize,
        metrics: &mut MetricsCollector,
        events: &mut Vec<NavigatorEvent>,
    ) {
        let id = self.agent.id;
        if !self.planner.is_pending() {
            let request = SearchRequest {
                grid,
                start: self.agent.position,
                goal: self.agent.goal,
                algorithm: self.agent.algorithm,
                heuristic: self
                    .agent
                    .heuristic
                    .unwrap_or_else(|| HeuristicId::default_for(grid.connectivity())),
                params: self.agent.params.clone(),
            };
            if let Err(error) = self.planner.start(&request) {
                let result = SearchResult::invalid(self.agent.algorithm, error);
                self.fail(result, events);
                return;
            }
        }
        match self.planner.step(grid, expansions, metrics) {
            PlanProgress::Idle | PlanProgress::Pending => {}
            PlanProgress::Complete(result) if result.success => {
                let moves = result.path_length();
                self.agent.path = result.path.clone();
                self.agent.path_cursor = 0;
                self.agent.progress = 0.0;
                self.agent.last_result = Some(result);
                debug!("{} got a path of {} moves", id, moves);
                events.push(NavigatorEvent::PathAssigned { agent: id, moves });
                if moves == 0 {
                    self.agent.state = AgentState::GoalReached;
                    events.push(NavigatorEvent::GoalReached(id));
                } else {
                    self.agent.state = AgentState::Moving;
                }
            }
            PlanProgress::Complete(result) => self.fail(result, events),
        }
    }

    fn fail(&mut self, result: SearchResult, events: &mut Vec<NavigatorEvent>) {
        let id = self.agent.id;
        debug!("{} failed to plan: {:?}", id, result.termination);
        events.push(NavigatorEvent::PlanningFailed {
            agent: id,
            termination: result.termination.clone(),
        });
        let reason = BlockReason::NoPath;
        events.push(NavigatorEvent::Blocked { agent: id, reason });
        self.agent.state = AgentState::Blocked(reason);
        self.agent.last_result = Some(result);
    }
}

/// Owns every agent and drives planning and movement once per tick.
pub struct Navigator {
    config: NavigatorConfig,
    slots: FxIndexMap<AgentId, Slot>,
    next_id: u32,
    snapshot_id: Option<u64>,
    events: Vec<NavigatorEvent>,
}

impl Default for Navigator {
    fn default() -> Navigator {
        Navigator::with_valid_config(NavigatorConfig::default())
    }
}

impl Navigator {
    /// Fails when `config` does not pass [NavigatorConfig::validate].
    pub fn new(config: NavigatorConfig) -> Result<Navigator> {
        config.validate()?;
        Ok(Navigator::with_valid_config(config))
    }

    fn with_valid_config(config: NavigatorConfig) -> Navigator {
        Navigator {
            config,
            slots: FxIndexMap::default(),
            next_id: 1,
            snapshot_id: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Adds an idle agent with default heuristic, parameters and speed.
    pub fn spawn(&mut self, position: Cell, goal: Cell, algorithm: AlgorithmId) -> AgentId {
        let id = self.allocate_id();
        let agent = self.build_agent(id, AgentSpec::new(position, goal, algorithm), None);
        self.insert(agent)
    }

    pub fn spawn_with(&mut self, spec: AgentSpec) -> Result<AgentId> {
        if let Some(speed) = spec.speed {
            check_speed("speed", speed)?;
        }
        spec.params.validate_for(spec.algorithm)?;
        let id = self.allocate_id();
        let speed = spec.speed;
        let agent = self.build_agent(id, spec, speed);
        Ok(self.insert(agent))
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn build_agent(&self, id: AgentId, spec: AgentSpec, speed: Option<f32>) -> Agent {
        Agent {
            id,
            position: spec.position,
            goal: spec.goal,
            path: Vec::new(),
            path_cursor: 0,
            progress: 0.0,
            history: VecDeque::new(),
            history_limit: self.config.history_limit,
            state: AgentState::Idle,
            resume_to: AgentState::Idle,
            algorithm: spec.algorithm,
            heuristic: spec.heuristic,
            params: spec.params,
            speed: speed.unwrap_or(self.config.default_speed),
            speed_multiplier: 1.0,
            last_result: None,
        }
    }

    fn insert(&mut self, agent: Agent) -> AgentId {
        let id = agent.id;
        debug!("Spawned {} at {} heading for {}", id, agent.position, agent.goal);
        self.slots.insert(
            id,
            Slot {
                agent,
                planner: PathPlanner::new(),
            },
        );
        id
    }

    /// Removes an agent, cancelling any plan in flight.
    pub fn remove(&mut self, id: AgentId) -> Result<Agent> {
        let slot = self
            .slots
            .shift_remove(&id)
            .ok_or(PlanError::UnknownAgent(id))?;
        debug!("Removed {}", id);
        Ok(slot.agent)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.slots.get(&id).map(|s| &s.agent)
    }

    /// Agents in spawn order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.slots.values().map(|s| &s.agent)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot_mut(&mut self, id: AgentId) -> Result<&mut Slot> {
        self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))
    }

    /// Puts an agent into planning. The search itself runs during [Navigator::update].
    /// Agents that are already planning are left alone. A frozen agent drops its path
    /// and starts planning when it thaws.
    pub fn request_plan(&mut self, id: AgentId) -> Result<()> {
        let slot = self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))?;
        if slot.agent.is_frozen() {
            slot.planner.cancel();
            slot.agent.clear_path();
            slot.agent.resume_to = AgentState::Planning;
            debug!("{} will plan once it thaws", id);
            return Ok(());
        }
        if slot.agent.state == AgentState::Planning {
            return Ok(());
        }
        slot.planner.cancel();
        slot.agent.clear_path();
        slot.agent.state = AgentState::Planning;
        self.events.push(NavigatorEvent::PlanningStarted(id));
        Ok(())
    }

    /// Advances the whole navigator by `dt` seconds against `grid`: notices maze
    /// changes, counts down freezes, runs a slice of every pending plan and moves the
    /// agents that have a path. Returns the events of this tick, including those
    /// raised by calls made since the previous tick.
    pub fn update(
        &mut self,
        grid: &GridWorld,
        dt: f32,
        metrics: &mut MetricsCollector,
    ) -> Vec<NavigatorEvent> {
        let mut events = std::mem::take(&mut self.events);
        let snapshot = grid.snapshot_id();
        if self.snapshot_id.is_some_and(|known| known != snapshot) {
            info!("Maze changed, replanning {} agents", self.slots.len());
            self.discard_active_plans(&mut events);
        }
        self.snapshot_id = Some(snapshot);
        let expansions = self.config.expansions_per_tick;
        for slot in self.slots.values_mut() {
            let agent = &mut slot.agent;
            if let AgentState::Blocked(BlockReason::Frozen {
                remaining: Some(remaining),
            }) = agent.state
            {
                let left = remaining - dt.max(0.0);
                if left > 0.0 {
                    agent.state = AgentState::Blocked(BlockReason::Frozen {
                        remaining: Some(left),
                    });
                } else {
                    agent.thaw(&mut events);
                }
            }
            if slot.agent.state == AgentState::Planning {
                slot.plan(grid, expansions, metrics, &mut events);
            }
            slot.agent.advance(dt, &mut events);
        }
        events
    }

    /// Moves a single agent by `dt` seconds. Ignored unless the agent is moving.
    pub fn advance(&mut self, id: AgentId, dt: f32) -> Result<Vec<NavigatorEvent>> {
        let slot = self.slot_mut(id)?;
        let mut events = Vec::new();
        slot.agent.advance(dt, &mut events);
        Ok(events)
    }

    /// Freezes an agent in place for `duration` seconds, or until [Navigator::unblock]
    /// when `None`. Freezing a frozen agent replaces its timer.
    pub fn block(&mut self, id: AgentId, duration: Option<f32>) -> Result<()> {
        if let Some(d) = duration {
            if !d.is_finite() || d < 0.0 {
                return Err(PlanError::parameter(
                    "duration",
                    format!("{d} is not a non-negative number"),
                ));
            }
        }
        let slot = self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))?;
        if slot.agent.state == AgentState::Planning {
            slot.planner.cancel();
        }
        let reason = BlockReason::Frozen {
            remaining: duration,
        };
        slot.agent.freeze(duration);
        debug!("{} frozen for {:?}", id, duration);
        self.events.push(NavigatorEvent::Blocked { agent: id, reason });
        Ok(())
    }

    /// Lifts a freeze. The agent returns to the state it was frozen in, so a moving
    /// agent continues from where it stopped, unless a replan was requested meanwhile.
    pub fn unblock(&mut self, id: AgentId) -> Result<()> {
        let slot = self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))?;
        if slot.agent.is_frozen() {
            slot.agent.thaw(&mut self.events);
        }
        Ok(())
    }

    /// Scales an agent's speed; 0 holds it in place without blocking it.
    pub fn set_speed_multiplier(&mut self, id: AgentId, multiplier: f32) -> Result<()> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(PlanError::parameter(
                "speed_multiplier",
                format!("{multiplier} is not a non-negative number"),
            ));
        }
        self.slot_mut(id)?.agent.speed_multiplier = multiplier;
        Ok(())
    }

    /// Teleports an agent, e.g. after a hazard. The path is discarded and the agent
    /// plans again from its new position.
    pub fn displace(&mut self, id: AgentId, cell: Cell) -> Result<()> {
        let slot = self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))?;
        let from = slot.agent.position;
        if from != cell {
            slot.agent.push_history(from);
        }
        slot.agent.position = cell;
        debug!("{} displaced from {} to {}", id, from, cell);
        slot.discard_plan(&mut self.events);
        Ok(())
    }

    /// Gives an agent a new goal. Idle agents stay idle; others plan again.
    pub fn set_goal(&mut self, id: AgentId, goal: Cell) -> Result<()> {
        let slot = self.slots.get_mut(&id).ok_or(PlanError::UnknownAgent(id))?;
        slot.agent.goal = goal;
        if slot.agent.settled_state() != AgentState::Idle {
            slot.discard_plan(&mut self.events);
        }
        Ok(())
    }

    /// Notice that the maze was regenerated. Paths and plans in flight are dropped
    /// and the affected agents plan again on the next update.
    pub fn regenerate(&mut self) {
        info!("Maze regenerated, replanning {} agents", self.slots.len());
        let mut events = std::mem::take(&mut self.events);
        self.discard_active_plans(&mut events);
        self.events = events;
        self.snapshot_id = None;
    }

    fn discard_active_plans(&mut self, events: &mut Vec<NavigatorEvent>) {
        for slot in self.slots.values_mut() {
            let affected = matches!(
                slot.agent.settled_state(),
                AgentState::Planning
                    | AgentState::Moving
                    | AgentState::Blocked(BlockReason::NoPath)
            );
            if affected {
                slot.discard_plan(events);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> GridWorld {
        GridWorld::new(6, 1)
    }

    fn tick(nav: &mut Navigator, grid: &GridWorld, dt: f32) -> Vec<NavigatorEvent> {
        let mut metrics = MetricsCollector::new();
        nav.update(grid, dt, &mut metrics)
    }

    fn moving_agent(nav: &mut Navigator, grid: &GridWorld) -> AgentId {
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(5, 0), AlgorithmId::Bfs);
        nav.request_plan(id).unwrap();
        let events = tick(nav, grid, 0.0);
        assert!(events.contains(&NavigatorEvent::PathAssigned { agent: id, moves: 5 }));
        id
    }

    #[test]
    fn plans_then_walks_to_goal() {
        let grid = corridor();
        let mut nav = Navigator::new(NavigatorConfig::default().with_default_speed(2.0)).unwrap();
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(5, 0), AlgorithmId::AStar);
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Idle);
        nav.request_plan(id).unwrap();
        let events = tick(&mut nav, &grid, 0.0);
        assert_eq!(events[0], NavigatorEvent::PlanningStarted(id));
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Moving);

        // Two cells per second: one second covers two moves.
        let events = tick(&mut nav, &grid, 1.0);
        let moves = events
            .iter()
            .filter(|e| matches!(e, NavigatorEvent::Moved { .. }))
            .count();
        assert_eq!(moves, 2);
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.position(), Cell::planar(2, 0));
        assert_eq!(agent.path_cursor(), 2);
        assert_eq!(
            agent.history().iter().copied().collect::<Vec<_>>(),
            vec![Cell::planar(0, 0), Cell::planar(1, 0)]
        );

        let events = tick(&mut nav, &grid, 10.0);
        assert!(events.contains(&NavigatorEvent::GoalReached(id)));
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::GoalReached);
        assert_eq!(agent.position(), Cell::planar(5, 0));
        assert_eq!(agent.history().len(), 5);
    }

    #[test]
    fn interpolates_between_cells() {
        let grid = corridor();
        let mut nav = Navigator::new(NavigatorConfig::default().with_default_speed(1.0)).unwrap();
        let id = moving_agent(&mut nav, &grid);
        nav.advance(id, 0.25).unwrap();
        let (col, row, _) = nav.agent(id).unwrap().interpolated_position();
        assert!((col - 0.25).abs() < 1e-6);
        assert_eq!(row, 0.0);
    }

    #[test]
    fn frozen_agent_keeps_cursor() {
        let grid = corridor();
        let mut nav = Navigator::new(NavigatorConfig::default().with_default_speed(1.0)).unwrap();
        let id = moving_agent(&mut nav, &grid);
        tick(&mut nav, &grid, 2.0);
        assert_eq!(nav.agent(id).unwrap().path_cursor(), 2);

        nav.block(id, None).unwrap();
        assert!(nav.advance(id, 5.0).unwrap().is_empty());
        tick(&mut nav, &grid, 5.0);
        assert_eq!(nav.agent(id).unwrap().path_cursor(), 2);

        nav.unblock(id).unwrap();
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Moving);
        tick(&mut nav, &grid, 1.0);
        assert_eq!(nav.agent(id).unwrap().path_cursor(), 3);
    }

    #[test]
    fn timed_freeze_thaws() {
        let grid = corridor();
        let mut nav = Navigator::new(NavigatorConfig::default().with_default_speed(1.0)).unwrap();
        let id = moving_agent(&mut nav, &grid);
        nav.block(id, Some(1.5)).unwrap();
        let events = tick(&mut nav, &grid, 1.0);
        assert!(events.contains(&NavigatorEvent::Blocked {
            agent: id,
            reason: BlockReason::Frozen {
                remaining: Some(1.5)
            }
        }));
        assert!(nav.agent(id).unwrap().is_frozen());
        let events = tick(&mut nav, &grid, 1.0);
        assert!(events.contains(&NavigatorEvent::Resumed(id)));
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Moving);
    }

    #[test]
    fn idle_agent_thaws_idle() {
        let grid = corridor();
        let mut nav = Navigator::default();
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(5, 0), AlgorithmId::Bfs);
        nav.block(id, None).unwrap();
        nav.set_goal(id, Cell::planar(4, 0)).unwrap();
        nav.unblock(id).unwrap();
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Idle);
        let events = tick(&mut nav, &grid, 1.0);
        assert_eq!(
            events,
            vec![
                NavigatorEvent::Blocked {
                    agent: id,
                    reason: BlockReason::Frozen { remaining: None }
                },
                NavigatorEvent::Resumed(id),
            ]
        );

        nav.block(id, Some(0.5)).unwrap();
        tick(&mut nav, &grid, 1.0);
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Idle);
        assert!(agent.path().is_empty());
        assert_eq!(agent.goal(), Cell::planar(4, 0));
    }

    #[test]
    fn replan_requested_while_frozen() {
        let grid = corridor();
        let mut nav = Navigator::default();
        let id = moving_agent(&mut nav, &grid);
        nav.block(id, None).unwrap();
        nav.request_plan(id).unwrap();
        let agent = nav.agent(id).unwrap();
        assert!(agent.is_frozen());
        assert!(agent.path().is_empty());

        nav.unblock(id).unwrap();
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Planning);
        let events = tick(&mut nav, &grid, 0.0);
        assert_eq!(
            &events[1..],
            &[
                NavigatorEvent::Resumed(id),
                NavigatorEvent::PlanningStarted(id),
                NavigatorEvent::PathAssigned { agent: id, moves: 5 },
            ]
        );
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Moving);
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(Navigator::new(NavigatorConfig::default().with_default_speed(-1.0)).is_err());
        assert!(Navigator::new(NavigatorConfig::default().with_default_speed(f32::NAN)).is_err());
        assert!(Navigator::new(NavigatorConfig::default().with_expansions_per_tick(0)).is_err());
        assert!(Navigator::new(NavigatorConfig::default()).is_ok());
    }

    #[test]
    fn maze_change_triggers_replanning() {
        let mut grid = GridWorld::new(6, 3);
        let mut nav = Navigator::default();
        let id = nav.spawn(Cell::planar(0, 1), Cell::planar(5, 1), AlgorithmId::Bfs);
        nav.request_plan(id).unwrap();
        tick(&mut nav, &grid, 0.0);
        assert_eq!(nav.agent(id).unwrap().path().len(), 6);

        grid.set_blocked(Cell::planar(3, 1), true).unwrap();
        let events = tick(&mut nav, &grid, 0.0);
        assert!(events.contains(&NavigatorEvent::Replanning(id)));
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Moving);
        assert!(!agent.path().contains(&Cell::planar(3, 1)));
        assert_eq!(agent.path().len(), 8);
    }

    #[test]
    fn explicit_regeneration() {
        let grid = corridor();
        let mut nav = Navigator::default();
        let id = moving_agent(&mut nav, &grid);
        nav.regenerate();
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Planning);
        assert!(nav.agent(id).unwrap().path().is_empty());
        let events = tick(&mut nav, &grid, 0.0);
        assert_eq!(events[0], NavigatorEvent::Replanning(id));
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::Moving);
    }

    #[test]
    fn failed_plan_blocks_until_requested() {
        let grid = GridWorld::from_ascii("..#..").unwrap();
        let mut nav = Navigator::default();
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(4, 0), AlgorithmId::Dijkstra);
        nav.request_plan(id).unwrap();
        let events = tick(&mut nav, &grid, 0.1);
        assert!(events.contains(&NavigatorEvent::PlanningFailed {
            agent: id,
            termination: Termination::Exhausted
        }));
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Blocked(BlockReason::NoPath));
        assert!(!agent.last_result().unwrap().success);

        nav.set_goal(id, Cell::planar(1, 0)).unwrap();
        tick(&mut nav, &grid, 10.0);
        assert_eq!(nav.agent(id).unwrap().state(), AgentState::GoalReached);
    }

    #[test]
    fn blocked_goal_is_rejected() {
        let grid = GridWorld::from_ascii("..#").unwrap();
        let mut nav = Navigator::default();
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(2, 0), AlgorithmId::Bfs);
        nav.request_plan(id).unwrap();
        let events = tick(&mut nav, &grid, 0.0);
        assert!(events.iter().any(|e| matches!(
            e,
            NavigatorEvent::PlanningFailed {
                termination: Termination::InvalidRequest(PlanError::Blocked { .. }),
                ..
            }
        )));
    }

    #[test]
    fn displacement_replans_from_new_cell() {
        let grid = GridWorld::new(6, 2);
        let mut nav = Navigator::default();
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(5, 0), AlgorithmId::Bfs);
        nav.request_plan(id).unwrap();
        tick(&mut nav, &grid, 0.0);
        nav.displace(id, Cell::planar(4, 1)).unwrap();
        let agent = nav.agent(id).unwrap();
        assert_eq!(agent.state(), AgentState::Planning);
        assert_eq!(agent.history().back(), Some(&Cell::planar(0, 0)));
        tick(&mut nav, &grid, 0.0);
        assert_eq!(nav.agent(id).unwrap().path().len(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let grid = corridor();
        let mut nav = Navigator::new(
            NavigatorConfig::default()
                .with_default_speed(1.0)
                .with_history_limit(Some(2)),
        )
        .unwrap();
        let id = moving_agent(&mut nav, &grid);
        tick(&mut nav, &grid, 10.0);
        assert_eq!(
            nav.agent(id).unwrap().history().iter().copied().collect::<Vec<_>>(),
            vec![Cell::planar(3, 0), Cell::planar(4, 0)]
        );
    }

    #[test]
    fn speed_multiplier() {
        let grid = corridor();
        let mut nav = Navigator::new(NavigatorConfig::default().with_default_speed(1.0)).unwrap();
        let id = moving_agent(&mut nav, &grid);
        nav.set_speed_multiplier(id, 3.0).unwrap();
        tick(&mut nav, &grid, 1.0);
        assert_eq!(nav.agent(id).unwrap().path_cursor(), 3);
        nav.set_speed_multiplier(id, 0.0).unwrap();
        tick(&mut nav, &grid, 1.0);
        assert_eq!(nav.agent(id).unwrap().path_cursor(), 3);
        assert!(nav.set_speed_multiplier(id, -1.0).is_err());
    }

    #[test]
    fn unknown_agent() {
        let mut nav = Navigator::default();
        let ghost = AgentId(99);
        assert_eq!(
            nav.request_plan(ghost),
            Err(PlanError::UnknownAgent(ghost))
        );
        assert!(nav.remove(ghost).is_err());
        let id = nav.spawn(Cell::planar(0, 0), Cell::planar(0, 0), AlgorithmId::Bfs);
        assert_eq!(nav.remove(id).unwrap().id(), id);
        assert!(nav.is_empty());
    }

    #[test]
    fn spawn_with_checks_options() {
        let mut nav = Navigator::default();
        let spec = AgentSpec::new(Cell::planar(0, 0), Cell::planar(1, 0), AlgorithmId::Beam);
        assert!(nav.spawn_with(spec.clone().with_speed(0.0)).is_err());
        assert!(nav
            .spawn_with(spec.clone().with_params(SearchParams::default().with_beam_width(0)))
            .is_err());
        let narrow = SearchParams::default().with_beam_width(0);
        assert!(nav
            .spawn_with(
                AgentSpec::new(Cell::planar(0, 0), Cell::planar(1, 0), AlgorithmId::Bfs)
                    .with_params(narrow)
            )
            .is_ok());
        let id = nav
            .spawn_with(spec.with_heuristic(HeuristicId::Zero).with_speed(8.0))
            .unwrap();
        assert_eq!(nav.agent(id).unwrap().speed(), 8.0);
        assert_eq!(nav.agent(id).unwrap().heuristic(), Some(HeuristicId::Zero));
        assert!(NavigatorConfig::default().validate().is_ok());
        assert!(NavigatorConfig::default()
            .with_expansions_per_tick(0)
            .validate()
            .is_err());
    }
}
