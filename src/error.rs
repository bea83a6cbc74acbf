use crate::cell::Cell;
use crate::navigator::AgentId;
use crate::Cost;
use thiserror::Error;

/// Configuration errors raised before any search runs, and by the builder and
/// navigator APIs. An unreachable goal is never an error; it is reported through
/// [SearchResult](crate::solver::SearchResult) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("cell {cell} is outside the grid")]
    OutOfBounds { cell: Cell },

    #[error("cell {cell} is blocked")]
    Blocked { cell: Cell },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("traversal cost {cost} at {cell} must be at least 1")]
    InvalidCost { cell: Cell, cost: Cost },

    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("unknown heuristic `{0}`")]
    UnknownHeuristic(String),

    #[error("invalid map: {reason}")]
    InvalidMap { reason: String },

    #[error("no agent with id {0}")]
    UnknownAgent(AgentId),
}

impl PlanError {
    pub(crate) fn parameter(name: &str, reason: impl Into<String>) -> PlanError {
        PlanError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
