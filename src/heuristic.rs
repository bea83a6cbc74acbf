//! Distance estimates between two cells. Layers are ignored, so a cross-layer link
//! between distant planar positions makes every estimate except [HeuristicId::Zero]
//! inadmissible.
use crate::cell::Cell;
use crate::error::PlanError;
use crate::grid_world::Connectivity;
use crate::Cost;
use core::fmt;
use std::str::FromStr;

/// Heuristic selector. Admissibility depends on the grid: on 4-connected grids all of
/// them are admissible; on 8-connected grids (where a diagonal step costs the same
/// as a straight one) only [Chebyshev](HeuristicId::Chebyshev) and [Zero](HeuristicId::Zero) are.
/// Supplying an inadmissible one to A* is a caller error: the search still
/// terminates but the returned path may be longer than optimal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeuristicId {
    Manhattan,
    Euclidean,
    Chebyshev,
    Zero,
}

impl HeuristicId {
    pub const ALL: [HeuristicId; 4] = [
        HeuristicId::Manhattan,
        HeuristicId::Euclidean,
        HeuristicId::Chebyshev,
        HeuristicId::Zero,
    ];

    pub fn estimate(self, from: &Cell, to: &Cell) -> Cost {
        match self {
            HeuristicId::Manhattan => from.manhattan_distance(to),
            // Flooring keeps the estimate at or below the true unit-cost distance.
            HeuristicId::Euclidean => from.euclidean_distance(to).floor() as Cost,
            HeuristicId::Chebyshev => from.chebyshev_distance(to),
            HeuristicId::Zero => 0,
        }
    }

    /// The tightest admissible estimate for the given movement model.
    pub fn default_for(connectivity: Connectivity) -> HeuristicId {
        match connectivity {
            Connectivity::Four => HeuristicId::Manhattan,
            Connectivity::Eight => HeuristicId::Chebyshev,
        }
    }

    pub fn is_admissible_for(self, connectivity: Connectivity) -> bool {
        match connectivity {
            Connectivity::Four => true,
            Connectivity::Eight => matches!(self, HeuristicId::Chebyshev | HeuristicId::Zero),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeuristicId::Manhattan => "manhattan",
            HeuristicId::Euclidean => "euclidean",
            HeuristicId::Chebyshev => "chebyshev",
            HeuristicId::Zero => "zero",
        }
    }
}

impl fmt::Display for HeuristicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeuristicId {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<HeuristicId, PlanError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manhattan" | "taxicab" => Ok(HeuristicId::Manhattan),
            "euclidean" => Ok(HeuristicId::Euclidean),
            "chebyshev" => Ok(HeuristicId::Chebyshev),
            "zero" | "none" => Ok(HeuristicId::Zero),
            _ => Err(PlanError::UnknownHeuristic(s.to_owned())),
        }
    }
}
