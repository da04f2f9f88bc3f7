//! Read-only world view shared by every behaviour during a tick.

use super::grid::{GridPos, GridWorld};
use super::params::Params;

/// The grid, the parameters and the tick length.
///
/// Behaviours only ever see `&Environment`; every write to the grid goes
/// through an event applied on the coordinating thread.
pub struct Environment {
    /// Grid collaborator.
    pub grid: Box<dyn GridWorld>,
    /// Simulation parameters.
    pub params: Params,
    /// Length of the current tick in seconds.
    pub dt: f32,
    /// Drop-off cell for workers, if the grid has one.
    pub town_center: Option<GridPos>,
}

impl Environment {
    /// Wraps a grid with the given parameters.
    pub fn new(grid: Box<dyn GridWorld>, params: Params) -> Self {
        Self {
            grid,
            params,
            dt: 0.0,
            town_center: None,
        }
    }
}
