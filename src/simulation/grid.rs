//! The shared spatial grid.
//!
//! The engine only talks to the grid through [`GridWorld`]; [`Grid`] is the
//! in-memory implementation used by the binary and the tests.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometric_utils::{length, toroidal_offset, wrap_around_mut};

/// Integer cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Creates a cell coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous position.
    pub fn from_position(pos: &Array1<f32>) -> Self {
        Self {
            x: pos[0].floor() as i32,
            y: pos[1].floor() as i32,
        }
    }

    /// Continuous position of this cell's origin.
    pub fn to_position(self) -> Array1<f32> {
        Array1::from_vec(vec![self.x as f32, self.y as f32])
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// What occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTerrain {
    /// Empty ground.
    Grass,
    /// Plant eaten by herbivores.
    Plant,
    /// Remains eaten by carnivores and scavengers.
    Corpse,
    /// Gold mine gathered by workers.
    Mine,
    /// Drop-off point for workers.
    TownCenter,
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Occupant of the cell.
    pub terrain: NodeTerrain,
    /// Units of food (plants, corpses) or gold (mines) left.
    pub food: u32,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            terrain: NodeTerrain::Grass,
            food: 0,
        }
    }
}

/// Grid collaborator used by the engine.
pub trait GridWorld: Send + Sync {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Uniformly random cell.
    fn random_position(&self) -> GridPos;

    /// Random cell in the top quarter of the rows.
    fn random_position_in_upper_quarter(&self) -> GridPos;

    /// Random cell in the bottom quarter of the rows.
    fn random_position_in_lower_quarter(&self) -> GridPos;

    /// Node at `pos`, or `None` outside the grid.
    fn node(&self, pos: GridPos) -> Option<&Node>;

    /// Sets the terrain of `pos`. Ignored outside the grid.
    fn set_terrain(&mut self, pos: GridPos, terrain: NodeTerrain);

    /// Sets the food (or gold) of `pos`. Ignored outside the grid.
    fn set_food(&mut self, pos: GridPos, food: u32);

    /// Every cell with the given terrain and food left.
    fn nodes_with(&self, terrain: NodeTerrain) -> Vec<GridPos>;

    /// Clears transient state: plants and corpses turn back into grass.
    fn clear_transient(&mut self);

    /// Places `count` plants with `food` units each on random grass cells.
    fn seed_plants(&mut self, count: usize, food: u32);

    /// Places `count` mines with `gold` each and a town center; returns the town center.
    fn place_mines(&mut self, count: usize, gold: u32) -> GridPos;

    /// Wraps a continuous position onto the grid (toroidal).
    fn wrap(&self, pos: &mut Array1<f32>) {
        wrap_around_mut(pos, self.width() as f32, self.height() as f32);
    }

    /// Shortest offset from `from` to `to`, crossing the wrapping edges if
    /// that is closer.
    fn offset(&self, from: &Array1<f32>, to: &Array1<f32>) -> Array1<f32> {
        toroidal_offset(from, to, self.width() as f32, self.height() as f32)
    }

    /// Distance between two positions on the wrapping grid.
    fn distance(&self, from: &Array1<f32>, to: &Array1<f32>) -> f32 {
        length(&self.offset(from, to))
    }
}

/// Dense row-major grid of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    nodes: Vec<Node>,
}

impl Grid {
    /// Creates a grid of grass.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            nodes: vec![Node::default(); width * height],
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn random_in_rows(&self, rows: std::ops::Range<usize>) -> GridPos {
        let mut rng = rand::rng();
        let rows = if rows.is_empty() { 0..self.height.max(1) } else { rows };
        GridPos::new(
            rng.random_range(0..self.width.max(1)) as i32,
            rng.random_range(rows) as i32,
        )
    }

    fn random_grass(&self) -> Option<GridPos> {
        // Bounded retries keep a nearly full grid from spinning forever.
        for _ in 0..64 {
            let pos = self.random_position();
            if self.node(pos).is_some_and(|n| n.terrain == NodeTerrain::Grass) {
                return Some(pos);
            }
        }
        None
    }
}

impl GridWorld for Grid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn random_position(&self) -> GridPos {
        self.random_in_rows(0..self.height)
    }

    fn random_position_in_upper_quarter(&self) -> GridPos {
        let quarter = (self.height / 4).max(1);
        self.random_in_rows(self.height.saturating_sub(quarter)..self.height)
    }

    fn random_position_in_lower_quarter(&self) -> GridPos {
        let quarter = (self.height / 4).max(1);
        self.random_in_rows(0..quarter.min(self.height))
    }

    fn node(&self, pos: GridPos) -> Option<&Node> {
        self.index(pos).map(|i| &self.nodes[i])
    }

    fn set_terrain(&mut self, pos: GridPos, terrain: NodeTerrain) {
        if let Some(i) = self.index(pos) {
            self.nodes[i].terrain = terrain;
        }
    }

    fn set_food(&mut self, pos: GridPos, food: u32) {
        if let Some(i) = self.index(pos) {
            self.nodes[i].food = food;
        }
    }

    fn nodes_with(&self, terrain: NodeTerrain) -> Vec<GridPos> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.terrain == terrain && n.food > 0)
            .map(|(i, _)| GridPos::new((i % self.width) as i32, (i / self.width) as i32))
            .collect()
    }

    fn clear_transient(&mut self) {
        for node in &mut self.nodes {
            if matches!(node.terrain, NodeTerrain::Plant | NodeTerrain::Corpse) {
                *node = Node::default();
            }
        }
    }

    fn seed_plants(&mut self, count: usize, food: u32) {
        for _ in 0..count {
            if let Some(pos) = self.random_grass() {
                self.set_terrain(pos, NodeTerrain::Plant);
                self.set_food(pos, food);
            }
        }
    }

    fn place_mines(&mut self, count: usize, gold: u32) -> GridPos {
        let center = GridPos::new(self.width as i32 / 2, self.height as i32 / 2);
        self.set_terrain(center, NodeTerrain::TownCenter);
        for _ in 0..count {
            if let Some(pos) = self.random_grass() {
                self.set_terrain(pos, NodeTerrain::Mine);
                self.set_food(pos, gold);
            }
        }
        center
    }
}
