//! Spatial indexing for nearest-target and neighbour queries.
//!
//! One KD-tree per kind of thing an agent can sense, rebuilt every tick from
//! the grid and the live agents.

use kdtree::distance::squared_euclidean;
use kdtree::{ErrorKind as KdTreeError, KdTree};
use ndarray::Array1;

use super::agent::{Agent, AgentType};
use super::ecs::Entity;
use super::geometric_utils::{length, toroidal_offset};
use super::grid::{GridPos, GridWorld, NodeTerrain};

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Something an agent can sense.
#[derive(Debug, Clone)]
pub struct Sighting {
    /// Owning entity, or `None` for grid food.
    pub entity: Option<Entity>,
    /// Position in grid units.
    pub position: Array1<f32>,
    /// Heading (zero for grid food).
    pub forward: Array1<f32>,
}

/// A KD-tree and the sightings its indices refer to.
///
/// The grid wraps, so every query also looks at the eight shifted copies of
/// the query point and measures the wrapped distance.
pub struct Layer {
    tree: Tree2D,
    items: Vec<Sighting>,
    width: f32,
    height: f32,
}

impl Layer {
    fn build(items: Vec<Sighting>, width: f32, height: f32) -> Result<Self, KdTreeError> {
        let mut tree = KdTree::with_capacity(2, items.len().max(1));
        for (i, item) in items.iter().enumerate() {
            tree.add(item.position.to_vec(), i)?;
        }
        Ok(Self {
            tree,
            items,
            width,
            height,
        })
    }

    fn images(&self, pos: &Array1<f32>) -> impl Iterator<Item = Vec<f32>> + '_ {
        let (x, y) = (pos[0], pos[1]);
        [-1.0, 0.0, 1.0].into_iter().flat_map(move |sx: f32| {
            [-1.0, 0.0, 1.0]
                .into_iter()
                .map(move |sy: f32| vec![x + sx * self.width, y + sy * self.height])
        })
    }

    fn distance(&self, pos: &Array1<f32>, item: &Sighting) -> f32 {
        length(&toroidal_offset(pos, &item.position, self.width, self.height))
    }

    /// Closest sighting to `pos` other than `exclude`, if any.
    pub fn nearest(&self, pos: &Array1<f32>, exclude: Option<Entity>) -> Option<&Sighting> {
        // Two candidates per copy are enough to skip the querying agent itself.
        self.images(pos)
            .flat_map(|image| {
                self.tree
                    .nearest(&image, 2, &squared_euclidean)
                    .unwrap_or_default()
            })
            .map(|(_, &idx)| &self.items[idx])
            .filter(|s| exclude.is_none() || s.entity != exclude)
            .min_by(|a, b| self.distance(pos, a).total_cmp(&self.distance(pos, b)))
    }

    /// Every sighting within `radius` of `pos` other than `exclude`.
    pub fn within(
        &self,
        pos: &Array1<f32>,
        radius: f32,
        exclude: Option<Entity>,
    ) -> Vec<&Sighting> {
        let mut found: Vec<usize> = self
            .images(pos)
            .flat_map(|image| {
                self.tree
                    .within(&image, radius.powi(2), &squared_euclidean)
                    .unwrap_or_default()
            })
            .map(|(_, &idx)| idx)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
            .into_iter()
            .map(|idx| &self.items[idx])
            .filter(|s| exclude.is_none() || s.entity != exclude)
            .collect()
    }

    /// Number of indexed sightings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the layer is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Spatial index containing one layer per sensed kind.
pub struct SpatialIndex {
    /// Plant cells with food left.
    pub plants: Layer,
    /// Corpse cells with food left.
    pub corpses: Layer,
    /// Living herbivores.
    pub herbivores: Layer,
    /// Carnivores.
    pub carnivores: Layer,
    /// Scavengers.
    pub scavengers: Layer,
}

impl SpatialIndex {
    /// Builds a spatial index from the grid and the current agents.
    ///
    /// Dead agents are skipped so nobody chases them.
    pub fn build(grid: &dyn GridWorld, agents: &[Agent]) -> Result<Self, KdTreeError> {
        let cells = |terrain: NodeTerrain| {
            grid.nodes_with(terrain)
                .into_iter()
                .map(|pos: GridPos| Sighting {
                    entity: None,
                    position: pos.to_position(),
                    forward: Array1::zeros(2),
                })
                .collect::<Vec<_>>()
        };
        let of_type = |agent_type: AgentType| {
            agents
                .iter()
                .filter(|a| a.agent_type() == agent_type && a.is_alive())
                .map(|a| Sighting {
                    entity: Some(a.body.entity),
                    position: a.body.position.clone(),
                    forward: a.body.forward.clone(),
                })
                .collect::<Vec<_>>()
        };

        let (w, h) = (grid.width() as f32, grid.height() as f32);
        Ok(Self {
            plants: Layer::build(cells(NodeTerrain::Plant), w, h)?,
            corpses: Layer::build(cells(NodeTerrain::Corpse), w, h)?,
            herbivores: Layer::build(of_type(AgentType::Herbivore), w, h)?,
            carnivores: Layer::build(of_type(AgentType::Carnivore), w, h)?,
            scavengers: Layer::build(of_type(AgentType::Scavenger), w, h)?,
        })
    }
}
