//! Weight dumps.
//!
//! The orchestrator only depends on [`WeightStore`]. [`JsonWeightStore`]
//! writes one pretty-printed JSON file per (agent type, brain type,
//! generation) under `{root}/{agent}/{brain}/gen_{generation}.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::agent::AgentType;
use super::brain::BrainType;
use super::error::Result;

/// Which saved generation to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationSelector {
    /// The highest generation saved for every brain of the agent.
    Latest,
    /// A specific generation.
    Exact(u32),
}

/// Persistence collaborator.
pub trait WeightStore: Send {
    /// Saves the weights of every agent's `brain` for `generation`.
    fn save_weights(
        &self,
        agent: AgentType,
        brain: BrainType,
        weights: &[Vec<f32>],
        generation: u32,
    ) -> Result<()>;

    /// Loads the saved weights of every brain of `agent` from one generation.
    ///
    /// Brains with nothing on disk are missing from the map.
    fn load_weights(
        &self,
        agent: AgentType,
        selector: GenerationSelector,
    ) -> Result<HashMap<BrainType, Vec<Vec<f32>>>>;
}

/// One saved file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Species the weights belong to.
    pub agent_type: AgentType,
    /// Brain the weights belong to.
    pub brain_type: BrainType,
    /// Generation they were saved at.
    pub generation: u32,
    /// RFC 3339 wall-clock time of the save.
    pub saved_at: String,
    /// One flat weight vector per agent.
    pub weights: Vec<Vec<f32>>,
}

/// [`WeightStore`] backed by JSON files.
#[derive(Debug, Clone)]
pub struct JsonWeightStore {
    root: PathBuf,
}

impl JsonWeightStore {
    /// Creates a store rooted at `root`. Nothing is touched until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn brain_dir(&self, agent: AgentType, brain: BrainType) -> PathBuf {
        self.root.join(agent.name()).join(brain.name())
    }

    fn saved_generations(dir: &Path) -> Result<Vec<u32>> {
        let mut generations = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let generation = name
                .to_str()
                .and_then(|n| n.strip_prefix("gen_"))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u32>().ok());
            generations.extend(generation);
        }
        Ok(generations)
    }

    /// Highest generation saved for every brain of `agent` that has a
    /// directory, so all of an agent's brains come from the same generation.
    fn latest_common_generation(&self, agent: AgentType) -> Result<Option<u32>> {
        let mut common: Option<Vec<u32>> = None;
        for &brain in agent.brain_set() {
            let dir = self.brain_dir(agent, brain);
            if !dir.is_dir() {
                continue;
            }
            let saved = Self::saved_generations(&dir)?;
            common = Some(match common {
                None => saved,
                Some(so_far) => so_far.into_iter().filter(|g| saved.contains(g)).collect(),
            });
        }
        Ok(common.and_then(|generations| generations.into_iter().max()))
    }
}

impl WeightStore for JsonWeightStore {
    fn save_weights(
        &self,
        agent: AgentType,
        brain: BrainType,
        weights: &[Vec<f32>],
        generation: u32,
    ) -> Result<()> {
        let dir = self.brain_dir(agent, brain);
        fs::create_dir_all(&dir)?;
        let record = WeightRecord {
            agent_type: agent,
            brain_type: brain,
            generation,
            saved_at: Utc::now().to_rfc3339(),
            weights: weights.to_vec(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(dir.join(format!("gen_{generation}.json")), json)?;
        Ok(())
    }

    fn load_weights(
        &self,
        agent: AgentType,
        selector: GenerationSelector,
    ) -> Result<HashMap<BrainType, Vec<Vec<f32>>>> {
        let mut loaded = HashMap::new();
        let generation = match selector {
            GenerationSelector::Exact(generation) => generation,
            GenerationSelector::Latest => match self.latest_common_generation(agent)? {
                Some(generation) => generation,
                None => return Ok(loaded),
            },
        };
        for &brain in agent.brain_set() {
            let path = self
                .brain_dir(agent, brain)
                .join(format!("gen_{generation}.json"));
            if !path.is_file() {
                continue;
            }
            let record: WeightRecord = serde_json::from_str(&fs::read_to_string(path)?)?;
            loaded.insert(brain, record.weights);
        }
        Ok(loaded)
    }
}
