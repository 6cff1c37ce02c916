//! The immutable task catalogue.
//!
//! The catalogue is the read-only, ordered input that describes the DAG's
//! nodes and edges. It is consumed once, to seed orchestrator state when no
//! prior snapshot exists. Id uniqueness and dependency referential
//! integrity are assumed, not enforced here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::task::TaskId;
use crate::{clog_debug, Result};

/// One task definition as declared in the catalogue file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub sprint: u32,
    pub track: String,
    #[serde(default)]
    pub complexity: String,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Denormalized inverse of `dependencies`; carried through verbatim.
    #[serde(default)]
    pub blocks: Vec<TaskId>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque path to the task's prompt document; never opened here.
    #[serde(default)]
    pub prompt: PathBuf,
}

/// Ordered list of task definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tasks: Vec<TaskDefinition>,
}

impl Catalog {
    pub fn from_definitions(tasks: Vec<TaskDefinition>) -> Self {
        Self { tasks }
    }

    /// Load a catalogue from a JSON file holding an array of definitions.
    pub fn load(path: &Path) -> Result<Self> {
        clog_debug!("Catalog::load path={}", path.display());
        let contents = fs::read_to_string(path)?;
        let tasks: Vec<TaskDefinition> = serde_json::from_str(&contents)?;
        clog_debug!("Catalog loaded: {} tasks", tasks.len());
        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
