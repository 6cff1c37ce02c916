//! Orchestrator state: the aggregate persisted as a single snapshot.

mod store;

pub use store::{JsonFileStore, MemoryStore, StateStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::core::task::{Task, TaskId, TaskStatus};
use crate::engine::agents::AgentRegistry;
use crate::engine::history::HistoryLog;

/// Schema version stamped into every snapshot. Loading a snapshot with a
/// different version fails rather than guessing.
pub const STATE_VERSION: u32 = 1;

/// The aggregate root: all tasks, agent assignments, and history.
///
/// Created once by seeding from the task catalogue, then mutated
/// exclusively through the lifecycle controller and overwritten to the
/// snapshot on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub version: u32,
    pub tasks: BTreeMap<TaskId, Task>,
    pub agents: AgentRegistry,
    pub history: HistoryLog,
    pub current_sprint: u32,
    pub last_updated: DateTime<Utc>,
}

impl OrchestratorState {
    /// Seed fresh state from the catalogue: every task pending, tests not
    /// written, empty registry and history.
    pub fn seed(catalog: &Catalog, history_capacity: usize) -> Self {
        let tasks: BTreeMap<TaskId, Task> = catalog
            .tasks()
            .iter()
            .map(|def| (def.id.clone(), Task::from_definition(def)))
            .collect();

        let mut state = Self {
            version: STATE_VERSION,
            tasks,
            agents: AgentRegistry::new(),
            history: HistoryLog::new(history_capacity),
            current_sprint: 0,
            last_updated: Utc::now(),
        };
        state.recompute_current_sprint();
        state
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Lowest sprint that still has incomplete work; the highest declared
    /// sprint once everything is complete.
    pub fn recompute_current_sprint(&mut self) {
        let incomplete = self
            .tasks
            .values()
            .filter(|t| t.status != TaskStatus::Complete)
            .map(|t| t.sprint)
            .min();

        self.current_sprint = match incomplete {
            Some(sprint) => sprint,
            None => self.tasks.values().map(|t| t.sprint).max().unwrap_or(0),
        };
    }

    /// Stamp the aggregate as mutated.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
