//! Registry of worker agents and their assignments.
//!
//! Assignments are created lazily the first time an agent id appears in a
//! dispatch. The registry is bookkeeping only: it never drives transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::task::{AgentId, TaskId};

/// One record per worker identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAssignment {
    pub agent_id: AgentId,
    pub track: String,
    /// The task currently being worked on, if any.
    pub current_task: Option<TaskId>,
    /// Tasks this agent has completed, in completion order.
    pub completed_tasks: Vec<TaskId>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AgentAssignment {
    pub fn new(agent_id: AgentId, track: &str) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            track: track.to_string(),
            current_task: None,
            completed_tasks: Vec::new(),
            started_at: now,
            last_activity_at: now,
        }
    }
}

/// Map of agent id to assignment record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, AgentAssignment>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispatch: upsert the agent and point it at the task.
    pub fn record_dispatch(&mut self, agent_id: &AgentId, track: &str, task_id: &TaskId) {
        let assignment = self
            .agents
            .entry(agent_id.clone())
            .or_insert_with(|| AgentAssignment::new(agent_id.clone(), track));
        assignment.current_task = Some(task_id.clone());
        assignment.last_activity_at = Utc::now();
    }

    /// Record a completion: clear `current_task` and append to the
    /// completed list.
    pub fn record_completion(&mut self, agent_id: &AgentId, task_id: &TaskId) {
        if let Some(assignment) = self.agents.get_mut(agent_id) {
            assignment.current_task = None;
            assignment.completed_tasks.push(task_id.clone());
            assignment.last_activity_at = Utc::now();
        }
    }

    /// Detach any agent whose `current_task` points at the given task.
    pub fn release_task(&mut self, task_id: &TaskId) {
        for assignment in self.agents.values_mut() {
            if assignment.current_task.as_ref() == Some(task_id) {
                assignment.current_task = None;
                assignment.last_activity_at = Utc::now();
            }
        }
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentAssignment> {
        self.agents.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentAssignment> {
        self.agents.values()
    }
}
