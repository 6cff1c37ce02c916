//! Task data model for the orchestration DAG.
//!
//! Tasks are the atomic units of work handed to agents. Each task tracks
//! its lifecycle status, assignment, timing, and free-text notes. All
//! transition rules live in one table (`TaskStatus::permits`) consulted by
//! the lifecycle controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::TaskDefinition;
use crate::engine::history::HistoryAction;

/// Stable identifier for a task, as declared in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a worker agent.
///
/// Supplied by the caller at dispatch time, or generated from the task's
/// track plus a millisecond timestamp suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate an agent id for the given track.
    pub fn generate(track: &str) -> Self {
        Self(format!("{}-{}", track, Utc::now().timestamp_millis()))
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for one or more dependencies to complete.
    #[default]
    Pending,
    /// Dependencies satisfied, eligible for dispatch.
    Ready,
    /// Assigned to an agent and being worked on.
    InProgress,
    /// Work finished, awaiting human review.
    Review,
    /// Finished successfully.
    Complete,
    /// Held back for a reason outside the dependency graph.
    Blocked,
    /// Failed; stays failed until explicitly reset.
    Failed,
}

impl TaskStatus {
    /// The single transition table for lifecycle operations.
    ///
    /// `dispatch` requires `ready`; `complete` requires `in_progress` or
    /// `review`; `fail` is allowed from anything except `complete`;
    /// `reset` and `note` are always allowed.
    pub fn permits(&self, action: HistoryAction) -> bool {
        match action {
            HistoryAction::Dispatch => matches!(self, TaskStatus::Ready),
            HistoryAction::Complete => {
                matches!(self, TaskStatus::InProgress | TaskStatus::Review)
            }
            HistoryAction::Fail => !matches!(self, TaskStatus::Complete),
            HistoryAction::Reset | HistoryAction::Note => true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Complete => "complete",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Secondary quality signal, tracked per task but never consulted by the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    NotWritten,
    Failing,
    Passing,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TestStatus::NotWritten => "not_written",
            TestStatus::Failing => "failing",
            TestStatus::Passing => "passing",
        };
        write!(f, "{}", s)
    }
}

/// A single task in the orchestration DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Catalogue-stable identifier.
    pub id: TaskId,
    /// Ordinal sprint this task belongs to.
    pub sprint: u32,
    /// The worker lane that owns this task within its sprint.
    pub track: String,
    /// Descriptive complexity label (not used in scheduling).
    pub complexity: String,
    /// Estimated effort in hours (not used in scheduling).
    pub estimated_hours: f64,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Current test quality signal.
    pub test_status: TestStatus,
    /// Ids of tasks that must complete before this one may become ready.
    pub dependencies: Vec<TaskId>,
    /// Denormalized inverse of `dependencies`; documentation only, never
    /// cross-validated.
    pub blocks: Vec<TaskId>,
    /// Free-form labels from the catalogue.
    pub tags: Vec<String>,
    /// Path to the externally stored prompt document, returned verbatim.
    pub prompt: PathBuf,
    /// Agent currently assigned; set iff status is in_progress.
    pub assigned_to: Option<AgentId>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock hours between dispatch and completion.
    pub actual_hours: Option<f64>,
    /// Append-only annotations (failure reasons, completion notes).
    pub notes: Vec<String>,
}

impl Task {
    /// Seed a task from its catalogue definition: pending, tests not written.
    pub fn from_definition(def: &TaskDefinition) -> Self {
        Self {
            id: def.id.clone(),
            sprint: def.sprint,
            track: def.track.clone(),
            complexity: def.complexity.clone(),
            estimated_hours: def.estimated_hours,
            status: TaskStatus::Pending,
            test_status: TestStatus::NotWritten,
            dependencies: def.dependencies.clone(),
            blocks: def.blocks.clone(),
            tags: def.tags.clone(),
            prompt: def.prompt.clone(),
            assigned_to: None,
            started_at: None,
            completed_at: None,
            actual_hours: None,
            notes: Vec::new(),
        }
    }

    /// Promote from pending once all dependencies are complete.
    pub fn mark_ready(&mut self) {
        self.status = TaskStatus::Ready;
    }

    /// Hand the task to an agent.
    pub fn start(&mut self, agent: AgentId) {
        self.status = TaskStatus::InProgress;
        self.assigned_to = Some(agent);
        self.started_at = Some(Utc::now());
    }

    /// Mark the task finished, stamping completion time and effort.
    pub fn complete(&mut self) {
        let now = Utc::now();
        self.status = TaskStatus::Complete;
        self.completed_at = Some(now);
        self.test_status = TestStatus::Passing;
        if let Some(started) = self.started_at {
            let hours = (now - started).num_milliseconds() as f64 / 3_600_000.0;
            self.actual_hours = Some(hours);
        }
    }

    /// Mark the task failed, recording the reason.
    pub fn fail(&mut self, reason: &str) {
        self.status = TaskStatus::Failed;
        self.notes.push(reason.to_string());
    }

    /// Return the task to pending, clearing assignment, timing, and the
    /// test signal.
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
        self.test_status = TestStatus::NotWritten;
        self.assigned_to = None;
        self.started_at = None;
        self.completed_at = None;
        self.actual_hours = None;
    }
}
