//! Lifecycle controller: the only component that mutates task status.
//!
//! Every operation is one bounded cycle: validate against the transition
//! table, mutate, re-resolve readiness where completion state changed,
//! append a history entry, recompute the current sprint, and persist the
//! snapshot. Business-rule violations come back as categorized errors
//! (`TaskNotFound`, `InvalidTransition`); nothing here is treated as fatal.

pub mod agents;
pub mod history;
pub mod resolver;

use crate::catalog::Catalog;
use crate::core::graph::DepGraph;
use crate::core::task::{AgentId, TaskId};
use crate::engine::history::{HistoryAction, HistoryEntry};
use crate::error::{Error, Result};
use crate::state::{OrchestratorState, StateStore};
use crate::{clog, clog_debug};

/// Result of a successful dispatch, carrying the resolved agent id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub task_id: TaskId,
    pub agent_id: AgentId,
}

/// Result of a successful completion, carrying the downstream tasks that
/// became ready because of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOutcome {
    pub task_id: TaskId,
    pub unblocked: Vec<TaskId>,
}

/// One orchestrator instance owning the state aggregate, its dependency
/// graph, and the injected snapshot store.
pub struct Orchestrator {
    state: OrchestratorState,
    graph: DepGraph,
    store: Box<dyn StateStore>,
}

impl Orchestrator {
    /// Open an orchestrator: load the existing snapshot, or seed fresh
    /// state from the catalogue and run the first readiness pass.
    pub fn open(
        catalog: &Catalog,
        store: Box<dyn StateStore>,
        history_limit: usize,
    ) -> Result<Self> {
        if let Some(state) = store.load()? {
            return Self::from_snapshot(state, store, history_limit);
        }

        clog!("No snapshot found, seeding {} tasks from catalogue", catalog.len());
        let mut state = OrchestratorState::seed(catalog, history_limit);
        let graph = DepGraph::build(state.tasks.values())?;
        let promoted = resolver::resolve_all(&mut state);
        clog_debug!("Initial resolve: {} tasks ready", promoted.len());
        state.touch();
        store.save(&state)?;
        Ok(Self {
            state,
            graph,
            store,
        })
    }

    /// Open only if a snapshot already exists; `Ok(None)` otherwise.
    ///
    /// Lets callers distinguish "no state yet" from a fresh seed instead
    /// of silently re-seeding.
    pub fn resume(store: Box<dyn StateStore>, history_limit: usize) -> Result<Option<Self>> {
        match store.load()? {
            Some(state) => Self::from_snapshot(state, store, history_limit).map(Some),
            None => Ok(None),
        }
    }

    fn from_snapshot(
        mut state: OrchestratorState,
        store: Box<dyn StateStore>,
        history_limit: usize,
    ) -> Result<Self> {
        clog_debug!("Loaded snapshot: {} tasks", state.tasks.len());
        state.history.set_capacity(history_limit);
        let graph = DepGraph::build(state.tasks.values())?;
        Ok(Self {
            state,
            graph,
            store,
        })
    }

    /// Read access for the query layer.
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    /// Assign a ready task to an agent.
    ///
    /// Generates an agent id from the task's track when none is supplied.
    pub fn dispatch_task(
        &mut self,
        id: &TaskId,
        agent: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let task = self.require_mut(id, HistoryAction::Dispatch)?;
        let track = task.track.clone();

        let agent_id = match agent {
            Some(a) => AgentId::from(a),
            None => AgentId::generate(&track),
        };

        task.start(agent_id.clone());
        self.state.agents.record_dispatch(&agent_id, &track, id);
        self.state.history.push(
            HistoryEntry::new(HistoryAction::Dispatch, id.clone())
                .with_agent(agent_id.clone()),
        );

        clog!("Dispatched {} to {}", id, agent_id);
        self.persist()?;
        Ok(DispatchOutcome {
            task_id: id.clone(),
            agent_id,
        })
    }

    /// Mark a task complete and promote any dependents that become ready.
    ///
    /// Completion is the sole trigger for downstream unblocking.
    pub fn complete_task(
        &mut self,
        id: &TaskId,
        note: Option<&str>,
    ) -> Result<CompleteOutcome> {
        let task = self.require_mut(id, HistoryAction::Complete)?;
        let agent = task.assigned_to.clone();
        task.complete();
        if let Some(note) = note {
            task.notes.push(note.to_string());
        }

        if let Some(agent_id) = &agent {
            self.state.agents.record_completion(agent_id, id);
        }

        let mut entry = HistoryEntry::new(HistoryAction::Complete, id.clone());
        if let Some(agent_id) = agent {
            entry = entry.with_agent(agent_id);
        }
        if let Some(note) = note {
            entry = entry.with_details(note);
        }
        self.state.history.push(entry);

        let unblocked = resolver::resolve_dependents(&mut self.state, &self.graph, id);
        clog!("Completed {}, unblocked {:?}", id, unblocked);
        self.persist()?;
        Ok(CompleteOutcome {
            task_id: id.clone(),
            unblocked,
        })
    }

    /// Mark a task failed, recording the reason.
    ///
    /// The assigned agent keeps its `current_task` until an explicit reset.
    pub fn fail_task(&mut self, id: &TaskId, reason: &str) -> Result<()> {
        let task = self.require_mut(id, HistoryAction::Fail)?;
        let agent = task.assigned_to.clone();
        task.fail(reason);

        let mut entry =
            HistoryEntry::new(HistoryAction::Fail, id.clone()).with_details(reason);
        if let Some(agent_id) = agent {
            entry = entry.with_agent(agent_id);
        }
        self.state.history.push(entry);

        clog!("Failed {}: {}", id, reason);
        self.persist()
    }

    /// Return a task to pending, clearing assignment and timing, then
    /// re-resolve it (immediately ready again if its dependencies are
    /// still complete).
    pub fn reset_task(&mut self, id: &TaskId) -> Result<()> {
        let task = self.require_mut(id, HistoryAction::Reset)?;
        task.reset();
        self.state.agents.release_task(id);
        self.state
            .history
            .push(HistoryEntry::new(HistoryAction::Reset, id.clone()));

        resolver::resolve_task(&mut self.state, id);
        clog!("Reset {}", id);
        self.persist()
    }

    /// Append a free-text annotation to a task.
    pub fn add_note(&mut self, id: &TaskId, text: &str) -> Result<()> {
        let task = self.require_mut(id, HistoryAction::Note)?;
        task.notes.push(text.to_string());
        self.state.history.push(
            HistoryEntry::new(HistoryAction::Note, id.clone()).with_details(text),
        );
        self.persist()
    }

    /// Look up a task and check the transition table for the action.
    fn require_mut(
        &mut self,
        id: &TaskId,
        action: HistoryAction,
    ) -> Result<&mut crate::core::task::Task> {
        let task = self
            .state
            .task_mut(id)
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })?;
        if !task.status.permits(action) {
            return Err(Error::InvalidTransition {
                task: id.clone(),
                from: task.status,
                action,
            });
        }
        Ok(task)
    }

    fn persist(&mut self) -> Result<()> {
        self.state.recompute_current_sprint();
        self.state.touch();
        self.store.save(&self.state)
    }
}
