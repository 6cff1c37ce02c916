//! Readiness resolution: promoting pending tasks whose dependencies have
//! all completed.
//!
//! Three entry points with the same promotion rule at different scopes: a
//! full pass over every task (initialization), a pass over the direct
//! dependents of a task that just completed, and a single-task re-check
//! after a reset. Only `pending` tasks are ever touched; a task with a
//! dependency id that resolves to no known task never becomes ready.

use crate::clog_debug;
use crate::core::graph::DepGraph;
use crate::core::task::{TaskId, TaskStatus};
use crate::state::OrchestratorState;

/// True when every declared dependency of the task is complete.
fn dependencies_complete(state: &OrchestratorState, id: &TaskId) -> bool {
    match state.task(id) {
        Some(task) => task.dependencies.iter().all(|dep| {
            state
                .task(dep)
                .map(|t| t.status == TaskStatus::Complete)
                .unwrap_or(false)
        }),
        None => false,
    }
}

/// Promote a single pending task if its dependencies are complete.
///
/// Returns true when the task was promoted.
pub fn resolve_task(state: &mut OrchestratorState, id: &TaskId) -> bool {
    let is_pending = state
        .task(id)
        .map(|t| t.status == TaskStatus::Pending)
        .unwrap_or(false);
    if !is_pending || !dependencies_complete(state, id) {
        return false;
    }
    if let Some(task) = state.task_mut(id) {
        task.mark_ready();
        clog_debug!("Task {} promoted to ready", id);
        return true;
    }
    false
}

/// Full pass over the task set. Used once at initialization.
pub fn resolve_all(state: &mut OrchestratorState) -> Vec<TaskId> {
    let candidates: Vec<TaskId> = state
        .tasks
        .values()
        .filter(|t| t.status == TaskStatus::Pending)
        .map(|t| t.id.clone())
        .collect();

    candidates
        .into_iter()
        .filter(|id| resolve_task(state, id))
        .collect()
}

/// Re-check only the direct dependents of a task that just completed.
///
/// Observably equivalent to a full pass, because completion of `completed`
/// is the only event that can have changed any task's readiness.
pub fn resolve_dependents(
    state: &mut OrchestratorState,
    graph: &DepGraph,
    completed: &TaskId,
) -> Vec<TaskId> {
    graph
        .dependents(completed)
        .into_iter()
        .filter(|id| resolve_task(state, id))
        .collect()
}
