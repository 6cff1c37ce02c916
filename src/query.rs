//! Read-only projections over orchestrator state.
//!
//! Nothing in this module mutates state; every function recomputes its
//! view on demand from the aggregate.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::task::{Task, TaskId, TaskStatus};
use crate::engine::history::HistoryEntry;
use crate::state::OrchestratorState;

/// Status counts for one sprint.
///
/// `review` tasks count toward `in_progress`, so the six buckets sum to
/// `total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintStatus {
    pub sprint: u32,
    pub total: usize,
    pub complete: usize,
    pub in_progress: usize,
    pub ready: usize,
    pub pending: usize,
    pub blocked: usize,
    pub failed: usize,
    pub percent_complete: u32,
    /// True for sprint 0, or when every task of the previous sprint is
    /// complete.
    pub can_start: bool,
}

/// Global counts and effort totals across all tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total: usize,
    pub complete: usize,
    pub in_progress: usize,
    pub ready: usize,
    pub pending: usize,
    pub blocked: usize,
    pub failed: usize,
    pub percent_complete: u32,
    pub estimated_hours_total: f64,
    pub estimated_hours_remaining: f64,
    pub actual_hours_spent: f64,
}

/// Tasks of one sprint grouped by agent track, each lane sorted by id.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub sprint: u32,
    pub lanes: BTreeMap<String, Vec<TaskId>>,
}

fn percent(complete: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * complete as f64 / total as f64).round() as u32
}

fn bucket(status: TaskStatus) -> TaskStatus {
    match status {
        TaskStatus::Review => TaskStatus::InProgress,
        other => other,
    }
}

/// Counts for the given sprint.
pub fn sprint_status(state: &OrchestratorState, sprint: u32) -> SprintStatus {
    let mut status = SprintStatus {
        sprint,
        total: 0,
        complete: 0,
        in_progress: 0,
        ready: 0,
        pending: 0,
        blocked: 0,
        failed: 0,
        percent_complete: 0,
        can_start: sprint == 0,
    };

    for task in state.tasks.values().filter(|t| t.sprint == sprint) {
        status.total += 1;
        match bucket(task.status) {
            TaskStatus::Complete => status.complete += 1,
            TaskStatus::InProgress => status.in_progress += 1,
            TaskStatus::Ready => status.ready += 1,
            TaskStatus::Pending => status.pending += 1,
            TaskStatus::Blocked => status.blocked += 1,
            TaskStatus::Failed => status.failed += 1,
            TaskStatus::Review => unreachable!("review folds into in_progress"),
        }
    }

    status.percent_complete = percent(status.complete, status.total);
    if sprint > 0 {
        status.can_start = state
            .tasks
            .values()
            .filter(|t| t.sprint == sprint - 1)
            .all(|t| t.status == TaskStatus::Complete);
    }
    status
}

/// Statuses for every sprint that has tasks, ascending.
pub fn all_sprint_statuses(state: &OrchestratorState) -> Vec<SprintStatus> {
    let mut sprints: Vec<u32> = state.tasks.values().map(|t| t.sprint).collect();
    sprints.sort_unstable();
    sprints.dedup();
    sprints
        .into_iter()
        .map(|s| sprint_status(state, s))
        .collect()
}

/// Up to `limit` ready tasks, ordered by `(sprint, track, id)` ascending.
///
/// A deterministic fairness policy: earliest sprint, earliest track,
/// lexicographic id.
pub fn next_ready_tasks<'a>(state: &'a OrchestratorState, limit: usize) -> Vec<&'a Task> {
    let mut ready: Vec<&Task> = state
        .tasks
        .values()
        .filter(|t| t.status == TaskStatus::Ready)
        .collect();
    ready.sort_by(|a, b| {
        (a.sprint, &a.track, &a.id).cmp(&(b.sprint, &b.track, &b.id))
    });
    ready.truncate(limit);
    ready
}

/// Global counts, percentages, and effort totals.
pub fn overall_stats(state: &OrchestratorState) -> OverallStats {
    let mut stats = OverallStats {
        total: 0,
        complete: 0,
        in_progress: 0,
        ready: 0,
        pending: 0,
        blocked: 0,
        failed: 0,
        percent_complete: 0,
        estimated_hours_total: 0.0,
        estimated_hours_remaining: 0.0,
        actual_hours_spent: 0.0,
    };

    for task in state.tasks.values() {
        stats.total += 1;
        stats.estimated_hours_total += task.estimated_hours;
        match bucket(task.status) {
            TaskStatus::Complete => stats.complete += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Ready => stats.ready += 1,
            TaskStatus::Pending => stats.pending += 1,
            TaskStatus::Blocked => stats.blocked += 1,
            TaskStatus::Failed => stats.failed += 1,
            TaskStatus::Review => unreachable!("review folds into in_progress"),
        }
        if task.status == TaskStatus::Complete {
            stats.actual_hours_spent += task.actual_hours.unwrap_or(0.0);
        } else {
            stats.estimated_hours_remaining += task.estimated_hours;
        }
    }

    stats.percent_complete = percent(stats.complete, stats.total);
    stats
}

/// Group the given sprint's tasks by track for a view of what can run
/// concurrently.
pub fn execution_plan(state: &OrchestratorState, sprint: u32) -> ExecutionPlan {
    let mut lanes: BTreeMap<String, Vec<TaskId>> = BTreeMap::new();
    for task in state.tasks.values().filter(|t| t.sprint == sprint) {
        lanes
            .entry(task.track.clone())
            .or_default()
            .push(task.id.clone());
    }
    for lane in lanes.values_mut() {
        lane.sort();
    }
    ExecutionPlan { sprint, lanes }
}

/// The last `limit` history entries, oldest first.
pub fn recent_history(state: &OrchestratorState, limit: usize) -> Vec<&HistoryEntry> {
    state.history.recent(limit)
}

/// Single-task lookup.
pub fn get_task<'a>(state: &'a OrchestratorState, id: &TaskId) -> Option<&'a Task> {
    state.task(id)
}

/// The opaque prompt path carried by a task, returned verbatim.
pub fn prompt_path<'a>(state: &'a OrchestratorState, id: &TaskId) -> Option<&'a Path> {
    state.task(id).map(|t| t.prompt.as_path())
}
