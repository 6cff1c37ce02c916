//! Aggregation-layer tests over a live orchestrator: sprint math, ready
//! ordering, execution plans, stats, and history views.

use cadence::catalog::Catalog;
use cadence::core::task::{TaskId, TaskStatus};
use cadence::engine::history::HistoryAction;
use cadence::query;

use crate::fixtures::{definition, run_to_completion, two_sprint_catalog, TestOrchestrator};

#[test]
fn sprint_status_tracks_progress() {
    let mut t = TestOrchestrator::new(&two_sprint_catalog());

    let s0 = query::sprint_status(t.orchestrator.state(), 0);
    assert_eq!(s0.total, 3);
    assert_eq!(s0.complete, 0);
    assert_eq!(s0.ready, 2);
    assert_eq!(s0.pending, 1);
    assert_eq!(s0.percent_complete, 0);
    assert!(s0.can_start);

    run_to_completion(&mut t.orchestrator, "0.1", "infra-1");
    let s0 = query::sprint_status(t.orchestrator.state(), 0);
    assert_eq!(s0.complete, 1);
    assert_eq!(s0.percent_complete, 33);

    let s1 = query::sprint_status(t.orchestrator.state(), 1);
    assert!(!s1.can_start);
}

#[test]
fn sprint_one_can_start_once_sprint_zero_completes() {
    let mut t = TestOrchestrator::new(&two_sprint_catalog());

    for (id, agent) in [("0.1", "a"), ("0.3", "b"), ("0.2", "c")] {
        run_to_completion(&mut t.orchestrator, id, agent);
    }

    let s0 = query::sprint_status(t.orchestrator.state(), 0);
    assert_eq!(s0.percent_complete, 100);
    let s1 = query::sprint_status(t.orchestrator.state(), 1);
    assert!(s1.can_start);
    assert_eq!(s1.ready, 2);
}

#[test]
fn next_ready_tasks_cross_sprint_ordering() {
    // Scenario: ready tasks spanning sprints 0 and 1; next(2) returns the
    // two lowest (sprint, track, id) tuples.
    let catalog = Catalog::from_definitions(vec![
        definition("0.1", 0, "infra", &[]),
        definition("0.2", 0, "backend", &[]),
        definition("0.3", 0, "backend", &[]),
        definition("1.1", 1, "api", &[]),
        definition("1.2", 1, "api", &[]),
    ]);
    let t = TestOrchestrator::new(&catalog);

    // All five seeded without dependencies, so all are ready.
    let ready = query::next_ready_tasks(t.orchestrator.state(), 2);
    let ids: Vec<&str> = ready.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["0.2", "0.3"]);

    let all = query::next_ready_tasks(t.orchestrator.state(), 10);
    let ids: Vec<&str> = all.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["0.2", "0.3", "0.1", "1.1", "1.2"]);
    assert!(all.iter().all(|task| task.status == TaskStatus::Ready));
}

#[test]
fn execution_plan_groups_sprint_lanes() {
    let t = TestOrchestrator::new(&two_sprint_catalog());

    let plan = query::execution_plan(t.orchestrator.state(), 0);
    assert_eq!(plan.lanes.len(), 3);
    assert_eq!(plan.lanes["backend"], vec![TaskId::from("0.2")]);
    assert_eq!(plan.lanes["frontend"], vec![TaskId::from("0.3")]);
    assert_eq!(plan.lanes["infra"], vec![TaskId::from("0.1")]);

    let empty = query::execution_plan(t.orchestrator.state(), 7);
    assert!(empty.lanes.is_empty());
}

#[test]
fn overall_stats_reflect_effort() {
    let mut t = TestOrchestrator::new(&two_sprint_catalog());
    let stats = query::overall_stats(t.orchestrator.state());
    assert_eq!(stats.total, 5);
    assert_eq!(stats.estimated_hours_total, 10.0);
    assert_eq!(stats.estimated_hours_remaining, 10.0);

    run_to_completion(&mut t.orchestrator, "0.1", "infra-1");
    let stats = query::overall_stats(t.orchestrator.state());
    assert_eq!(stats.complete, 1);
    assert_eq!(stats.percent_complete, 20);
    assert_eq!(stats.estimated_hours_remaining, 8.0);
    assert!(stats.actual_hours_spent >= 0.0);
}

#[test]
fn recent_history_returns_bounded_tail() {
    let mut t = TestOrchestrator::new(&two_sprint_catalog());
    run_to_completion(&mut t.orchestrator, "0.1", "infra-1");
    run_to_completion(&mut t.orchestrator, "0.3", "frontend-1");

    let recent = query::recent_history(t.orchestrator.state(), 2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].action, HistoryAction::Dispatch);
    assert_eq!(recent[0].task_id, TaskId::from("0.3"));
    assert_eq!(recent[1].action, HistoryAction::Complete);
    assert_eq!(recent[1].task_id, TaskId::from("0.3"));
}

#[test]
fn prompt_path_round_trips_verbatim() {
    let t = TestOrchestrator::new(&two_sprint_catalog());
    let path = query::prompt_path(t.orchestrator.state(), &TaskId::from("0.2")).unwrap();
    assert_eq!(path, std::path::Path::new("prompts/0.2.md"));
}

#[test]
fn queries_do_not_mutate_state() {
    let t = TestOrchestrator::new(&two_sprint_catalog());
    let before = serde_json::to_string(t.orchestrator.state()).unwrap();

    let _ = query::all_sprint_statuses(t.orchestrator.state());
    let _ = query::next_ready_tasks(t.orchestrator.state(), 10);
    let _ = query::overall_stats(t.orchestrator.state());
    let _ = query::execution_plan(t.orchestrator.state(), 0);
    let _ = query::recent_history(t.orchestrator.state(), 10);

    let after = serde_json::to_string(t.orchestrator.state()).unwrap();
    assert_eq!(before, after);
}
