//! Test fixtures for integration tests.
//!
//! Provides helpers for building catalogues and opening orchestrators
//! over temporary on-disk stores.

use std::path::PathBuf;

use tempfile::TempDir;

use cadence::catalog::{Catalog, TaskDefinition};
use cadence::core::task::{TaskId, TaskStatus};
use cadence::state::JsonFileStore;
use cadence::Orchestrator;

pub const HISTORY_LIMIT: usize = 100;

/// Build a task definition with explicit sprint, track, and dependencies.
pub fn definition(id: &str, sprint: u32, track: &str, deps: &[&str]) -> TaskDefinition {
    TaskDefinition {
        id: TaskId::from(id),
        sprint,
        track: track.to_string(),
        complexity: "medium".to_string(),
        estimated_hours: 2.0,
        dependencies: deps.iter().map(|d| TaskId::from(*d)).collect(),
        blocks: Vec::new(),
        tags: Vec::new(),
        prompt: PathBuf::from(format!("prompts/{}.md", id)),
    }
}

/// A two-sprint catalogue with three tracks:
///
/// sprint 0: `0.1` (infra), `0.2` (backend, deps 0.1), `0.3` (frontend)
/// sprint 1: `1.1` (backend, deps 0.2), `1.2` (frontend, deps 0.3)
pub fn two_sprint_catalog() -> Catalog {
    Catalog::from_definitions(vec![
        definition("0.1", 0, "infra", &[]),
        definition("0.2", 0, "backend", &["0.1"]),
        definition("0.3", 0, "frontend", &[]),
        definition("1.1", 1, "backend", &["0.2"]),
        definition("1.2", 1, "frontend", &["0.3"]),
    ])
}

/// An orchestrator over a JSON file store in a temp directory.
///
/// The TempDir must outlive the orchestrator; it is returned alongside.
pub struct TestOrchestrator {
    pub dir: TempDir,
    pub orchestrator: Orchestrator,
}

impl TestOrchestrator {
    pub fn new(catalog: &Catalog) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let orchestrator =
            Orchestrator::open(catalog, Box::new(store), HISTORY_LIMIT).unwrap();
        Self { dir, orchestrator }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    /// Reopen from the same on-disk snapshot.
    pub fn reopen(&self, catalog: &Catalog) -> Orchestrator {
        let store = JsonFileStore::new(self.state_path());
        Orchestrator::open(catalog, Box::new(store), HISTORY_LIMIT).unwrap()
    }

    pub fn status(&self, id: &str) -> TaskStatus {
        self.orchestrator
            .state()
            .task(&TaskId::from(id))
            .unwrap()
            .status
    }
}

/// Dispatch then complete a task with a fixed agent, asserting success.
pub fn run_to_completion(orchestrator: &mut Orchestrator, id: &str, agent: &str) {
    orchestrator
        .dispatch_task(&TaskId::from(id), Some(agent))
        .unwrap();
    orchestrator
        .complete_task(&TaskId::from(id), None)
        .unwrap();
}
