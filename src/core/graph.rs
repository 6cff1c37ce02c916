//! Dependency graph over task ids.
//!
//! `DepGraph` represents the declared `dependencies` edges of the task set
//! as a petgraph `DiGraph`. It validates acyclicity at construction and
//! keeps the reverse direction (dependents) cheap to query, which is what
//! lets readiness resolution touch only the neighbourhood of a completed
//! task instead of rescanning the whole graph.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::clog_warn;
use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};

/// The task dependency graph.
///
/// Nodes carry task ids; an edge `a -> b` means `b` depends on `a` (`a`
/// must complete first). Task state itself lives in the orchestrator
/// state, not here.
pub struct DepGraph {
    graph: DiGraph<TaskId, ()>,
    index: HashMap<TaskId, NodeIndex>,
}

impl DepGraph {
    /// Build the graph from the task set's declared dependencies.
    ///
    /// Edges referencing unknown task ids are logged and skipped (the
    /// catalogue's referential integrity is assumed, not enforced).
    ///
    /// # Errors
    /// Returns `DependencyCycle` if the declared edges are not acyclic.
    pub fn build<'a, I>(tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Task> + Clone,
    {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for task in tasks.clone() {
            let node = graph.add_node(task.id.clone());
            index.insert(task.id.clone(), node);
        }

        for task in tasks {
            let to = index[&task.id];
            for dep in &task.dependencies {
                match index.get(dep) {
                    Some(&from) => {
                        graph.add_edge(from, to, ());
                    }
                    None => {
                        clog_warn!(
                            "Task {} depends on unknown task {}; edge skipped",
                            task.id,
                            dep
                        );
                    }
                }
            }
        }

        if is_cyclic_directed(&graph) {
            // toposort names a node on the cycle
            let id = match toposort(&graph, None) {
                Err(cycle) => graph[cycle.node_id()].clone(),
                Ok(_) => unreachable!("cyclic graph must fail toposort"),
            };
            return Err(Error::DependencyCycle { id });
        }

        Ok(Self { graph, index })
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Ids of the tasks the given task depends on (known edges only).
    pub fn dependencies(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbors(id, petgraph::Direction::Incoming)
    }

    /// Ids of the tasks that depend on the given task.
    ///
    /// This is the reverse index the readiness resolver walks after a
    /// completion.
    pub fn dependents(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbors(id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, id: &TaskId, dir: petgraph::Direction) -> Vec<TaskId> {
        match self.index.get(id) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, dir)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Task ids in an order where every task follows its dependencies.
    pub fn topological_order(&self) -> Vec<TaskId> {
        // Acyclicity was checked at construction.
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for DepGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepGraph")
            .field("tasks", &self.task_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
