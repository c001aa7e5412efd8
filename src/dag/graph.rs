// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::errors::{ReasonLoopError, Result};
use crate::types::TaskId;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct GraphNode {
    /// Direct dependencies: tasks whose outputs must exist first.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskId>,
}

/// Dependency graph over a planned task set.
///
/// Construction validates the plan's graph shape — self-dependencies,
/// unknown dependency ids, and cycles are all fatal planning errors — so
/// the scheduler can assume a well-formed DAG.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<TaskId, GraphNode>,
    /// Topological order, computed once at construction.
    topo: Vec<TaskId>,
}

impl TaskGraph {
    /// Build and validate a graph from a planned task list.
    pub fn from_tasks(tasks: &[Task]) -> Result<Self> {
        validate_dependencies(tasks)?;
        let topo = validate_acyclic(tasks)?;

        let mut nodes: HashMap<TaskId, GraphNode> = HashMap::new();

        // First pass: create nodes with their dependency lists.
        for task in tasks {
            nodes.insert(
                task.id,
                GraphNode {
                    deps: task.deps.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        // Second pass: populate dependents based on deps.
        for task in tasks {
            for dep in &task.deps {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(task.id);
                }
            }
        }

        Ok(Self { nodes, topo })
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in `deps`).
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Task ids in dependency order (dependencies before dependents).
    pub fn topo_order(&self) -> &[TaskId] {
        &self.topo
    }
}

fn validate_dependencies(tasks: &[Task]) -> Result<()> {
    let known: std::collections::HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();

    for task in tasks {
        for dep in &task.deps {
            if *dep == task.id {
                return Err(ReasonLoopError::PlanningError(format!(
                    "task #{} cannot depend on itself",
                    task.id
                )));
            }
            if !known.contains(dep) {
                return Err(ReasonLoopError::UnknownDependency {
                    task: task.id,
                    dep: *dep,
                });
            }
        }
    }

    Ok(())
}

/// A topological sort fails iff there is a cycle; on success the order is
/// reused for synthesis (the structurally last task).
fn validate_acyclic(tasks: &[Task]) -> Result<Vec<TaskId>> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for task in tasks {
        graph.add_node(task.id);
    }

    for task in tasks {
        for dep in &task.deps {
            graph.add_edge(*dep, task.id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order),
        Err(cycle) => Err(ReasonLoopError::DependencyCycle(format!(
            "cycle involving task #{}",
            cycle.node_id()
        ))),
    }
}
