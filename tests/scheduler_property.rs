// tests/scheduler_property.rs

//! Property tests over random DAGs: termination, readiness correctness, and
//! at-most-once execution.

use std::collections::HashSet;
use std::time::Duration;

use proptest::prelude::*;

use reasonloop::dag::{Scheduler, Task, TaskResult, TaskStatus};
use reasonloop::types::TaskId;
use reasonloop_test_utils::builders::run_section;

// Strategy to generate a valid DAG plan.
// Acyclicity holds by construction: task N may only depend on tasks 1..N-1.
fn dag_plan_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Task>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut tasks = Vec::with_capacity(num_tasks);
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let id = (i + 1) as TaskId;

                // Sanitize dependencies: only allow deps on earlier tasks.
                let mut valid_deps = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid_deps.insert((dep_idx % i + 1) as TaskId);
                    }
                }

                let mut deps: Vec<TaskId> = valid_deps.into_iter().collect();
                deps.sort_unstable();

                tasks.push(Task::new(
                    id,
                    format!("task {id}"),
                    "text-generation",
                    "",
                    deps,
                ));
            }
            tasks
        })
    })
}

proptest! {
    #[test]
    fn random_dags_terminate_with_correct_readiness(
        plan in dag_plan_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..5),
    ) {
        let num_tasks = plan.len();
        let failing: HashSet<TaskId> = failing_indices
            .iter()
            .filter(|&&i| i < num_tasks)
            .map(|&i| (i + 1) as TaskId)
            .collect();

        let mut scheduler =
            Scheduler::new("objective", plan, &run_section()).expect("generated plan is valid");

        // Queue of tasks currently "executing".
        let mut executing: Vec<TaskId> = scheduler.collect_ready().iter().map(|t| t.id).collect();
        let mut executed: Vec<TaskId> = executing.clone();
        let mut completions = 0usize;

        while !scheduler.all_terminal() {
            // Work remains, so something must be in flight; otherwise the
            // scheduler deadlocked.
            prop_assert!(
                !executing.is_empty(),
                "no task executing but {} tasks remain",
                scheduler.remaining()
            );

            let id = executing.remove(0);
            let result = if failing.contains(&id) {
                TaskResult::failure(id, "injected failure", Duration::ZERO)
            } else {
                TaskResult::success(id, format!("output {id}"), Duration::ZERO)
            };

            let step = scheduler.record_completion(&result);
            completions += 1;

            // Readiness correctness: anything newly scheduled has every
            // dependency complete (cascade mode).
            for scheduled in &step.newly_scheduled {
                let task = scheduler.task(scheduled.id).expect("scheduled task exists");
                for dep in &task.deps {
                    let dep_status = scheduler.task(*dep).expect("dep exists").status;
                    prop_assert_eq!(
                        dep_status,
                        TaskStatus::Complete,
                        "task {} scheduled with unsatisfied dep {}",
                        scheduled.id,
                        dep
                    );
                }
            }

            executing.extend(step.newly_scheduled.iter().map(|t| t.id));
            executed.extend(step.newly_scheduled.iter().map(|t| t.id));

            // Termination bound: one completion event per task, at most.
            prop_assert!(
                completions <= num_tasks,
                "more completions ({completions}) than tasks ({num_tasks})"
            );
        }

        // At-most-once: no task was dispatched twice.
        let unique: HashSet<TaskId> = executed.iter().copied().collect();
        prop_assert_eq!(unique.len(), executed.len(), "a task was dispatched twice");

        // Every task ended terminal, and failures plus completions add up.
        prop_assert_eq!(
            scheduler.completed_count() + scheduler.failed_count(),
            num_tasks
        );
    }
}
