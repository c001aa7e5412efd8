// tests/scheduler_steps.rs

//! Manual-step scheduler tests: readiness, plan validation, terminal
//! accounting, and context injection.

use std::time::Duration;

use reasonloop::dag::{Scheduler, TaskResult, TaskStatus};
use reasonloop::errors::ReasonLoopError;
use reasonloop_test_utils::builders::{run_section, PlanBuilder, TaskBuilder};
use reasonloop_test_utils::init_tracing;

fn ok(id: u32, output: &str) -> TaskResult {
    TaskResult::success(id, output, Duration::ZERO)
}

fn fail(id: u32, error: &str) -> TaskResult {
    TaskResult::failure(id, error, Duration::ZERO)
}

#[test]
fn only_root_is_ready_initially() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .with_task(TaskBuilder::new(2, "analyze").dep(1).build())
        .with_task(TaskBuilder::new(3, "review").dep(1).build())
        .build();

    let scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    assert_eq!(scheduler.find_next_ready(), Some(1));
}

#[test]
fn siblings_become_ready_together_after_their_dependency() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .with_task(TaskBuilder::new(2, "analyze").dep(1).build())
        .with_task(TaskBuilder::new(3, "review").dep(1).build())
        .build();

    let mut scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    let first = scheduler.collect_ready();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, 1);

    let step = scheduler.record_completion(&ok(1, "facts"));
    let mut ids: Vec<u32> = step.newly_scheduled.iter().map(|t| t.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3]);
    assert!(!step.run_finished);
}

#[test]
fn unknown_dependency_is_a_planning_error() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .with_task(TaskBuilder::new(2, "analyze").dep(99).build())
        .build();

    match Scheduler::new("objective", plan, &run_section()) {
        Err(ReasonLoopError::UnknownDependency { task: 2, dep: 99 }) => {}
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
}

#[test]
fn dependency_cycle_is_rejected_before_execution() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").dep(2).build())
        .with_task(TaskBuilder::new(2, "analyze").dep(1).build())
        .build();

    match Scheduler::new("objective", plan, &run_section()) {
        Err(ReasonLoopError::DependencyCycle(_)) => {}
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_rejected() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").dep(1).build())
        .build();

    match Scheduler::new("objective", plan, &run_section()) {
        Err(ReasonLoopError::PlanningError(_)) => {}
        other => panic!("expected PlanningError, got {other:?}"),
    }
}

#[test]
fn empty_plan_is_rejected() {
    init_tracing();

    match Scheduler::new("objective", vec![], &run_section()) {
        Err(ReasonLoopError::PlanningError(_)) => {}
        other => panic!("expected PlanningError, got {other:?}"),
    }
}

#[test]
fn duplicate_ids_are_rejected() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .with_task(TaskBuilder::new(1, "gather again").build())
        .build();

    match Scheduler::new("objective", plan, &run_section()) {
        Err(ReasonLoopError::PlanningError(_)) => {}
        other => panic!("expected PlanningError, got {other:?}"),
    }
}

#[test]
fn terminal_tasks_never_transition_twice() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .build();

    let mut scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    let ready = scheduler.collect_ready();
    assert_eq!(ready.len(), 1);

    let step = scheduler.record_completion(&ok(1, "first output"));
    assert!(step.run_finished);
    assert_eq!(scheduler.completed_count(), 1);

    // A duplicate completion (even a contradictory one) is ignored.
    let step = scheduler.record_completion(&fail(1, "late failure"));
    assert!(step.run_finished);
    assert!(step.newly_failed.is_empty());
    assert_eq!(scheduler.task(1).expect("task 1").status, TaskStatus::Complete);
    assert_eq!(
        scheduler.task(1).expect("task 1").output.as_deref(),
        Some("first output")
    );
    assert_eq!(scheduler.session().records().len(), 1);
}

#[test]
fn cascade_fails_transitive_dependents_and_finishes_the_run() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "fetch").build())
        .with_task(TaskBuilder::new(2, "transform").dep(1).build())
        .with_task(TaskBuilder::new(3, "summarize").dep(2).build())
        .with_task(TaskBuilder::new(4, "publish").dep(3).build())
        .build();

    let mut scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    scheduler.collect_ready();
    scheduler.record_completion(&ok(1, "data"));

    let step = scheduler.record_completion(&fail(2, "boom"));

    let mut failed = step.newly_failed.clone();
    failed.sort_unstable();
    assert_eq!(failed, vec![2, 3, 4]);
    assert!(step.run_finished);
    assert!(step.newly_scheduled.is_empty());

    // All four outcomes are in the transcript, in completion order.
    assert_eq!(scheduler.session().records().len(), 4);
    assert!(scheduler.session().records()[0].task_id == 1);
}

#[test]
fn text_generation_payload_carries_truncated_dependency_context() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(TaskBuilder::new(1, "gather").build())
        .with_task(TaskBuilder::new(2, "summarize the gathered facts").dep(1).build())
        .build();

    let mut run = run_section();
    run.context_preview_chars = 50;

    let mut scheduler = Scheduler::new("the objective", plan, &run).expect("valid plan");

    scheduler.collect_ready();
    let long_output = "x".repeat(200);
    let step = scheduler.record_completion(&ok(1, &long_output));

    assert_eq!(step.newly_scheduled.len(), 1);
    let payload = &step.newly_scheduled[0].payload;

    assert!(payload.contains("Complete this task: summarize the gathered facts"));
    assert!(payload.contains("Objective: the objective"));
    assert!(payload.contains("Output from task #1"));
    // Preview is bounded: 50 chars of output plus the ellipsis.
    assert!(payload.contains(&format!("{}...", "x".repeat(50))));
    assert!(!payload.contains(&"x".repeat(51)));
}

#[test]
fn non_text_ability_payload_is_the_literal_input() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(
            TaskBuilder::new(1, "look up the weather")
                .ability("web-search")
                .input("weather in Oslo")
                .build(),
        )
        .build();

    let mut scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    let ready = scheduler.collect_ready();
    assert_eq!(ready[0].payload, "weather in Oslo");
    assert!(ready[0].role.is_none());
}

#[test]
fn non_text_ability_without_input_falls_back_to_description() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_task(
            TaskBuilder::new(1, "weather in Oslo")
                .ability("web-search")
                .build(),
        )
        .build();

    let mut scheduler = Scheduler::new("objective", plan, &run_section()).expect("valid plan");

    let ready = scheduler.collect_ready();
    assert_eq!(ready[0].payload, "weather in Oslo");
}
