// tests/task_runner_retry.rs

//! Retry-policy behaviour of the real task runner, driven with scripted
//! abilities instead of the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use reasonloop::abilities::{Ability, AbilityRegistry, MetricsHook};
use reasonloop::dag::ScheduledTask;
use reasonloop::engine::RuntimeEvent;
use reasonloop::errors::Result as RlResult;
use reasonloop::exec::task_runner::run_task;
use reasonloop::exec::ExecutionPolicy;
use reasonloop::llm::Role;
use reasonloop_test_utils::fake_ability::ScriptedAbility;
use reasonloop_test_utils::init_tracing;

fn policy(max_retries: u32) -> ExecutionPolicy {
    ExecutionPolicy {
        max_retries,
        retry_delay: Duration::from_millis(1),
        task_timeout: Duration::from_secs(2),
        max_concurrent: 1,
    }
}

fn scheduled(ability: &str) -> ScheduledTask {
    ScheduledTask {
        id: 1,
        description: "scripted task".to_string(),
        ability: ability.to_string(),
        payload: "payload".to_string(),
        role: Some(Role::Executor),
    }
}

async fn run_and_recv(
    registry: AbilityRegistry,
    policy: ExecutionPolicy,
    task: ScheduledTask,
) -> RuntimeEvent {
    let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(4);
    run_task(task, Arc::new(registry), policy, tx).await;
    rx.recv().await.expect("completion event")
}

#[tokio::test]
async fn task_succeeds_on_third_attempt_with_two_retries() {
    init_tracing();

    let ability = ScriptedAbility::new("flaky")
        .with_failure("first failure")
        .with_failure("second failure")
        .with_response("finally worked");
    let calls = ability.call_counter();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(ability));

    let event = run_and_recv(registry, policy(2), scheduled("flaky")).await;

    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };

    // Only the final attempt's result is reported.
    assert!(result.success);
    assert_eq!(result.content, "finally worked");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanently_failing_task_is_attempted_exactly_max_retries_plus_one_times() {
    init_tracing();

    let ability = ScriptedAbility::new("broken")
        .with_failure("e1")
        .with_failure("e2")
        .with_failure("e3")
        .with_failure("e4");
    let calls = ability.call_counter();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(ability));

    let event = run_and_recv(registry, policy(2), scheduled("broken")).await;

    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };

    assert!(!result.success);
    // Last attempt's error is the one reported.
    assert!(result.error.as_deref().unwrap_or("").contains("e3"));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn no_retries_means_a_single_attempt() {
    init_tracing();

    let ability = ScriptedAbility::new("flaky").with_failure("only failure");
    let calls = ability.call_counter();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(ability));

    let event = run_and_recv(registry, policy(0), scheduled("flaky")).await;

    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };

    assert!(!result.success);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Ability that never finishes within the attempt timeout.
struct SlowAbility;

#[async_trait]
impl Ability for SlowAbility {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, _input: &str, _role: Option<Role>) -> RlResult<String> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".to_string())
    }
}

#[tokio::test]
async fn attempt_timeout_counts_as_failure() {
    init_tracing();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(SlowAbility));

    let policy = ExecutionPolicy {
        max_retries: 0,
        retry_delay: Duration::from_millis(1),
        task_timeout: Duration::from_millis(50),
        max_concurrent: 1,
    };

    let event = run_and_recv(registry, policy, scheduled("slow")).await;

    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or("").contains("timed out"));
}

#[tokio::test]
async fn unknown_ability_fails_the_task() {
    init_tracing();

    let registry = AbilityRegistry::new();
    let event = run_and_recv(registry, policy(0), scheduled("nonexistent")).await;

    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or("").contains("nonexistent"));
}

#[tokio::test]
async fn metrics_hook_counts_calls_and_failures() {
    init_tracing();

    let ability = ScriptedAbility::new("flaky")
        .with_failure("boom")
        .with_response("ok");

    let metrics = Arc::new(MetricsHook::new());
    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(ability));
    registry.add_hook(metrics.clone());

    let event = run_and_recv(registry, policy(1), scheduled("flaky")).await;
    let RuntimeEvent::TaskCompleted { result } = event else {
        panic!("expected completion event");
    };
    assert!(result.success);

    let stats = metrics.snapshot();
    let flaky = stats.get("flaky").expect("stats for flaky");
    assert_eq!(flaky.calls, 2);
    assert_eq!(flaky.failures, 1);
}
