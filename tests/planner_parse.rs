// tests/planner_parse.rs

//! Planner contract: repair of malformed model output, id renumbering, and
//! allow-list validation.

use reasonloop::abilities::AbilityRegistry;
use reasonloop::agent::AgentProfile;
use reasonloop::dag::Task;
use reasonloop::errors::{ReasonLoopError, Result as RlResult};
use reasonloop::plan::Planner;
use reasonloop_test_utils::fake_ability::ScriptedAbility;
use reasonloop_test_utils::init_tracing;

/// Plan with the text-generation ability scripted to return `response`.
async fn plan_from(response: &str) -> RlResult<Vec<Task>> {
    init_tracing();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(
        ScriptedAbility::new("text-generation").with_response(response),
    ));

    let profile = AgentProfile::default_profile(&["text-generation", "web-search"]);
    let planner = Planner::new(&registry, &profile);
    planner.plan("summarize topic X").await
}

fn assert_planning_error(result: RlResult<Vec<Task>>) {
    match result {
        Err(ReasonLoopError::PlanningError(_)) => {}
        other => panic!("expected PlanningError, got {other:?}"),
    }
}

#[tokio::test]
async fn clean_json_plan_parses() {
    let tasks = plan_from(
        r#"[
            {"id": 1, "description": "research topic X", "ability": "web-search", "input": "topic X", "deps": []},
            {"id": 2, "description": "analyze findings", "ability": "text-generation", "input": "", "deps": [1]},
            {"id": 3, "description": "write summary", "ability": "text-generation", "input": "", "deps": [2]}
        ]"#,
    )
    .await
    .expect("valid plan");

    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].id, 1);
    assert_eq!(tasks[0].ability, "web-search");
    assert_eq!(tasks[1].deps, vec![1]);
    assert_eq!(tasks[2].deps, vec![2]);
}

#[tokio::test]
async fn fenced_json_with_prose_parses() {
    let tasks = plan_from(
        "Here is the plan you asked for:\n```json\n[\n  {\"id\": 1, \"description\": \"outline\", \"ability\": \"text-generation\"},\n  {\"id\": 2, \"description\": \"draft\", \"ability\": \"text-generation\", \"deps\": [1]},\n  {\"id\": 3, \"description\": \"polish\", \"ability\": \"text-generation\", \"deps\": [2]}\n]\n```\nGood luck!",
    )
    .await
    .expect("valid plan");

    assert_eq!(tasks.len(), 3);
    // Missing deps/input default to empty.
    assert!(tasks[0].deps.is_empty());
    assert_eq!(tasks[0].input, "");
}

#[tokio::test]
async fn control_characters_are_stripped() {
    let raw = "[{\"id\": 1, \"description\": \"re\u{0007}search\", \"ability\": \"text-generation\"},\
               {\"id\": 2, \"description\": \"write\", \"ability\": \"text-generation\", \"deps\": [1]},\
               {\"id\": 3, \"description\": \"check\", \"ability\": \"text-generation\", \"deps\": [2]}]";

    let tasks = plan_from(raw).await.expect("valid plan");
    assert_eq!(tasks[0].description, "research");
}

#[tokio::test]
async fn orphan_quote_lines_are_repaired() {
    let raw = r#"[
        {"id": 1, "description": "research", "ability": "text-generation"},
        ",
        {"id": 2, "description": "write", "ability": "text-generation", "deps": [1]},
        {"id": 3, "description": "check", "ability": "text-generation", "deps": [2]}
    ]"#;

    let tasks = plan_from(raw).await.expect("repaired plan");
    assert_eq!(tasks.len(), 3);
}

#[tokio::test]
async fn missing_description_after_id_gets_a_placeholder() {
    let raw = r#"[
        {"id": 1, "description": "research", "ability": "text-generation"},
        {"id": 2,
         "ability": "text-generation", "deps": [1]},
        {"id": 3, "description": "check", "ability": "text-generation", "deps": [2]}
    ]"#;

    let tasks = plan_from(raw).await.expect("repaired plan");
    assert_eq!(tasks[1].description, "Task 2");
}

#[tokio::test]
async fn malformed_ids_are_renumbered_sequentially() {
    let raw = r#"[
        {"id": "one", "description": "research", "ability": "text-generation"},
        {"id": 7, "description": "write", "ability": "text-generation"},
        {"id": 7, "description": "check", "ability": "text-generation"}
    ]"#;

    let tasks = plan_from(raw).await.expect("renumbered plan");

    // "one" -> 1; the duplicate 7 -> next unused sequential id.
    assert_eq!(tasks[0].id, 1);
    assert_eq!(tasks[1].id, 7);
    assert_eq!(tasks[2].id, 2);
}

#[tokio::test]
async fn disallowed_ability_rejects_the_whole_plan() {
    let result = plan_from(
        r#"[
            {"id": 1, "description": "query the db", "ability": "sql-query"},
            {"id": 2, "description": "write", "ability": "text-generation", "deps": [1]},
            {"id": 3, "description": "check", "ability": "text-generation", "deps": [2]}
        ]"#,
    )
    .await;

    assert_planning_error(result);
}

#[tokio::test]
async fn missing_ability_is_rejected() {
    let result = plan_from(
        r#"[{"id": 1, "description": "research", "deps": []}]"#,
    )
    .await;

    assert_planning_error(result);
}

#[tokio::test]
async fn empty_plan_is_rejected() {
    assert_planning_error(plan_from("[]").await);
}

#[tokio::test]
async fn oversized_plan_is_rejected() {
    let mut entries = Vec::new();
    for i in 1..=9 {
        entries.push(format!(
            r#"{{"id": {i}, "description": "task {i}", "ability": "text-generation"}}"#
        ));
    }
    let raw = format!("[{}]", entries.join(","));

    assert_planning_error(plan_from(&raw).await);
}

#[tokio::test]
async fn extra_fields_are_kept_as_metadata() {
    let tasks = plan_from(
        r#"[
            {"id": 1, "description": "research", "ability": "text-generation", "priority": "high"},
            {"id": 2, "description": "write", "ability": "text-generation", "deps": [1]},
            {"id": 3, "description": "check", "ability": "text-generation", "deps": [2]}
        ]"#,
    )
    .await
    .expect("valid plan");

    assert_eq!(
        tasks[0].metadata.get("priority").map(String::as_str),
        Some("high")
    );
    assert!(tasks[1].metadata.is_empty());
}

#[tokio::test]
async fn unparseable_output_fails_loudly() {
    assert_planning_error(plan_from("I could not produce a plan, sorry.").await);
}

#[tokio::test]
async fn non_numeric_dependency_is_rejected() {
    let result = plan_from(
        r#"[
            {"id": 1, "description": "research", "ability": "text-generation"},
            {"id": 2, "description": "write", "ability": "text-generation", "deps": ["research"]}
        ]"#,
    )
    .await;

    assert_planning_error(result);
}

#[tokio::test]
async fn planning_call_failure_is_a_planning_error() {
    init_tracing();

    let mut registry = AbilityRegistry::new();
    registry.register(Box::new(
        ScriptedAbility::new("text-generation").with_failure("provider down"),
    ));

    let profile = AgentProfile::default_profile(&["text-generation"]);
    let planner = Planner::new(&registry, &profile);

    assert_planning_error(planner.plan("summarize topic X").await);
}
