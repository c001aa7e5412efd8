// src/lib.rs

pub mod abilities;
pub mod agent;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod llm;
pub mod logging;
pub mod plan;
pub mod report;
pub mod session;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::abilities::text_generation::TEXT_GENERATION;
use crate::abilities::{AbilityRegistry, MetricsHook};
use crate::agent::AgentProfile;
use crate::cli::CliArgs;
use crate::dag::{Scheduler, Task};
use crate::engine::{CoreRun, Runtime, RuntimeEvent};
use crate::errors::{ReasonLoopError, Result};
use crate::exec::{ExecutionPolicy, RealAbilityExecutor};
use crate::llm::{LlmClient, Role};
use crate::plan::Planner;
use crate::report::RunReport;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the ability registry (with the metrics hook)
/// - agent profile + planner
/// - scheduler / core / runtime / executor
/// - final synthesis and the run report
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = config::load_and_validate(&config_path)?;

    let client = Arc::new(LlmClient::from_config(&cfg.provider)?);
    let metrics = Arc::new(MetricsHook::new());

    let mut registry = abilities::build_registry(&cfg, client)?;
    registry.add_hook(metrics.clone());
    let registry = Arc::new(registry);

    if args.list_abilities {
        println!("Available abilities:");
        for name in registry.names() {
            println!("- {name}");
        }
        return Ok(());
    }

    let objective = args.objective.clone().ok_or_else(|| {
        ReasonLoopError::ConfigError("an objective is required (pass --objective)".to_string())
    })?;

    let profile = match &args.agent {
        Some(path) => AgentProfile::load_from_path(path)?,
        None => AgentProfile::default_profile(&registry.names()),
    };
    profile.validate_against(&registry.names())?;

    info!(objective = %objective, agent = %profile.name, "starting run");

    let planner = Planner::new(&registry, &profile);
    let tasks = planner.plan(&objective).await?;

    print_task_list(&tasks);

    if args.dry_run {
        print_dry_run(&tasks);
        return Ok(());
    }

    let started_at = Utc::now();
    let scheduler = Scheduler::new(objective, tasks, &cfg.run)?;

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Ability executor backend (real implementation in production).
    let executor = RealAbilityExecutor::new(
        Arc::clone(&registry),
        ExecutionPolicy::from_run(&cfg.run),
        rt_tx.clone(),
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRun::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);
    let outcome = runtime.run().await?;

    let final_answer = if outcome.aborted {
        warn!("run aborted before completion; skipping synthesis");
        "(run aborted before completion)".to_string()
    } else {
        synthesize(&registry, &outcome.scheduler).await
    };

    println!("{}", final_answer.trim());

    let report = RunReport::from_run(
        &outcome.scheduler,
        started_at,
        outcome.aborted,
        &final_answer,
        metrics.snapshot(),
    );
    match report.write_to_dir(&cfg.run.report_dir) {
        Ok(path) => info!(path = %path.display(), "run report written"),
        Err(e) => warn!(error = %e, "failed to write run report"),
    }

    Ok(())
}

/// Final synthesis step.
///
/// If the structurally last task is a text-generation task, issue one more
/// completion over the objective + full transcript; otherwise the final
/// task's own output is the run's result. A failed synthesis call degrades
/// to the fallback rather than aborting a run that already finished.
async fn synthesize(registry: &AbilityRegistry, scheduler: &Scheduler) -> String {
    let final_task = scheduler.final_task_id().and_then(|id| scheduler.task(id));
    let fallback = final_task
        .and_then(|t| t.output.clone())
        .unwrap_or_default();

    let Some(task) = final_task else {
        return fallback;
    };
    if task.ability != TEXT_GENERATION {
        return fallback;
    }

    let prompt = format!(
        "Synthesize a final response for the objective:\n{}\n\n\
         Context from executed tasks:\n{}\n\n\
         Return a concise, actionable final output.",
        scheduler.objective(),
        scheduler.session().render()
    );

    info!("performing final synthesis");
    match registry
        .execute(TEXT_GENERATION, &prompt, Some(Role::Orchestrator), None)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "final synthesis failed; falling back to last task output");
            fallback
        }
    }
}

fn print_task_list(tasks: &[Task]) {
    info!("===== TASK LIST =====");
    for task in tasks {
        info!("{task}");
    }
    info!("=====================");
}

/// Simple dry-run output: print tasks, abilities and deps.
fn print_dry_run(tasks: &[Task]) {
    println!("reasonloop dry-run");
    println!();

    println!("tasks ({}):", tasks.len());
    for task in tasks {
        println!("  - #{} {}", task.id, task.description);
        println!("      ability: {}", task.ability);
        if !task.input.is_empty() {
            println!("      input: {}", task.input);
        }
        if !task.deps.is_empty() {
            println!("      deps: {:?}", task.deps);
        }
    }
}
