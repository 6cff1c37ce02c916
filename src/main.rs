use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cadence::catalog::Catalog;
use cadence::config::Config;
use cadence::core::task::TaskId;
use cadence::state::{JsonFileStore, StateStore};
use cadence::{clog, query, Error, Orchestrator, Result};

/// Cadence - sprint-and-track build task orchestrator for cooperating agents
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    CADENCE_DEBUG=1    Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.cadence/cadence.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Seed orchestrator state from a task catalogue
    Init {
        /// Path to the catalogue JSON file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Assign a ready task to an agent
    Dispatch {
        /// Task id to dispatch
        task_id: String,

        /// Agent id (generated from the task's track if omitted)
        #[arg(long)]
        agent: Option<String>,
    },

    /// Mark an in-progress or in-review task complete
    Complete {
        /// Task id to complete
        task_id: String,

        /// Completion note appended to the task
        #[arg(long)]
        note: Option<String>,
    },

    /// Mark a task failed with a reason
    Fail {
        /// Task id to fail
        task_id: String,

        /// Why the task failed
        reason: String,
    },

    /// Return a task to pending and re-resolve readiness
    Reset {
        /// Task id to reset
        task_id: String,
    },

    /// Append a free-text note to a task
    Note {
        /// Task id to annotate
        task_id: String,

        /// Note text
        text: String,
    },

    /// Show per-sprint progress (all sprints, or one)
    Status {
        /// Sprint number (all sprints if omitted)
        sprint: Option<u32>,
    },

    /// List the next ready tasks in dispatch order
    Next {
        /// Maximum number of tasks to list
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Show the parallel execution plan for a sprint
    Plan {
        /// Sprint number
        sprint: u32,
    },

    /// Show overall progress and effort totals
    Stats,

    /// Show recent lifecycle history
    History {
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one task in full
    Show {
        /// Task id to show
        task_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    if let Ok(dir) = config.state_dir() {
        cadence::log::init(&dir, cli.debug);
    }

    match cli.command {
        Command::Init { catalog } => run_init(&config, catalog),
        Command::Dispatch { task_id, agent } => {
            run_dispatch(&config, &task_id, agent.as_deref())
        }
        Command::Complete { task_id, note } => {
            run_complete(&config, &task_id, note.as_deref())
        }
        Command::Fail { task_id, reason } => run_fail(&config, &task_id, &reason),
        Command::Reset { task_id } => run_reset(&config, &task_id),
        Command::Note { task_id, text } => run_note(&config, &task_id, &text),
        Command::Status { sprint } => run_status(&config, sprint, cli.json),
        Command::Next { limit } => run_next(&config, limit, cli.json),
        Command::Plan { sprint } => run_plan(&config, sprint, cli.json),
        Command::Stats => run_stats(&config, cli.json),
        Command::History { limit } => run_history(&config, limit, cli.json),
        Command::Show { task_id } => run_show(&config, &task_id, cli.json),
    }
}

fn store(config: &Config) -> Result<Box<dyn StateStore>> {
    Ok(Box::new(JsonFileStore::new(config.state_path()?)))
}

/// Open the orchestrator over existing state; error if none exists yet.
fn resume(config: &Config) -> Result<Orchestrator> {
    Orchestrator::resume(store(config)?, config.history_limit)?.ok_or_else(|| {
        Error::Validation(
            "No orchestrator state found. Run `cadence init --catalog <file>` first."
                .to_string(),
        )
    })
}

fn run_init(config: &Config, catalog_path: Option<PathBuf>) -> Result<()> {
    let path = catalog_path
        .or_else(|| config.catalog.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            Error::Catalog("No catalogue given: pass --catalog or set it in cadence.toml".to_string())
        })?;

    clog!("Init from catalogue {}", path.display());
    let catalog = Catalog::load(&path)?;
    let orchestrator = Orchestrator::open(&catalog, store(config)?, config.history_limit)?;

    let ready = query::next_ready_tasks(orchestrator.state(), usize::MAX).len();
    println!(
        "Initialized {} tasks ({} ready) from {}",
        orchestrator.state().tasks.len(),
        ready,
        path.display()
    );
    Ok(())
}

fn run_dispatch(config: &Config, task_id: &str, agent: Option<&str>) -> Result<()> {
    let mut orchestrator = resume(config)?;
    let outcome = orchestrator.dispatch_task(&TaskId::from(task_id), agent)?;
    println!("Dispatched {} to {}", outcome.task_id, outcome.agent_id);
    Ok(())
}

fn run_complete(config: &Config, task_id: &str, note: Option<&str>) -> Result<()> {
    let mut orchestrator = resume(config)?;
    let outcome = orchestrator.complete_task(&TaskId::from(task_id), note)?;
    println!("Completed {}", outcome.task_id);
    if outcome.unblocked.is_empty() {
        println!("  No tasks unblocked");
    } else {
        for id in &outcome.unblocked {
            println!("  Unblocked: {}", id);
        }
    }
    Ok(())
}

fn run_fail(config: &Config, task_id: &str, reason: &str) -> Result<()> {
    let mut orchestrator = resume(config)?;
    let id = TaskId::from(task_id);
    orchestrator.fail_task(&id, reason)?;
    println!("Failed {}: {}", id, reason);
    Ok(())
}

fn run_reset(config: &Config, task_id: &str) -> Result<()> {
    let mut orchestrator = resume(config)?;
    let id = TaskId::from(task_id);
    orchestrator.reset_task(&id)?;
    let status = orchestrator
        .state()
        .task(&id)
        .map(|t| t.status.to_string())
        .unwrap_or_default();
    println!("Reset {} (now {})", id, status);
    Ok(())
}

fn run_note(config: &Config, task_id: &str, text: &str) -> Result<()> {
    let mut orchestrator = resume(config)?;
    let id = TaskId::from(task_id);
    orchestrator.add_note(&id, text)?;
    println!("Noted {}", id);
    Ok(())
}

fn run_status(config: &Config, sprint: Option<u32>, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let statuses = match sprint {
        Some(s) => vec![query::sprint_status(orchestrator.state(), s)],
        None => query::all_sprint_statuses(orchestrator.state()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    for s in &statuses {
        let gate = if s.can_start { "" } else { "  [waiting on previous sprint]" };
        println!("Sprint {}: {}% complete{}", s.sprint, s.percent_complete, gate);
        println!(
            "  {} total | {} complete, {} in progress, {} ready, {} pending, {} blocked, {} failed",
            s.total, s.complete, s.in_progress, s.ready, s.pending, s.blocked, s.failed
        );
    }
    println!(
        "Current sprint: {}",
        orchestrator.state().current_sprint
    );
    Ok(())
}

fn run_next(config: &Config, limit: usize, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let ready = query::next_ready_tasks(orchestrator.state(), limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&ready)?);
        return Ok(());
    }

    if ready.is_empty() {
        println!("No tasks ready");
        return Ok(());
    }
    for task in ready {
        println!(
            "{}  sprint {}  {}  ({})",
            task.id, task.sprint, task.track, task.complexity
        );
    }
    Ok(())
}

fn run_plan(config: &Config, sprint: u32, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let plan = query::execution_plan(orchestrator.state(), sprint);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Sprint {} execution plan:", plan.sprint);
    if plan.lanes.is_empty() {
        println!("  No tasks in this sprint");
    }
    for (track, ids) in &plan.lanes {
        let list: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        println!("  {}: {}", track, list.join(", "));
    }
    Ok(())
}

fn run_stats(config: &Config, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let stats = query::overall_stats(orchestrator.state());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Tasks: {} total, {}% complete", stats.total, stats.percent_complete);
    println!(
        "  {} complete, {} in progress, {} ready, {} pending, {} blocked, {} failed",
        stats.complete, stats.in_progress, stats.ready, stats.pending, stats.blocked,
        stats.failed
    );
    println!(
        "Effort: {:.1}h estimated, {:.1}h remaining, {:.1}h spent",
        stats.estimated_hours_total, stats.estimated_hours_remaining,
        stats.actual_hours_spent
    );
    Ok(())
}

fn run_history(config: &Config, limit: usize, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let entries = query::recent_history(orchestrator.state(), limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history yet");
        return Ok(());
    }
    for entry in entries {
        let agent = entry
            .agent_id
            .as_ref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default();
        let details = entry
            .details
            .as_ref()
            .map(|d| format!(" - {}", d))
            .unwrap_or_default();
        println!(
            "{}  {:8} {}{}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.to_string(),
            entry.task_id,
            agent,
            details
        );
    }
    Ok(())
}

fn run_show(config: &Config, task_id: &str, json: bool) -> Result<()> {
    let orchestrator = resume(config)?;
    let id = TaskId::from(task_id);
    let task = query::get_task(orchestrator.state(), &id)
        .ok_or_else(|| Error::TaskNotFound { id: id.clone() })?;

    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
        return Ok(());
    }

    println!("Task {}", task.id);
    println!("  Sprint:     {}", task.sprint);
    println!("  Track:      {}", task.track);
    println!("  Status:     {}", task.status);
    println!("  Tests:      {}", task.test_status);
    println!("  Complexity: {}", task.complexity);
    println!("  Estimate:   {:.1}h", task.estimated_hours);
    if let Some(hours) = task.actual_hours {
        println!("  Actual:     {:.1}h", hours);
    }
    if let Some(agent) = &task.assigned_to {
        println!("  Agent:      {}", agent);
    }
    if !task.dependencies.is_empty() {
        let deps: Vec<&str> = task.dependencies.iter().map(|d| d.as_str()).collect();
        println!("  Depends on: {}", deps.join(", "));
    }
    if !task.blocks.is_empty() {
        let blocks: Vec<&str> = task.blocks.iter().map(|b| b.as_str()).collect();
        println!("  Blocks:     {}", blocks.join(", "));
    }
    if !task.tags.is_empty() {
        println!("  Tags:       {}", task.tags.join(", "));
    }
    println!("  Prompt:     {}", task.prompt.display());
    for note in &task.notes {
        println!("  Note: {}", note);
    }
    Ok(())
}
