//! medjudge demo CLI
//!
//! Runs judged episodes against the in-memory reference record service.
//! Every run uses the real episode manager, ledger and graders, wired
//! together with the fictional clinical records of `medjudge-ref-fhir`.
//!
//! Usage:
//!   cargo run -p demo -- tasks
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- run --task-id task4_1 --script replies.txt
//!   cargo run -p demo -- play --task-id task1_1

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medjudge_contracts::error::{JudgeError, JudgeResult, ParticipantError};
use medjudge_core::{
    assessment::{run_assessment, Assessment, Participant},
    config::EpisodeConfig,
    episode::EpisodeManager,
    session::JudgeSession,
    traits::TaskProvider,
};
use medjudge_grading::GraderRegistry;
use medjudge_ref_fhir::{MockFhirExecutor, ScriptedParticipant, TaskPool, DEFAULT_BASE_URL};

// ── CLI definition ────────────────────────────────────────────────────────────

/// medjudge: a judge for tool-using clinical agents.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "medjudge reference judge demo",
    long_about = "Runs judged episodes against an in-memory FHIR record service,\n\
                  showing the action protocol, step accounting, answer extraction,\n\
                  grading and the hash-chained transcript."
)]
struct Cli {
    #[command(flatten)]
    setup: Setup,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Setup {
    /// Task corpus (JSON array). Defaults to the bundled sample corpus.
    #[arg(long, global = true)]
    tasks: Option<PathBuf>,

    /// TOML file with an `[episode]` table and `[[graders]]` rules.
    /// Defaults to the built-in rules and limits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL reported by the record service and used in history entries.
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    fhir_base_url: String,

    /// Seed for task sampling.
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// List the tasks in the pool.
    Tasks,
    /// Run the reference solution for every sample task and print a summary.
    RunAll,
    /// Run one episode with replies read from a file, one action per line.
    Run {
        /// Task to run. Sampled from the pool when omitted.
        #[arg(long)]
        task_id: Option<String>,
        #[arg(long)]
        script: PathBuf,
    },
    /// Play one episode interactively, one action per line on stdin.
    Play {
        /// Task to run. Sampled from the pool when omitted.
        #[arg(long)]
        task_id: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Tasks => list_tasks(&cli.setup),
        Command::RunAll => run_all(&cli.setup),
        Command::Run { task_id, script } => run_script(&cli.setup, task_id.as_deref(), &script),
        Command::Play { task_id } => play(&cli.setup, task_id.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn load_pool(setup: &Setup) -> JudgeResult<TaskPool> {
    match &setup.tasks {
        Some(path) => TaskPool::from_file(path, setup.seed),
        None => TaskPool::sample_corpus(setup.seed),
    }
}

fn load_config(setup: &Setup) -> JudgeResult<(EpisodeConfig, GraderRegistry)> {
    match &setup.config {
        Some(path) => Ok((EpisodeConfig::from_file(path)?, GraderRegistry::from_file(path)?)),
        None => Ok((EpisodeConfig::default(), GraderRegistry::builtin()?)),
    }
}

fn build_session(setup: &Setup) -> JudgeResult<(JudgeSession, u32)> {
    let pool = load_pool(setup)?;
    let (config, grader) = load_config(setup)?;
    let retries = config.max_protocol_retries;
    let manager = EpisodeManager::new(
        Box::new(pool),
        Box::new(MockFhirExecutor::new(setup.fhir_base_url.as_str())),
        Box::new(grader),
        config,
    );
    Ok((JudgeSession::new(manager), retries))
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn list_tasks(setup: &Setup) -> JudgeResult<()> {
    let pool = load_pool(setup)?;
    println!("{} task(s):", pool.len());
    for task in pool.tasks() {
        println!("  {:<10} {:<9} {}", task.task_id, task.subject_id, task.instruction);
    }
    Ok(())
}

fn run_all(setup: &Setup) -> JudgeResult<()> {
    let task_ids: Vec<String> = load_pool(setup)?.tasks().map(|t| t.task_id.clone()).collect();
    let mut total = 0.0;
    let mut scored = 0usize;

    println!("{:<10} {:>6} {:>6}  {}", "TASK", "STEPS", "SCORE", "TRANSCRIPT");
    for task_id in &task_ids {
        let Some(mut participant) = ScriptedParticipant::reference(task_id) else {
            println!("{:<10} {:>6} {:>6}  (no reference solution)", task_id, "-", "-");
            continue;
        };
        // Fresh store per task so writes from one episode do not leak into the next.
        let (mut session, retries) = build_session(setup)?;
        let assessment = run_assessment(&mut session, &mut participant, Some(task_id), retries)?;
        let report = &assessment.report;
        println!(
            "{:<10} {:>6} {:>6.1}  {}",
            report.task_id,
            report.total_steps,
            report.score,
            report.transcript_hash.get(..16).unwrap_or(&report.transcript_hash)
        );
        total += report.score;
        scored += 1;
    }

    println!();
    println!("Solved {} of {} task(s).", total, scored);
    Ok(())
}

fn run_script(setup: &Setup, task_id: Option<&str>, script: &Path) -> JudgeResult<()> {
    let contents = std::fs::read_to_string(script).map_err(|e| JudgeError::Config {
        reason: format!("failed to read script file '{}': {}", script.display(), e),
    })?;
    let replies: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let (mut session, retries) = build_session(setup)?;
    let mut participant = ScriptedParticipant::new(replies);
    let assessment = run_assessment(&mut session, &mut participant, task_id, retries)?;
    print_assessment(&assessment);
    Ok(())
}

fn play(setup: &Setup, task_id: Option<&str>) -> JudgeResult<()> {
    let (mut session, retries) = build_session(setup)?;
    let mut participant = StdinParticipant;
    let assessment = run_assessment(&mut session, &mut participant, task_id, retries)?;
    print_assessment(&assessment);
    Ok(())
}

// ── Interactive participant ───────────────────────────────────────────────────

/// Shows each prompt on stdout and reads one reply line from stdin.
struct StdinParticipant;

impl Participant for StdinParticipant {
    fn act(&mut self, prompt: &str) -> Result<String, ParticipantError> {
        println!("{}", prompt);
        print!("> ");
        io::stdout().flush().map_err(|e| ParticipantError::Unreachable {
            reason: e.to_string(),
        })?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| ParticipantError::Unreachable { reason: e.to_string() })?;
        if read == 0 {
            return Err(ParticipantError::Exhausted);
        }
        Ok(line)
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_assessment(assessment: &Assessment) {
    println!();
    for update in &assessment.updates {
        println!("[{}/{}] {}", update.step, update.max_steps, update.status);
    }

    let report = &assessment.report;
    println!();
    println!("Task:        {} (patient {})", report.task_id, report.subject_id);
    println!("Steps:       {}", report.total_steps);
    println!("Score:       {:.1}", report.score);
    if let Some(answer) = &report.evaluation.extracted_answer {
        println!("Answer:      {}", serde_json::Value::Array(answer.clone()));
    }
    if let Some(error) = report.evaluation.error.as_ref().or(report.error.as_ref()) {
        println!("Error:       {}", error);
    }
    println!(
        "Transcript:  {} entries, chain {}",
        assessment.transcript.entries.len(),
        if assessment.transcript.verify() { "intact" } else { "BROKEN" }
    );
    println!("Final hash:  {}", report.transcript_hash);
}
