//! CLI command definitions for agent-bench.
//!
//! Each subcommand maps onto one library entry point: `run` drives the full
//! benchmark, `test-only` grades the current workspace, `list` shows the
//! available exercises and `instructions` prints what an agent would be told.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser};
use tracing::{info, warn};

use crate::agents::{AgentKind, AgentSpec, Credentials};
use crate::exercises::ExerciseReader;
use crate::pipeline::{
    export_json, BenchmarkConfig, BenchmarkRunner, BenchmarkSummary, ExercisePipeline,
    ExerciseSelection, PhaseResult, TestOnlyOutcome, TestOnlyRunner, DEFAULT_CONTAINER_IMAGE,
    DEFAULT_TEST_COMMAND,
};

/// Default model handed to the agent.
const DEFAULT_MODEL: &str = "sonnet";

/// Default checkout of the exercise track.
const DEFAULT_EXERCISM_PATH: &str = "exercism/typescript";

/// Benchmark coding agents against practice exercises.
#[derive(Parser)]
#[command(name = "agent-bench")]
#[command(about = "Benchmark coding agents against practice exercises")]
#[command(version)]
#[command(
    long_about = "agent-bench runs an external coding agent against each selected exercise, restores the protected test files and grades the result with the exercise's own tests.\n\nExample usage:\n  agent-bench run --agent claude --model sonnet --exercise 5 --output-dir ./results"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run an agent against the selected exercises, then grade them.
    Run(Box<RunArgs>),

    /// Run only the tests of the selected exercises, as they are on disk.
    #[command(name = "test-only")]
    TestOnly(TestOnlyArgs),

    /// List the available exercises.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Print the instructions an agent would receive.
    Instructions(InstructionsArgs),
}

/// Where the exercises live and which ones to use.
#[derive(Args, Debug, Clone)]
pub struct ExerciseArgs {
    /// Root of the exercise track checkout.
    #[arg(long, env = "AGENT_BENCH_EXERCISM_PATH", default_value = DEFAULT_EXERCISM_PATH)]
    pub exercism_path: PathBuf,

    /// Exercise selection: a name, a count (`5`) or a comma-separated list.
    /// Defaults to the first exercise.
    #[arg(short, long, env = "AGENT_BENCH_EXERCISE")]
    pub exercise: Option<ExerciseSelection>,
}

impl ExerciseArgs {
    fn reader(&self) -> ExerciseReader {
        ExerciseReader::new(&self.exercism_path)
    }

    fn selection(&self) -> ExerciseSelection {
        self.exercise.clone().unwrap_or_default()
    }
}

/// Options shared by every command that runs tests.
#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Shell command that runs an exercise's tests.
    #[arg(long, env = "AGENT_BENCH_TEST_COMMAND", default_value = DEFAULT_TEST_COMMAND)]
    pub test_command: String,

    /// Test timeout in seconds.
    #[arg(long, env = "AGENT_BENCH_TEST_TIMEOUT")]
    pub test_timeout: Option<u64>,

    /// Run the tests inside the container too.
    #[arg(long, env = "AGENT_BENCH_TESTS_IN_CONTAINER")]
    pub tests_in_container: bool,

    /// Container image for containerized phases.
    #[arg(long, env = "AGENT_BENCH_IMAGE", default_value = DEFAULT_CONTAINER_IMAGE)]
    pub image: String,

    /// Container runtime binary.
    #[arg(long, env = "AGENT_BENCH_RUNTIME", default_value = "docker")]
    pub runtime: String,

    /// Pause between exercises in seconds.
    #[arg(long, env = "AGENT_BENCH_DELAY", default_value = "1")]
    pub delay: u64,

    /// Log commands, outputs and diffs.
    #[arg(short, long, env = "AGENT_BENCH_VERBOSE")]
    pub verbose: bool,

    /// Output results as JSON on stdout.
    #[arg(short = 'j', long)]
    pub json: bool,
}

impl TestArgs {
    fn config(&self) -> BenchmarkConfig {
        BenchmarkConfig::new()
            .with_test_command(&self.test_command)
            .with_test_timeout(self.test_timeout.map(Duration::from_secs))
            .with_tests_in_container(self.tests_in_container)
            .with_container_image(&self.image)
            .with_container_runtime(&self.runtime)
            .with_exercise_delay(Duration::from_secs(self.delay))
            .with_verbose(self.verbose)
    }
}

/// Arguments for `agent-bench run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Agent to benchmark (claude, goose, aider, codex, gemini, opencode, qwen, cursor, custom).
    #[arg(short, long, env = "AGENT_BENCH_AGENT", default_value = "claude")]
    pub agent: AgentKind,

    /// Model handed to the agent.
    #[arg(short, long, env = "AGENT_BENCH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Provider, for agents that support several backends.
    #[arg(short, long, env = "AGENT_BENCH_PROVIDER")]
    pub provider: Option<String>,

    /// Shell command for the custom agent; it receives the instructions on stdin.
    #[arg(long, env = "AGENT_BENCH_AGENT_COMMAND")]
    pub agent_command: Option<String>,

    /// Container image for the agent. Defaults to `--image`.
    #[arg(long, env = "AGENT_BENCH_AGENT_IMAGE")]
    pub agent_image: Option<String>,

    #[command(flatten)]
    pub exercises: ExerciseArgs,

    #[command(flatten)]
    pub tests: TestArgs,

    /// Agent timeout in seconds.
    #[arg(long, env = "AGENT_BENCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Run the agent on the host instead of in a container.
    #[arg(long, env = "AGENT_BENCH_LOCAL")]
    pub local: bool,

    /// Log workspace changes while the agent works.
    #[arg(long, env = "AGENT_BENCH_SHOW_PROGRESS")]
    pub show_progress: bool,

    /// Seconds between progress checks.
    #[arg(long, env = "AGENT_BENCH_PROGRESS_INTERVAL", default_value = "8")]
    pub progress_interval: u64,

    /// Extra text appended to every exercise's instructions.
    #[arg(long, env = "AGENT_BENCH_CUSTOM_INSTRUCTION")]
    pub custom_instruction: Option<String>,

    /// Directory for the JSON report and `<agent>/logs/<exercise>.log`.
    #[arg(short, long, env = "AGENT_BENCH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn config(&self) -> BenchmarkConfig {
        self.tests
            .config()
            .with_agent_timeout(self.timeout.map(Duration::from_secs))
            .with_container(!self.local)
            .with_progress(self.show_progress)
            .with_progress_interval(Duration::from_secs(self.progress_interval))
            .with_custom_instruction(self.custom_instruction.clone())
            .with_agent_log_dir(
                self.output_dir
                    .as_ref()
                    .map(|dir| dir.join(self.agent.as_str()).join("logs")),
            )
    }

    /// An empty image makes the agent use `config.container_image`.
    fn spec(&self) -> AgentSpec {
        let image = self.agent_image.as_deref().unwrap_or_default();
        let mut spec = AgentSpec::new(self.agent, &self.model, image);
        if let Some(provider) = &self.provider {
            spec = spec.with_provider(provider);
        }
        if let Some(command) = &self.agent_command {
            spec = spec.with_custom_command(command);
        }
        spec
    }
}

/// Arguments for `agent-bench test-only`.
#[derive(Parser, Debug)]
pub struct TestOnlyArgs {
    #[command(flatten)]
    pub exercises: ExerciseArgs,

    #[command(flatten)]
    pub tests: TestArgs,
}

/// Arguments for `agent-bench list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Root of the exercise track checkout.
    #[arg(long, env = "AGENT_BENCH_EXERCISM_PATH", default_value = DEFAULT_EXERCISM_PATH)]
    pub exercism_path: PathBuf,

    /// Output the list as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `agent-bench instructions`.
#[derive(Parser, Debug)]
pub struct InstructionsArgs {
    #[command(flatten)]
    pub exercises: ExerciseArgs,

    /// Extra text appended to the instructions.
    #[arg(long, env = "AGENT_BENCH_CUSTOM_INSTRUCTION")]
    pub custom_instruction: Option<String>,
}

/// Parse CLI arguments and return the Cli struct.
///
/// Use this when you need access to CLI args before running the command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_benchmark_command(*args).await,
        Commands::TestOnly(args) => run_test_only_command(args).await,
        Commands::List(args) => run_list_command(args).await,
        Commands::Instructions(args) => run_instructions_command(args).await,
    }
}

// ============================================================================
// Benchmark Command Implementation
// ============================================================================

async fn run_benchmark_command(args: RunArgs) -> anyhow::Result<()> {
    let config = args.config();
    config.validate().context("Invalid benchmark configuration")?;
    let spec = args.spec();
    let credentials = Credentials::from_env();
    if credentials.is_empty() {
        warn!("No credential variables set; agents may fail to authenticate");
    }

    // progress events are logged by the monitor itself
    let pipeline = ExercisePipeline::new(spec, credentials, config);
    let runner = BenchmarkRunner::new(args.exercises.reader(), pipeline);
    let names = runner
        .select(&args.exercises.selection())
        .await
        .context("Failed to select exercises")?;
    if names.is_empty() {
        anyhow::bail!(
            "No exercises found under {}",
            runner.reader().practice_dir().display()
        );
    }

    info!(
        agent = %args.agent,
        model = %args.model,
        exercises = names.len(),
        "Starting benchmark"
    );
    let summary = runner.run(&names).await.context("Benchmark aborted")?;

    if let Some(dir) = &args.output_dir {
        let path = export_json(&summary, dir)
            .await
            .with_context(|| format!("Failed to write report into {}", dir.display()))?;
        info!(path = %path.display(), "Report written");
    }

    if args.tests.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &BenchmarkSummary) {
    println!("\n=== Benchmark Results ===");
    println!("Agent:          {}", summary.agent.display_name());
    println!("Model:          {}", summary.model);
    if let Some(provider) = &summary.provider {
        println!("Provider:       {}", provider);
    }
    println!("Exercises:      {}", summary.total);
    println!("Agent success:  {}", summary.agent_successes);
    println!("Tests passed:   {}", summary.test_successes);
    println!("Overall:        {}", summary.overall_successes);
    println!("Success rate:   {:.1}%", summary.success_rate);
    println!(
        "Total time:     {:.1}s",
        summary.total_duration_ms as f64 / 1000.0
    );
    println!();

    for outcome in &summary.outcomes {
        println!(
            "  {} [{}] agent={} ({:.1}s) tests={} ({:.1}s)",
            outcome.exercise,
            if outcome.overall_success { "PASS" } else { "FAIL" },
            status(&outcome.agent_phase),
            secs(&outcome.agent_phase),
            status(&outcome.test_phase),
            secs(&outcome.test_phase),
        );
        for err in [&outcome.agent_phase.error, &outcome.test_phase.error]
            .into_iter()
            .flatten()
        {
            println!("    error: {}", first_line(err));
        }
    }
}

// ============================================================================
// Test-only Command Implementation
// ============================================================================

async fn run_test_only_command(args: TestOnlyArgs) -> anyhow::Result<()> {
    let config = args.tests.config();
    config.validate().context("Invalid test configuration")?;

    let runner = TestOnlyRunner::new(args.exercises.reader(), config);
    let names = runner
        .select(&args.exercises.selection())
        .await
        .context("Failed to select exercises")?;
    let outcomes = runner.run(&names).await.context("Test run aborted")?;

    if args.tests.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        print_test_outcomes(&outcomes);
    }
    Ok(())
}

fn print_test_outcomes(outcomes: &[TestOnlyOutcome]) {
    let passed = outcomes.iter().filter(|o| o.test_phase.success).count();
    println!("\n=== Test Results ===");
    println!("Exercises:      {}", outcomes.len());
    println!("Passed:         {}", passed);
    println!("Failed:         {}", outcomes.len() - passed);
    println!();
    for outcome in outcomes {
        println!(
            "  {} [{}] {:.1}s",
            outcome.exercise,
            status(&outcome.test_phase),
            secs(&outcome.test_phase)
        );
        if let Some(err) = &outcome.test_phase.error {
            println!("    error: {}", first_line(err));
        }
    }
}

// ============================================================================
// List / Instructions Commands
// ============================================================================

async fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let reader = ExerciseReader::new(&args.exercism_path);
    let names = reader
        .list()
        .await
        .with_context(|| format!("Failed to list exercises in {}", args.exercism_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        println!("Available exercises ({}):", names.len());
        for name in &names {
            println!("  {}", name);
        }
    }
    Ok(())
}

async fn run_instructions_command(args: InstructionsArgs) -> anyhow::Result<()> {
    let reader = args.exercises.reader();
    let names = args
        .exercises
        .selection()
        .resolve(&reader.list().await?)
        .context("Failed to select exercises")?;

    for name in &names {
        let exercise = reader
            .load(name, args.custom_instruction.as_deref())
            .await
            .with_context(|| format!("Failed to load exercise {}", name))?;
        println!("=== {} ===", exercise.name);
        println!("{}", exercise.instructions);
        println!();
    }
    Ok(())
}

fn status(phase: &PhaseResult) -> &'static str {
    if phase.success {
        "ok"
    } else {
        "failed"
    }
}

fn secs(phase: &PhaseResult) -> f64 {
    phase.duration().as_secs_f64()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["agent-bench", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config();

        assert_eq!(args.agent, AgentKind::Claude);
        assert_eq!(args.model, DEFAULT_MODEL);
        assert!(config.use_container);
        assert!(!config.tests_in_container);
        assert_eq!(config.agent_timeout, None);
        assert_eq!(config.test_command, DEFAULT_TEST_COMMAND);
        assert_eq!(args.exercises.selection(), ExerciseSelection::FirstOnly);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_run_options_reach_config() {
        let cli = Cli::try_parse_from([
            "agent-bench",
            "run",
            "--agent",
            "custom",
            "--agent-command",
            "my-agent --fast",
            "--exercise",
            "acronym,bob",
            "--timeout",
            "300",
            "--local",
            "--show-progress",
            "--progress-interval",
            "2",
            "--delay",
            "0",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config();
        let spec = args.spec();

        assert_eq!(spec.kind, AgentKind::Custom);
        assert_eq!(spec.custom_command.as_deref(), Some("my-agent --fast"));
        assert_eq!(config.agent_timeout, Some(Duration::from_secs(300)));
        assert!(!config.use_container);
        assert!(config.show_progress);
        assert_eq!(config.progress_interval, Duration::from_secs(2));
        assert_eq!(config.exercise_delay, Duration::ZERO);
        assert_eq!(
            args.exercises.selection(),
            ExerciseSelection::List(vec!["acronym".into(), "bob".into()])
        );
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_output_dir_and_agent_image() {
        let cli = Cli::try_parse_from([
            "agent-bench",
            "run",
            "--agent",
            "goose",
            "--output-dir",
            "out",
            "--agent-image",
            "goose-agent:1",
            "--image",
            "tests:1",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config();

        assert_eq!(config.agent_log_dir, Some(PathBuf::from("out/goose/logs")));
        assert_eq!(args.spec().container_id, "goose-agent:1");
        assert_eq!(config.container_image, "tests:1");

        let cli = Cli::try_parse_from(["agent-bench", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config().agent_log_dir, None);
        assert_eq!(args.spec().container_id, "");
    }

    #[test]
    fn test_unknown_agent_is_rejected() {
        assert!(Cli::try_parse_from(["agent-bench", "run", "--agent", "nope"]).is_err());
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("STDOUT: a\nSTDERR: b"), "STDOUT: a");
        assert_eq!(first_line(""), "");
    }
}
