//! gepa-tool-optimizer CLI.
//!
//! Two subcommands: `run` drives an optimization to completion against a
//! JSON tool inventory and test-case file, streaming progress events as
//! JSON lines to stdout; `validate` checks the same inputs without
//! spending any budget.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use gepa_tool_optimizer::core::gateway::LlmGateway;
use gepa_tool_optimizer::domain::{TestCase, Tool};
use gepa_tool_optimizer::error::{Error, Result};
use gepa_tool_optimizer::gepa::{CancelToken, Event, EventEmitter, RunConfig, Scheduler, SelectionPolicyConfig};
use gepa_tool_optimizer::providers::{OpenRouterGateway, StubGateway};
use gepa_tool_optimizer::VERSION;

#[derive(Parser)]
#[command(
    name = "gepa-tool-optimizer",
    version = VERSION,
    about = "Evolve tool descriptions with a Genetic-Pareto search",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the optimizer to completion.
    Run(RunArgs),
    /// Validate a tool inventory and test-case file without running.
    Validate {
        #[arg(long)]
        tools: PathBuf,
        #[arg(long)]
        tests: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON file containing a list of tools.
    #[arg(long)]
    tools: PathBuf,
    /// JSON file containing a list of test cases.
    #[arg(long)]
    tests: PathBuf,
    #[arg(long, env = "GEPA_MAX_EVALUATIONS", default_value_t = 500)]
    max_evaluations: u64,
    #[arg(long, env = "GEPA_SUBSAMPLE_SIZE", default_value_t = 5)]
    subsample_size: usize,
    #[arg(long, env = "GEPA_MAX_CONCURRENT_EVALUATIONS", default_value_t = 3)]
    max_concurrent_evaluations: usize,
    #[arg(long, env = "GEPA_EVALUATION_MODEL", default_value = "openrouter/auto")]
    evaluation_model: String,
    #[arg(long, env = "GEPA_GENERATION_MODEL", default_value = "openrouter/auto")]
    generation_model: String,
    #[arg(long, env = "GEPA_MIN_ACCURACY", default_value_t = 0.0)]
    min_accuracy: f64,
    #[arg(long, env = "GEPA_ACCURACY_WEIGHT", default_value_t = 0.5)]
    accuracy_weight: f64,
    #[arg(long, env = "GEPA_SELECTION_TEMPERATURE", default_value_t = 1.0)]
    selection_temperature: f64,
    #[arg(long, value_enum, env = "GEPA_SELECTION_POLICY", default_value = "global_score")]
    selection_policy: SelectionPolicyConfig,
    /// Seed for the run's PRNG; reuse a seed to reproduce a run exactly.
    #[arg(long, env = "GEPA_SEED", default_value_t = 0)]
    seed: u64,
    /// OpenRouter API key. When omitted, falls back to a deterministic
    /// in-memory `StubGateway` so the optimizer still runs end to end
    /// without network access.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

/// Build a deterministic offline gateway from the test cases' own labels:
/// each test case's expected tool is routed on the longest word in its
/// query, so the stub can still exercise the scheduler's full loop.
fn stub_gateway_for(test_cases: &[TestCase]) -> StubGateway {
    let rules: Vec<(String, String)> = test_cases
        .iter()
        .filter_map(|tc| {
            tc.query
                .split_whitespace()
                .max_by_key(|word| word.len())
                .map(|keyword| (keyword.to_lowercase(), tc.expected_tool_name.clone()))
        })
        .collect();
    StubGateway::new(rules.iter().map(|(k, t)| (k.as_str(), t.as_str())).collect())
}

struct JsonLinesEmitter;

impl EventEmitter for JsonLinesEmitter {
    fn emit(&self, event: Event) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("failed to serialize event: {err}"),
        }
    }
}

fn load_tools(path: &Path) -> Result<Vec<Tool>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(Error::from)
}

fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(Error::from)
}

fn validate_inputs(tools: &[Tool], test_cases: &[TestCase]) -> Result<()> {
    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    if names.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(Error::Config("tool names must be unique".into()));
    }
    for test_case in test_cases {
        test_case
            .validate_against(tools.iter().map(|t| t.name.as_str()))
            .map_err(|reason| Error::Config(format!("test case {}: {reason}", test_case.id)))?;
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let tools = load_tools(&args.tools)?;
    let test_cases = load_test_cases(&args.tests)?;
    validate_inputs(&tools, &test_cases)?;

    let config = RunConfig {
        max_evaluations: args.max_evaluations,
        subsample_size: args.subsample_size,
        max_concurrent_evaluations: args.max_concurrent_evaluations,
        evaluation_model: args.evaluation_model,
        generation_model: args.generation_model,
        min_accuracy: args.min_accuracy,
        accuracy_weight: args.accuracy_weight,
        selection_temperature: args.selection_temperature,
        selection_policy: args.selection_policy,
    };
    config.validate()?;

    let openrouter_gateway;
    let stub_gateway;
    let gateway: &dyn LlmGateway = match args.api_key {
        Some(api_key) => {
            openrouter_gateway = OpenRouterGateway::new(SecretString::from(api_key))?;
            &openrouter_gateway
        }
        None => {
            tracing::info!("no API key supplied, running against the deterministic StubGateway");
            stub_gateway = stub_gateway_for(&test_cases);
            &stub_gateway
        }
    };
    let scheduler = Scheduler::new(config);
    let outcome = scheduler.run(tools, test_cases, gateway, &JsonLinesEmitter, CancelToken::new(), args.seed).await?;

    tracing::info!(
        run_id = %outcome.run_id,
        archive_size = outcome.archive.size(),
        budget_consumed = outcome.budget_consumed,
        "optimization run finished"
    );
    Ok(())
}

fn validate(tools_path: PathBuf, tests_path: PathBuf) -> Result<()> {
    let tools = load_tools(&tools_path)?;
    let test_cases = load_test_cases(&tests_path)?;
    validate_inputs(&tools, &test_cases)?;
    println!("ok: {} tools, {} test cases", tools.len(), test_cases.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gepa_tool_optimizer=debug")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Validate { tools, tests } => validate(tools, tests),
    }
}
