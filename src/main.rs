//! cmai - CLI entry point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use git2::Repository;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cmai::batch::{
    BatchOptions, BatchTester, DEFAULT_ROUNDS, ModelSpec, SCENARIOS, find_scenario,
};
use cmai::commit::{CommitMessage, generate_commit_message, prepare_prompt};
use cmai::config::{ConfigStore, ProviderConfig, ProviderKind};
use cmai::error::{CommitError, ConfigError};
use cmai::git::{collect_staged, create_commit, push_origin, stage_all};
use cmai::prompt::{PromptStyle, TemplateStore};
use cmai::provider::{HttpTransport, check_model_available};

/// Generate conventional commit messages from staged changes using AI.
#[derive(Parser, Debug)]
#[command(name = "cmai")]
#[command(about = "Generate conventional commit messages from staged changes using AI")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Push to origin after committing
    #[arg(short = 'p', long)]
    push: bool,

    /// Commit only what is already staged
    #[arg(long)]
    no_stage: bool,

    /// Dry run - print the message without committing
    #[arg(long)]
    dry_run: bool,

    /// Model to use (saved for later runs)
    #[arg(long)]
    model: Option<String>,

    /// Provider base URL (saved for later runs)
    #[arg(long)]
    base_url: Option<String>,

    /// API key (saved for later runs)
    #[arg(long)]
    api_key: Option<String>,

    /// Switch to a local Ollama server
    #[arg(long, group = "provider")]
    use_ollama: bool,

    /// Switch to OpenRouter
    #[arg(long, group = "provider")]
    use_openrouter: bool,

    /// Switch to a local LM Studio server
    #[arg(long, group = "provider")]
    use_lmstudio: bool,

    /// Switch to an OpenAI-compatible endpoint at URL
    #[arg(long, group = "provider", value_name = "URL")]
    use_custom: Option<String>,

    /// Directory with small.md / medium.md / large.md instruction templates
    #[arg(long, value_name = "DIR")]
    template_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the test scenarios against one or more models
    Batch(BatchArgs),

    /// List the built-in test scenarios
    Scenarios,

    /// Print the prompt a scenario produces for the configured model
    Preview {
        /// Scenario name (see `cmai scenarios`)
        scenario: String,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Models to test, as <model> (Ollama) or <provider>:<model>, comma separated
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Rounds per scenario
    #[arg(long, default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Run only this scenario
    #[arg(long)]
    scenario: Option<String>,

    /// Directory the report is written to
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Pause between provider calls in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Also write the report as JSON
    #[arg(long)]
    json: bool,

    /// Skip the Ollama installed-model check
    #[arg(long)]
    no_preflight: bool,
}

impl Cli {
    fn provider_switch(&self) -> Option<ProviderKind> {
        if self.use_ollama {
            Some(ProviderKind::Ollama)
        } else if self.use_openrouter {
            Some(ProviderKind::OpenRouter)
        } else if self.use_lmstudio {
            Some(ProviderKind::LmStudio)
        } else if self.use_custom.is_some() {
            Some(ProviderKind::Custom)
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match &cli.command {
        Some(Command::Scenarios) => {
            list_scenarios();
            Ok(())
        }
        Some(Command::Preview { scenario }) => {
            let config = preview_config(ConfigStore::open().and_then(|store| store.load()), &cli);
            let templates = TemplateStore::resolve(cli.template_dir.as_deref());
            preview(&config, &templates, scenario)
        }
        Some(Command::Batch(args)) => {
            let config = resolve_config(&cli)?;
            let templates = TemplateStore::resolve(cli.template_dir.as_deref());
            run_batch(&config, &templates, args).await
        }
        None => {
            let config = resolve_config(&cli)?;
            let templates = TemplateStore::resolve(cli.template_dir.as_deref());
            run_commit(&cli, &config, &templates).await
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "cmai=debug" } else { "cmai=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve provider config, persisting any overrides.
fn resolve_config(cli: &Cli) -> Result<ProviderConfig> {
    let store = ConfigStore::open().context("Failed to open config store")?;
    apply_overrides(&store, cli)
}

/// Config for a prompt preview. Nothing is saved, and an unreadable config
/// falls back to defaults since no provider is called.
fn preview_config(stored: Result<ProviderConfig, ConfigError>, cli: &Cli) -> ProviderConfig {
    let mut config = stored.unwrap_or_else(|e| {
        warn!(error = %e, "Could not load config, previewing with defaults");
        ProviderConfig::default()
    });
    if let Some(kind) = cli.provider_switch() {
        let base_url = cli.use_custom.clone().or_else(|| cli.base_url.clone());
        match config.switch_provider(kind, base_url, None) {
            Ok(switched) => config = switched,
            Err(e) => warn!(error = %e, "Ignoring provider switch for preview"),
        }
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    config
}

/// Merge command-line overrides into the stored config and save them.
fn apply_overrides(store: &ConfigStore, cli: &Cli) -> Result<ProviderConfig> {
    let mut config = store.load().context("Failed to load config")?;

    if let Some(raw) = &cli.api_key {
        let key = store.save_api_key(raw)?;
        config = config.with_api_key(Some(key));
        println!("API key saved");
    }

    if let Some(kind) = cli.provider_switch() {
        let base_url = cli.use_custom.clone().or_else(|| cli.base_url.clone());
        config = config.switch_provider(kind, base_url, cli.model.clone())?;
        store.save(&config)?;
        println!("Using {} at {} ({})", config.provider, config.base_url, config.model);
        return Ok(config);
    }

    if let Some(url) = &cli.base_url {
        config.base_url = url.trim().to_string();
        store.save_base_url(&config.base_url)?;
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model);
        store.save_model(&config.model)?;
    }

    Ok(config)
}

async fn run_commit(cli: &Cli, config: &ProviderConfig, templates: &TemplateStore) -> Result<()> {
    config.validate()?;
    let transport = HttpTransport::new()?;

    // Step 2: Make sure a local model is actually there
    if config.provider == ProviderKind::Ollama {
        check_model_available(config, &transport).await?;
    }

    // Step 3: Stage and collect changes
    let repo = Repository::discover(".")
        .context("Not a git repository. Run cmai from within a git repository.")?;

    if !cli.no_stage {
        stage_all(&repo)?;
    }
    let staged = collect_staged(&repo)?;
    if staged.is_empty() {
        return Err(CommitError::NoStagedChanges.into());
    }

    println!(
        "Generating commit message with {} ({}) for {} files...",
        config.provider,
        config.model,
        staged.changes.len()
    );

    // Step 4: Generate
    let generated = generate_commit_message(
        config,
        templates,
        &staged.changes,
        &staged.diff,
        Some(&staged.stats),
        &transport,
    )
    .await?;

    if CommitMessage::parse(&generated.text).is_none() {
        eprintln!("Warning: the message does not follow the conventional commit format");
    }

    // Step 5: Commit or display
    if cli.dry_run {
        println!("\n--- Dry Run Output ---\n");
        println!("{}", generated.text);
        return Ok(());
    }

    let oid = create_commit(&repo, &generated.text)?;
    let subject = generated.text.lines().next().unwrap_or_default();
    println!("✓ Committed {}: {}", short_id(&oid.to_string()), subject);

    if cli.push {
        let workdir = repo
            .workdir()
            .context("Cannot push from a bare repository")?;
        push_origin(workdir).await?;
        println!("✓ Pushed to origin");
    }

    Ok(())
}

async fn run_batch(config: &ProviderConfig, templates: &TemplateStore, args: &BatchArgs) -> Result<()> {
    let specs = if args.models.is_empty() {
        vec![ModelSpec {
            provider: config.provider,
            model: config.model.clone(),
        }]
    } else {
        args.models
            .iter()
            .map(|m| m.parse::<ModelSpec>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let options = BatchOptions {
        rounds: args.rounds,
        scenario: args.scenario.clone(),
        delay: Duration::from_millis(args.delay_ms),
        preflight: !args.no_preflight,
    };

    let transport = HttpTransport::new()?;
    let tester = BatchTester::new(&transport, templates, options);
    let scenario_count = tester.scenarios()?.len();

    println!(
        "Testing {} model(s) on {} scenario(s), {} round(s) each...",
        specs.len(),
        scenario_count,
        args.rounds
    );

    let report = tester.run(&specs, config).await?;

    for model in &report.models {
        match &model.skipped {
            Some(reason) if model.results.is_empty() => {
                println!("  {} skipped: {}", model.label, reason);
            }
            _ => {
                let stats = model.stats();
                println!(
                    "  {}: {}/{} rounds completed, {:.1}% overall",
                    model.label, stats.completed, stats.attempted, stats.overall_rate
                );
            }
        }
    }

    let path = report
        .write_to(&args.output_dir, args.json)
        .context("Failed to write batch report")?;
    println!("✓ Report written to {}", display_path(&path));

    Ok(())
}

fn list_scenarios() {
    println!("Available scenarios:\n");
    for scenario in SCENARIOS {
        println!(
            "  {:<26} {:<18} {}",
            scenario.name,
            scenario.expectation(),
            scenario.description
        );
    }
}

fn preview(config: &ProviderConfig, templates: &TemplateStore, name: &str) -> Result<()> {
    let scenario = find_scenario(name)?;
    let (payload, prompt) = prepare_prompt(
        config,
        templates,
        &scenario.changeset(),
        scenario.diff,
        scenario.stats,
    )?;

    println!("Scenario: {} ({})", scenario.name, scenario.description);
    println!("Expected: {}", scenario.expectation());
    println!(
        "Model: {} via {} (tier: {}, diff: {}, {} chars)",
        config.model, config.provider, prompt.tier, payload.strategy, payload.char_count
    );
    for hint in &prompt.hints {
        println!("Hint: {} -> {}", hint.reason, hint.suggested);
    }

    match prompt.style {
        PromptStyle::Completion => {
            println!("\n--- Prompt ---\n");
            println!("{}", prompt.completion_text());
        }
        PromptStyle::Chat => {
            println!("\n--- System ---\n");
            println!("{}", prompt.system);
            println!("\n--- User ---\n");
            println!("{}", prompt.user);
        }
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_survives_unreadable_config() {
        let cli = Cli::parse_from(["cmai", "--model", "qwen3:1.7b", "preview", "simple_fix"]);
        let config = preview_config(Err(ConfigError::NoConfigDir), &cli);
        assert_eq!(config.provider, ProviderConfig::default().provider);
        assert_eq!(config.model, "qwen3:1.7b");
    }

    #[test]
    fn test_preview_applies_switch_without_saving() {
        let cli = Cli::parse_from(["cmai", "--use-ollama", "preview", "simple_fix"]);
        let stored = ProviderConfig::default();
        let config = preview_config(Ok(stored), &cli);
        assert_eq!(config.provider, ProviderKind::Ollama);
    }

    #[test]
    fn test_scenarios_needs_no_flags() {
        let cli = Cli::parse_from(["cmai", "scenarios"]);
        assert!(matches!(cli.command, Some(Command::Scenarios)));
    }
}
