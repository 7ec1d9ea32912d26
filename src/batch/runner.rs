//! Runs scenarios against one or more models and collects the results.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::batch::analysis::analyze;
use crate::batch::report::{ModelRun, Report, RoundOutcome, RoundResult};
use crate::batch::scenarios::{SCENARIOS, Scenario, find_scenario};
use crate::commit::message::generate_commit_message;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{BatchError, ConfigError};
use crate::prompt::TemplateStore;
use crate::provider::{Transport, check_model_available};

/// Default number of rounds per scenario.
pub const DEFAULT_ROUNDS: u32 = 3;

/// Default pause between provider calls.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// A model to test: `<model>` (Ollama) or `<provider>:<model>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model: String,
}

impl ModelSpec {
    /// Build the provider config for this model.
    ///
    /// The stored config supplies URL and credential when it targets the same
    /// provider, otherwise the provider defaults are used and only the
    /// credential carries over.
    pub fn resolve(&self, stored: &ProviderConfig) -> Result<ProviderConfig, ConfigError> {
        if stored.provider == self.provider {
            Ok(stored.clone().with_model(&self.model))
        } else {
            stored.switch_provider(self.provider, None, Some(self.model.clone()))
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.id(), self.model)
    }
}

impl FromStr for ModelSpec {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BatchError::InvalidModelSpec(s.to_string()));
        }

        // Ollama tags contain ':' too, so only a known provider prefix splits
        if let Some((prefix, model)) = s.split_once(':')
            && let Ok(provider) = prefix.parse::<ProviderKind>()
        {
            if model.trim().is_empty() {
                return Err(BatchError::InvalidModelSpec(s.to_string()));
            }
            return Ok(Self {
                provider,
                model: model.trim().to_string(),
            });
        }

        Ok(Self {
            provider: ProviderKind::Ollama,
            model: s.to_string(),
        })
    }
}

/// Knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub rounds: u32,
    /// Restrict the run to one scenario.
    pub scenario: Option<String>,
    pub delay: Duration,
    /// Check Ollama models are installed before using them.
    pub preflight: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            scenario: None,
            delay: DEFAULT_DELAY,
            preflight: true,
        }
    }
}

/// Drives the commit pipeline over the scenario corpus.
pub struct BatchTester<'a> {
    transport: &'a dyn Transport,
    templates: &'a TemplateStore,
    options: BatchOptions,
}

impl<'a> BatchTester<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        templates: &'a TemplateStore,
        options: BatchOptions,
    ) -> Self {
        Self {
            transport,
            templates,
            options,
        }
    }

    /// Scenarios selected by the options.
    pub fn scenarios(&self) -> Result<Vec<&'static Scenario>, BatchError> {
        match &self.options.scenario {
            Some(name) => Ok(vec![find_scenario(name)?]),
            None => Ok(SCENARIOS.iter().collect()),
        }
    }

    /// Run every selected scenario `rounds` times for each model.
    ///
    /// Per-round provider failures are recorded and the run continues. A model
    /// whose config is unusable is skipped with the reason.
    pub async fn run(
        &self,
        specs: &[ModelSpec],
        stored: &ProviderConfig,
    ) -> Result<Report, BatchError> {
        let scenarios = self.scenarios()?;
        let mut models = Vec::with_capacity(specs.len());

        for spec in specs {
            info!(model = %spec, "Testing model");
            models.push(self.run_model(spec, stored, &scenarios).await);
        }

        Ok(Report::new(self.options.rounds, models))
    }

    /// Whether to wait after the unit at (`round`, `index`) of `count`
    /// scenarios. There is no pause after the last unit.
    fn pauses_after(&self, round: u32, index: usize, count: usize) -> bool {
        let last = round >= self.options.rounds && index + 1 >= count;
        !self.options.delay.is_zero() && !last
    }

    async fn run_model(
        &self,
        spec: &ModelSpec,
        stored: &ProviderConfig,
        scenarios: &[&'static Scenario],
    ) -> ModelRun {
        let mut run = ModelRun {
            label: spec.to_string(),
            results: Vec::new(),
            skipped: None,
        };

        let config = match spec.resolve(stored) {
            Ok(config) => config,
            Err(e) => {
                warn!(model = %spec, error = %e, "Skipping model");
                run.skipped = Some(e.to_string());
                return run;
            }
        };
        if let Err(e) = config.validate() {
            warn!(model = %spec, error = %e, "Skipping model");
            run.skipped = Some(e.to_string());
            return run;
        }

        if self.options.preflight
            && config.provider == ProviderKind::Ollama
            && let Err(e) = check_model_available(&config, self.transport).await
        {
            warn!(model = %spec, error = %e, "Skipping model");
            run.skipped = Some(e.to_string());
            return run;
        }

        for round in 1..=self.options.rounds {
            for (index, &scenario) in scenarios.iter().enumerate() {
                let result = generate_commit_message(
                    &config,
                    self.templates,
                    &scenario.changeset(),
                    scenario.diff,
                    scenario.stats,
                    self.transport,
                )
                .await;

                let outcome = match result {
                    Ok(generated) => {
                        let analysis = analyze(&generated.text, scenario);
                        info!(
                            model = %spec,
                            round,
                            scenario = scenario.name,
                            matched = analysis.is_match(),
                            "Round completed"
                        );
                        RoundOutcome::Completed {
                            message: generated.text,
                            analysis,
                        }
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!(model = %spec, round, scenario = scenario.name, error = %e, "Round failed");
                        RoundOutcome::Failed {
                            error: e.kind(),
                            reason: e.to_string(),
                        }
                    }
                    Err(e) => {
                        warn!(model = %spec, error = %e, "Stopping model");
                        run.skipped = Some(e.to_string());
                        return run;
                    }
                };

                run.results.push(RoundResult {
                    round,
                    scenario: scenario.name,
                    expected: scenario.expectation(),
                    outcome,
                });

                if self.pauses_after(round, index, scenarios.len()) {
                    tokio::time::sleep(self.options.delay).await;
                }
            }
        }

        run
    }
}
