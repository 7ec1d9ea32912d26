//! Batch result aggregation and report rendering.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::batch::analysis::Analysis;
use crate::error::BatchError;

/// Format rate below this percentage triggers a recommendation.
pub const FORMAT_RATE_THRESHOLD: f64 = 80.0;

/// Type rate below this percentage triggers a recommendation.
pub const TYPE_RATE_THRESHOLD: f64 = 70.0;

/// Scenarios matching less often than this are called inconsistent.
pub const CONSISTENCY_THRESHOLD: f64 = 80.0;

/// Spread of type rates across models worth pointing out.
const TYPE_GAP_THRESHOLD: f64 = 20.0;

/// Every model above this format rate means the format rules carry over.
const FORMAT_GENERALIZES_THRESHOLD: f64 = 90.0;

/// What happened in one (round, scenario) unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundOutcome {
    Completed { message: String, analysis: Analysis },
    Failed { error: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub round: u32,
    pub scenario: &'static str,
    /// `type(scope)` the scenario expects.
    pub expected: String,
    pub outcome: RoundOutcome,
}

impl RoundResult {
    pub fn analysis(&self) -> Option<&Analysis> {
        match &self.outcome {
            RoundOutcome::Completed { analysis, .. } => Some(analysis),
            RoundOutcome::Failed { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.analysis().is_some_and(Analysis::is_match)
    }
}

/// All results for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRun {
    /// `provider:model`.
    pub label: String,
    pub results: Vec<RoundResult>,
    /// Why the model was skipped or stopped early.
    pub skipped: Option<String>,
}

/// Per-scenario accuracy for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStats {
    pub scenario: &'static str,
    pub expected: String,
    pub attempted: usize,
    pub matches: usize,
    pub failures: usize,
    pub failure_reasons: Vec<String>,
}

impl ScenarioStats {
    /// Matches over rounds attempted, failed rounds included.
    pub fn accuracy(&self) -> f64 {
        ratio(self.matches, self.attempted)
    }
}

/// Aggregate rates for one model, over completed rounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelStats {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub format_rate: f64,
    pub type_rate: f64,
    pub scope_rate: f64,
    pub overall_rate: f64,
}

impl ModelRun {
    pub fn stats(&self) -> ModelStats {
        let completed: Vec<&Analysis> = self.results.iter().filter_map(RoundResult::analysis).collect();
        let count = |f: fn(&Analysis) -> bool| completed.iter().filter(|a| f(a)).count();

        ModelStats {
            attempted: self.results.len(),
            completed: completed.len(),
            failed: self.results.len() - completed.len(),
            format_rate: ratio(count(|a| a.has_format), completed.len()),
            type_rate: ratio(count(|a| a.type_correct), completed.len()),
            scope_rate: ratio(count(|a| a.has_format && a.scope_correct), completed.len()),
            overall_rate: ratio(count(Analysis::is_match), completed.len()),
        }
    }

    /// Per-scenario stats in first-seen scenario order.
    pub fn scenario_stats(&self) -> Vec<ScenarioStats> {
        let mut stats: Vec<ScenarioStats> = Vec::new();
        for result in &self.results {
            let idx = match stats.iter().position(|s| s.scenario == result.scenario) {
                Some(idx) => idx,
                None => {
                    stats.push(ScenarioStats {
                        scenario: result.scenario,
                        expected: result.expected.clone(),
                        attempted: 0,
                        matches: 0,
                        failures: 0,
                        failure_reasons: Vec::new(),
                    });
                    stats.len() - 1
                }
            };
            let entry = &mut stats[idx];
            entry.attempted += 1;
            match &result.outcome {
                RoundOutcome::Completed { analysis, .. } => {
                    if analysis.is_match() {
                        entry.matches += 1;
                    }
                }
                RoundOutcome::Failed { error, reason } => {
                    entry.failures += 1;
                    entry
                        .failure_reasons
                        .push(format!("round {}: {error}: {reason}", result.round));
                }
            }
        }
        stats
    }

    /// Suggestions for prompt work, from the model's weakest areas.
    ///
    /// Nothing is suggested for a model without completed rounds.
    pub fn recommendations(&self) -> Vec<String> {
        let stats = self.stats();
        if stats.completed == 0 {
            return Vec::new();
        }

        let mut out = Vec::new();
        if stats.format_rate < FORMAT_RATE_THRESHOLD {
            out.push(format!(
                "Format compliance is low ({:.1}%); enforce the format more strongly",
                stats.format_rate
            ));
        }
        if stats.type_rate < TYPE_RATE_THRESHOLD {
            out.push(format!(
                "Type detection needs work ({:.1}%); review the examples and type rules",
                stats.type_rate
            ));
        }

        let mut inconsistent: Vec<ScenarioStats> = self
            .scenario_stats()
            .into_iter()
            .filter(|s| s.accuracy() < CONSISTENCY_THRESHOLD)
            .collect();
        inconsistent.sort_by(|a, b| a.accuracy().total_cmp(&b.accuracy()));
        for scenario in inconsistent {
            out.push(format!(
                "Improve consistency for {}: {:.1}% consistent",
                scenario.scenario,
                scenario.accuracy()
            ));
        }
        out
    }

    /// Issue kind frequencies over completed rounds, most frequent first.
    pub fn issue_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for analysis in self.results.iter().filter_map(RoundResult::analysis) {
            for issue in &analysis.issues {
                *counts.entry(issue.kind()).or_default() += 1;
            }
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts
    }
}

/// The outcome of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub rounds: u32,
    pub models: Vec<ModelRun>,
}

impl Report {
    pub fn new(rounds: u32, models: Vec<ModelRun>) -> Self {
        Self {
            generated_at: Local::now(),
            rounds,
            models,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.models.len() > 1
    }

    /// Model with the highest overall rate among models that completed rounds.
    pub fn best_model(&self) -> Option<(&str, ModelStats)> {
        self.models
            .iter()
            .map(|m| (m.label.as_str(), m.stats()))
            .filter(|(_, s)| s.completed > 0)
            .max_by(|a, b| a.1.overall_rate.total_cmp(&b.1.overall_rate))
    }

    /// Human-readable report.
    pub fn render_text(&self) -> String {
        let title = if self.is_comparison() {
            "Multi-Model Commit Message Generation Comparison"
        } else {
            "Automated Commit Message Generation Test Report"
        };
        let mut out = format!(
            "{title}\nGenerated: {}\nRounds per scenario: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.rounds
        );

        if self.is_comparison() {
            out.push_str(&self.render_comparison());
        }
        for model in &self.models {
            out.push_str(&render_model(model));
        }
        out
    }

    fn render_comparison(&self) -> String {
        let mut out = String::from("\nCROSS-MODEL PERFORMANCE SUMMARY\n===============================\n");
        out.push_str(&format!("{:<40} | Format |  Type  | Scope  | Overall\n", "Model"));
        out.push_str(&format!("{:-<40}-|--------|--------|--------|--------\n", ""));
        for model in &self.models {
            match &model.skipped {
                Some(reason) if model.results.is_empty() => {
                    out.push_str(&format!("{:<40} | skipped: {reason}\n", model.label));
                }
                _ => {
                    let s = model.stats();
                    out.push_str(&format!(
                        "{:<40} | {:5.1}% | {:5.1}% | {:5.1}% | {:6.1}%\n",
                        model.label, s.format_rate, s.type_rate, s.scope_rate, s.overall_rate
                    ));
                }
            }
        }
        if let Some((label, stats)) = self.best_model() {
            out.push_str(&format!("\nBest overall: {label} ({:.1}%)\n", stats.overall_rate));
        }

        let shared = self.shared_issues();
        if !shared.is_empty() {
            out.push_str("\nCROSS-MODEL ISSUE PATTERNS\n==========================\n");
            for (kind, per_model) in shared {
                let counts: Vec<String> = per_model
                    .iter()
                    .map(|(label, count)| format!("{label}({count})"))
                    .collect();
                out.push_str(&format!("  - {kind}: {}\n", counts.join(" ")));
            }
        }

        let insights = self.insights();
        if !insights.is_empty() {
            out.push_str("\nCROSS-MODEL INSIGHTS\n====================\n");
            for insight in insights {
                out.push_str(&format!("  - {insight}\n"));
            }
        }
        out
    }

    /// Issue kinds seen in more than one model, with per-model counts.
    pub fn shared_issues(&self) -> Vec<(&'static str, Vec<(&str, usize)>)> {
        let mut by_kind: BTreeMap<&'static str, Vec<(&str, usize)>> = BTreeMap::new();
        for model in &self.models {
            for (kind, count) in model.issue_counts() {
                by_kind.entry(kind).or_default().push((model.label.as_str(), count));
            }
        }
        by_kind
            .into_iter()
            .filter(|(_, per_model)| per_model.len() > 1)
            .collect()
    }

    /// Observations comparing models that completed rounds.
    pub fn insights(&self) -> Vec<String> {
        let stats: Vec<ModelStats> = self
            .models
            .iter()
            .map(ModelRun::stats)
            .filter(|s| s.completed > 0)
            .collect();
        if stats.len() < 2 {
            return Vec::new();
        }

        let mut insights = Vec::new();
        let (low, high) = stats.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
            (lo.min(s.type_rate), hi.max(s.type_rate))
        });
        if high - low > TYPE_GAP_THRESHOLD {
            insights.push(format!(
                "Large type accuracy gap ({high:.1}% - {low:.1}%) suggests model-specific prompt tuning"
            ));
        }
        if stats.iter().all(|s| s.format_rate > FORMAT_GENERALIZES_THRESHOLD) {
            insights.push("Format rules generalize well across models".to_string());
        }
        insights.push("Weigh model size against accuracy before choosing a default".to_string());
        insights
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string_pretty(self).map_err(BatchError::Serialize)
    }

    /// File name stem: `test_report_<ts>` or `multi_model_comparison_<ts>`.
    pub fn file_stem(&self) -> String {
        let prefix = if self.is_comparison() {
            "multi_model_comparison"
        } else {
            "test_report"
        };
        format!("{prefix}_{}", self.generated_at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the text report (and optionally JSON) into `dir`.
    ///
    /// Returns the path of the text report.
    pub fn write_to(&self, dir: &Path, json: bool) -> Result<PathBuf, BatchError> {
        let stem = self.file_stem();
        let text_path = dir.join(format!("{stem}.txt"));
        write_atomic(&text_path, &self.render_text())?;

        if json {
            write_atomic(&dir.join(format!("{stem}.json")), &self.to_json()?)?;
        }

        info!(path = %text_path.display(), "Wrote batch report");
        Ok(text_path)
    }
}

fn render_model(model: &ModelRun) -> String {
    let stats = model.stats();
    let mut out = format!("\nMODEL: {}\n{}\n", model.label, "=".repeat(7 + model.label.len()));

    if let Some(reason) = &model.skipped {
        out.push_str(&format!("Skipped: {reason}\n"));
        if model.results.is_empty() {
            return out;
        }
    }

    out.push_str(&format!(
        "Rounds attempted: {}, completed: {}, failed: {}\n",
        stats.attempted, stats.completed, stats.failed
    ));
    out.push_str(&format!("Format correct: {:.1}%\n", stats.format_rate));
    out.push_str(&format!("Type correct:   {:.1}%\n", stats.type_rate));
    out.push_str(&format!("Scope correct:  {:.1}%\n", stats.scope_rate));
    out.push_str(&format!("Overall:        {:.1}%\n", stats.overall_rate));

    out.push_str("\nBy scenario:\n");
    for scenario in model.scenario_stats() {
        out.push_str(&format!(
            "  {:<26} expected {:<18} {}/{} ({:.1}%)\n",
            scenario.scenario,
            scenario.expected,
            scenario.matches,
            scenario.attempted,
            scenario.accuracy()
        ));
        for result in model.results.iter().filter(|r| r.scenario == scenario.scenario) {
            out.push_str(&render_round(result));
        }
    }

    let issues = model.issue_counts();
    if !issues.is_empty() {
        out.push_str("\nCommon issues:\n");
        for (kind, count) in issues {
            out.push_str(&format!(
                "  - {kind}: {count} times ({:.1}%)\n",
                ratio(count, stats.completed)
            ));
        }
    }

    let recommendations = model.recommendations();
    if !recommendations.is_empty() {
        out.push_str("\nRecommendations:\n");
        for recommendation in recommendations {
            out.push_str(&format!("  - {recommendation}\n"));
        }
    }
    out
}

fn render_round(result: &RoundResult) -> String {
    match &result.outcome {
        RoundOutcome::Completed { analysis, .. } => {
            let status = if analysis.is_match() { "ok  " } else { "FAIL" };
            let summary = match (&analysis.actual_type, analysis.has_format) {
                (Some(ty), true) => format!(
                    "{ty}({}): {}",
                    analysis.actual_scope.as_deref().unwrap_or("?"),
                    truncate_chars(&analysis.subject, 40)
                ),
                _ => format!("no format: {}", truncate_chars(&analysis.subject, 40)),
            };
            let mut line = format!("    round {}: {status} {summary}\n", result.round);
            if !analysis.issues.is_empty() {
                let issues: Vec<String> = analysis.issues.iter().map(ToString::to_string).collect();
                line.push_str(&format!("             issues: {}\n", issues.join(", ")));
            }
            line
        }
        RoundOutcome::Failed { error, reason } => {
            format!("    round {}: ERR  {error}: {reason}\n", result.round)
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Percentage, or 0 when there is nothing to divide by.
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), BatchError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let to_err = |source: std::io::Error| BatchError::ReportWrite {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(to_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(to_err)?;
    tmp.write_all(contents.as_bytes()).map_err(to_err)?;
    tmp.persist(path).map_err(|e| to_err(e.error))?;
    Ok(())
}
