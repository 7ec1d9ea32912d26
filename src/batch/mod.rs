//! Batch testing of commit message quality across models.
//!
//! Runs the pipeline over a fixed corpus of synthetic scenarios, grades each
//! generated message against the expected type and scope, and aggregates the
//! results into a text (and optionally JSON) report.

pub mod analysis;
pub mod report;
pub mod runner;
pub mod scenarios;

pub use analysis::{Analysis, Issue, analyze};
pub use report::{ModelRun, ModelStats, Report, RoundOutcome, RoundResult, ScenarioStats};
pub use runner::{BatchOptions, BatchTester, DEFAULT_DELAY, DEFAULT_ROUNDS, ModelSpec};
pub use scenarios::{SCENARIOS, Scenario, find_scenario};
