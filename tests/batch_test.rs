//! Integration tests for the batch tester.

mod common;

use std::time::Duration;

use cmai::batch::{BatchOptions, BatchTester, ModelSpec, RoundOutcome, SCENARIOS};
use cmai::config::{ProviderConfig, ProviderKind};
use cmai::prompt::TemplateStore;
use cmai::provider::RawResponse;

use common::{ScriptedTransport, ollama_body, unreachable};

fn options(rounds: u32, scenario: Option<&str>) -> BatchOptions {
    BatchOptions {
        rounds,
        scenario: scenario.map(str::to_string),
        delay: Duration::ZERO,
        preflight: false,
    }
}

fn ollama_stored() -> ProviderConfig {
    ProviderConfig::defaults_for(ProviderKind::Ollama).unwrap()
}

fn spec(s: &str) -> ModelSpec {
    s.parse().unwrap()
}

/// Answer every scenario with its expected type and scope.
fn expected_answer(request: &cmai::provider::HttpRequest) -> String {
    let prompt: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    let prompt = prompt["prompt"].as_str().unwrap();
    let scenario = SCENARIOS
        .iter()
        .find(|s| prompt.contains(&format!("<file_changes>\n{}\n</file_changes>", s.changeset())))
        .expect("prompt matches a scenario");
    let scope = scenario.expected_scope.map(|s| format!("({s})")).unwrap_or_default();
    format!("{}{}: update code\n\n- detail", scenario.expected_type, scope)
}

#[tokio::test]
async fn test_round_three_failure_gives_two_thirds_accuracy() {
    // Rounds run scenario by scenario within a round, so with every scenario
    // selected the simple_fix call of round 3 is call 2 * SCENARIOS.len()
    let failing_call = 2 * SCENARIOS.len();
    let transport = ScriptedTransport::new(move |call, request| {
        if call == failing_call {
            return Err(unreachable("connection reset"));
        }
        Ok(RawResponse::ok(ollama_body(&expected_answer(request))))
    });
    let templates = TemplateStore::builtin();
    let tester = BatchTester::new(&transport, &templates, options(3, None));

    let report = tester.run(&[spec("qwen3:1.7b")], &ollama_stored()).await.unwrap();

    assert_eq!(transport.call_count(), 3 * SCENARIOS.len());
    let run = &report.models[0];
    assert_eq!(run.results.len(), 3 * SCENARIOS.len());
    assert!(run.skipped.is_none());

    let stats = run.scenario_stats();
    let simple_fix = stats.iter().find(|s| s.scenario == "simple_fix").unwrap();
    assert_eq!(simple_fix.attempted, 3);
    assert_eq!(simple_fix.matches, 2);
    assert_eq!(simple_fix.failures, 1);
    assert!((simple_fix.accuracy() - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(simple_fix.failure_reasons.len(), 1);
    assert!(simple_fix.failure_reasons[0].starts_with("round 3: ProviderUnreachable"));
    assert!(simple_fix.failure_reasons[0].contains("connection reset"));

    // Every other scenario still ran all three rounds
    for other in stats.iter().filter(|s| s.scenario != "simple_fix") {
        assert_eq!(other.attempted, 3, "{}", other.scenario);
        assert_eq!(other.accuracy(), 100.0, "{}", other.scenario);
    }
}

#[tokio::test]
async fn test_missing_credential_skips_model_but_others_run() {
    let transport = ScriptedTransport::ollama_message("fix(utils): require dot\n\n- Reject bare hosts");
    let templates = TemplateStore::builtin();
    let tester = BatchTester::new(&transport, &templates, options(2, Some("simple_fix")));

    let report = tester
        .run(
            &[spec("openrouter:google/gemini-flash-1.5-8b"), spec("qwen3:1.7b")],
            &ollama_stored(),
        )
        .await
        .unwrap();

    assert_eq!(report.models.len(), 2);
    let skipped = &report.models[0];
    assert!(skipped.results.is_empty());
    assert!(skipped.skipped.as_deref().unwrap().contains("No API key configured"));

    let ran = &report.models[1];
    assert_eq!(ran.results.len(), 2);
    assert!(ran.results.iter().all(|r| r.is_match()));
    assert_eq!(transport.call_count(), 2);

    let text = report.render_text();
    assert!(text.contains("Multi-Model Commit Message Generation Comparison"));
    assert!(text.contains("Best overall: ollama:qwen3:1.7b (100.0%)"));
}

#[tokio::test]
async fn test_graded_messages_record_issues() {
    let transport = ScriptedTransport::new(|call, _| {
        let message = match call {
            0 => "feat(email): validate domains.",
            _ => "I fixed the email validation",
        };
        Ok(RawResponse::ok(ollama_body(message)))
    });
    let templates = TemplateStore::builtin();
    let tester = BatchTester::new(&transport, &templates, options(2, Some("simple_fix")));

    let report = tester.run(&[spec("qwen3:1.7b")], &ollama_stored()).await.unwrap();
    let run = &report.models[0];

    let stats = run.stats();
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.format_rate, 50.0);
    assert_eq!(stats.overall_rate, 0.0);

    let issues: Vec<&str> = run.issue_counts().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(issues[0], "missing body");
    assert!(issues.contains(&"wrong type"));
    assert!(issues.contains(&"wrong scope"));
    assert!(issues.contains(&"subject ends with period"));
    assert!(issues.contains(&"missing format"));

    match &run.results[1].outcome {
        RoundOutcome::Completed { message, analysis } => {
            assert_eq!(message, "I fixed the email validation");
            assert!(!analysis.has_format);
        }
        other => panic!("Expected a completed round, got {:?}", other),
    }
}

#[tokio::test]
async fn test_report_written_to_disk() {
    let transport = ScriptedTransport::ollama_message("fix(utils): require dot\n\n- Reject bare hosts");
    let templates = TemplateStore::builtin();
    let tester = BatchTester::new(&transport, &templates, options(1, Some("simple_fix")));
    let report = tester.run(&[spec("qwen3:1.7b")], &ollama_stored()).await.unwrap();

    let dir = common::temp_test_dir();
    let path = report.write_to(dir.path(), false).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("test_report_"));
    assert!(name.ends_with(".txt"));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("MODEL: ollama:qwen3:1.7b"));
    assert!(!path.with_extension("json").exists());
}
