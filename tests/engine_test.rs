use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vedrfolnir::dataset::{self, Columns};
use vedrfolnir::{
    AmbiguityCategory, ChatOptions, ChatProvider, ChatResponse, EvaluationSettings, Evaluator,
    Message, PositionalClassifier, PromptRecord, Result, Role, SelectionClient, VedrError,
    classify,
};

// ============================================================================
// Mock provider
// ============================================================================

/// Answers each prompt from a script keyed by prompt text.
///
/// `None` replies with prose that cannot be decoded. Prompts missing from
/// the script fail with an HTTP error.
struct ScriptedProvider {
    script: HashMap<String, (Option<&'static str>, Duration)>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(entries: &[(&str, Option<&'static str>)]) -> Arc<Self> {
        Self::with_delays(
            &entries
                .iter()
                .map(|(p, f)| (*p, *f, Duration::ZERO))
                .collect::<Vec<_>>(),
        )
    }

    fn with_delays(entries: &[(&str, Option<&'static str>, Duration)]) -> Arc<Self> {
        Arc::new(Self {
            script: entries
                .iter()
                .map(|(prompt, function, delay)| (prompt.to_string(), (*function, *delay)))
                .collect(),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let prompt = messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let (function, delay) = self
            .script
            .get(prompt)
            .copied()
            .ok_or_else(|| VedrError::Http("connection refused".into()))?;
        tokio::time::sleep(delay).await;
        let content = match function {
            Some(name) => serde_json::json!({
                "selected_function": name,
                "parameters": {},
                "reasoning": format!("{name} fits best"),
            })
            .to_string(),
            None => "I think you want the weather?".to_string(),
        };
        Ok(ChatResponse {
            content,
            ..Default::default()
        })
    }
}

const UMBRELLA: &str = "What's the weather like, and can you also check if I need an umbrella?";
const BOOK: &str = "Book me something for tomorrow";
const LATE: &str = "tell the team we're running late";

fn scenario_records() -> Vec<PromptRecord> {
    let csv = format!(
        "prompt,function(s) to call\n\"{UMBRELLA}\",weatherCheck\n{BOOK},scheduleAppointment\n{LATE},sendMessage\n"
    );
    dataset::load(csv.as_bytes(), &Columns::default(), &PositionalClassifier).unwrap()
}

fn scenario_evaluator() -> (Arc<ScriptedProvider>, Evaluator) {
    let provider = ScriptedProvider::new(&[
        (UMBRELLA, Some("weatherCheck")),
        (BOOK, None),
        (LATE, Some("sendMessage")),
    ]);
    let evaluator = Evaluator::new(SelectionClient::new(provider.clone()));
    (provider, evaluator)
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn three_record_scenario() {
    let (provider, evaluator) = scenario_evaluator();
    let records = scenario_records();
    assert_eq!(records[0].category, AmbiguityCategory::Unknown);
    assert_eq!(records[1].category, AmbiguityCategory::Lexical);
    assert_eq!(records[2].category, AmbiguityCategory::Lexical);

    evaluator.run(&records).await;
    let report = evaluator.report();

    assert_eq!(provider.calls(), 3);
    assert_eq!(report.total_prompts, 3);
    assert_eq!(report.correct, 2);
    assert!((report.overall_accuracy - 200.0 / 3.0).abs() < 0.01);

    let unknown = &report.ambiguity_type_breakdown["Unknown"];
    assert_eq!((unknown.total, unknown.correct), (1, 1));
    let lexical = &report.ambiguity_type_breakdown["Lexical Ambiguity"];
    assert_eq!((lexical.total, lexical.correct), (2, 1));
    assert!((lexical.accuracy - 50.0).abs() < f64::EPSILON);

    // every named category is present, zero-total included
    assert_eq!(report.ambiguity_type_breakdown.len(), 12);
    let scopal = &report.ambiguity_type_breakdown["Scopal Ambiguity"];
    assert_eq!((scopal.total, scopal.correct, scopal.accuracy), (0, 0, 0.0));

    let booking = &report.function_breakdown["scheduleAppointment"];
    assert_eq!((booking.total, booking.correct), (1, 0));
    let keys: Vec<&str> = report.function_breakdown.keys().map(String::as_str).collect();
    assert_eq!(keys, ["weatherCheck", "scheduleAppointment", "sendMessage"]);

    // only the umbrella prompt is longer than 50 characters
    assert_eq!(report.interesting_examples.successes.len(), 1);
    assert_eq!(report.interesting_examples.successes[0].prompt, UMBRELLA);
    assert!(report.interesting_examples.failures.is_empty());

    let outcomes = evaluator.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[1].selected_function.is_none());
    assert!(!outcomes[1].is_correct);
}

#[tokio::test]
async fn empty_run_reports_zero_accuracy() {
    let (_, evaluator) = scenario_evaluator();
    evaluator.run(&[]).await;

    let report = evaluator.report();
    assert_eq!(report.total_prompts, 0);
    assert_eq!(report.overall_accuracy, 0.0);
    assert!(report.function_breakdown.is_empty());
    assert_eq!(report.ambiguity_type_breakdown.len(), 11);
    assert!(!report.ambiguity_type_breakdown.contains_key("Unknown"));
}

#[tokio::test]
async fn report_is_idempotent() {
    let (_, evaluator) = scenario_evaluator();
    evaluator.run(&scenario_records()).await;

    let first = serde_json::to_string(&evaluator.report()).unwrap();
    let second = serde_json::to_string(&evaluator.report()).unwrap();
    assert_eq!(first, second);
    assert_eq!(evaluator.report(), evaluator.report());
}

#[tokio::test]
async fn each_evaluation_touches_only_its_buckets() {
    let (_, evaluator) = scenario_evaluator();

    for record in scenario_records() {
        let before = evaluator.statistics();
        let outcome = evaluator.evaluate_one(&record).await.unwrap();
        let after = evaluator.statistics();

        let bump = u64::from(outcome.is_correct);
        assert_eq!(after.overall().total, before.overall().total + 1);
        assert_eq!(after.overall().correct, before.overall().correct + bump);

        let f_before = before.function(&record.expected_function).unwrap_or_default();
        let f_after = after.function(&record.expected_function).unwrap();
        assert_eq!(f_after.total, f_before.total + 1);
        assert_eq!(f_after.correct, f_before.correct + bump);

        let c_before = before.category(record.category).unwrap_or_default();
        let c_after = after.category(record.category).unwrap();
        assert_eq!(c_after.total, c_before.total + 1);
        assert_eq!(c_after.correct, c_before.correct + bump);

        for (name, tally) in before.by_function() {
            if *name != record.expected_function {
                assert_eq!(after.function(name), Some(*tally));
            }
        }
        for (category, tally) in before.by_category() {
            if *category != record.category {
                assert_eq!(after.category(*category), Some(*tally));
            }
        }
    }
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn blank_record_is_skipped_and_run_continues() {
    let provider = ScriptedProvider::new(&[(LATE, Some("sendMessage"))]);
    let evaluator = Evaluator::new(SelectionClient::new(provider.clone()));

    let records = vec![
        PromptRecord::new(0, "   ", "searchWeb", classify(0)),
        PromptRecord::new(1, LATE, "", classify(1)),
        PromptRecord::new(2, LATE, "sendMessage", classify(2)),
    ];
    evaluator.run(&records).await;

    assert_eq!(provider.calls(), 1, "invalid records never reach the model");
    assert_eq!(evaluator.skipped(), 2);
    let report = evaluator.report();
    assert_eq!(report.total_prompts, 1);
    assert_eq!(report.correct, 1);
    assert_eq!(report.skipped_records, 2);
}

#[tokio::test]
async fn short_dataset_row_is_skipped_and_neighbours_evaluated() {
    let csv = format!("prompt,function(s) to call\n\"{UMBRELLA}\",weatherCheck\nlonely\n{LATE},sendMessage\n");
    let records = dataset::load(csv.as_bytes(), &Columns::default(), &PositionalClassifier).unwrap();
    assert_eq!(records.len(), 3);

    let (provider, evaluator) = scenario_evaluator();
    evaluator.run(&records).await;

    assert_eq!(provider.calls(), 2);
    let report = evaluator.report();
    assert_eq!(report.total_prompts, 2);
    assert_eq!(report.correct, 2);
    assert_eq!(report.skipped_records, 1);
    let positions: Vec<usize> = evaluator.outcomes().iter().map(|o| o.position).collect();
    assert_eq!(positions, [0, 2]);
    // the surviving row keeps the category of its original position
    assert_eq!(report.ambiguity_type_breakdown["Lexical Ambiguity"].total, 1);
}

#[tokio::test]
async fn evaluate_one_rejects_blank_record_without_side_effects() {
    let (provider, evaluator) = scenario_evaluator();
    let record = PromptRecord::new(4, "", "searchWeb", classify(4));

    let err = evaluator.evaluate_one(&record).await.unwrap_err();

    assert!(matches!(err, VedrError::DataFormat(_)));
    assert_eq!(provider.calls(), 0);
    assert_eq!(evaluator.report().total_prompts, 0);
    assert!(evaluator.outcomes().is_empty());
}

#[tokio::test]
async fn service_failures_are_scored_as_misses() {
    // nothing is scripted, so every call fails at the transport level
    let provider = ScriptedProvider::new(&[]);
    let evaluator = Evaluator::new(SelectionClient::new(provider.clone()));

    evaluator.run(&scenario_records()).await;

    let report = evaluator.report();
    assert_eq!(provider.calls(), 3);
    assert_eq!(report.total_prompts, 3);
    assert_eq!(report.correct, 0);
    assert_eq!(report.skipped_records, 0);
    assert_eq!(report.interesting_examples.failures.len(), 1);
}

#[tokio::test]
async fn unknown_expected_function_still_counts() {
    let provider = ScriptedProvider::new(&[(LATE, Some("sendMessage"))]);
    let evaluator = Evaluator::new(SelectionClient::new(provider));

    let record = PromptRecord::new(5, LATE, "notifyTeam", classify(5));
    let outcome = evaluator.evaluate_one(&record).await.unwrap();

    assert!(!outcome.is_correct);
    let report = evaluator.report();
    assert_eq!(report.function_breakdown["notifyTeam"].total, 1);
    assert!(!report.function_breakdown.contains_key("sendMessage"));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn concurrent_run_preserves_dataset_order() {
    let prompts: Vec<String> = (0..6).map(|i| format!("prompt number {i}")).collect();
    // earlier prompts answer slower so completions arrive out of order
    let entries: Vec<(&str, Option<&'static str>, Duration)> = prompts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let function = if i % 2 == 0 { "searchWeb" } else { "playMedia" };
            (p.as_str(), Some(function), Duration::from_millis(60 - 10 * i as u64))
        })
        .collect();
    let provider = ScriptedProvider::with_delays(&entries);
    let evaluator = Evaluator::with_settings(
        SelectionClient::new(provider.clone()),
        EvaluationSettings::default().concurrency(4),
    );

    let records: Vec<PromptRecord> = prompts
        .iter()
        .enumerate()
        .map(|(i, p)| PromptRecord::new(i, p.as_str(), "searchWeb", classify(i)))
        .collect();
    evaluator.run(&records).await;

    let positions: Vec<usize> = evaluator.outcomes().iter().map(|o| o.position).collect();
    assert_eq!(positions, [0, 1, 2, 3, 4, 5]);
    assert_eq!(provider.calls(), 6);

    let report = evaluator.report();
    assert_eq!(report.total_prompts, 6);
    assert_eq!(report.correct, 3);
}

#[tokio::test]
async fn concurrent_and_sequential_runs_agree() {
    let build = |concurrency| {
        let provider = ScriptedProvider::new(&[
            (UMBRELLA, Some("weatherCheck")),
            (BOOK, None),
            (LATE, Some("sendMessage")),
        ]);
        Evaluator::with_settings(
            SelectionClient::new(provider),
            EvaluationSettings::default().concurrency(concurrency),
        )
    };

    let sequential = build(1);
    let concurrent = build(3);
    sequential.run(&scenario_records()).await;
    concurrent.run(&scenario_records()).await;

    assert_eq!(sequential.statistics(), concurrent.statistics());
    let strip = |e: &Evaluator| -> Vec<(usize, bool)> {
        e.outcomes().iter().map(|o| (o.position, o.is_correct)).collect()
    };
    assert_eq!(strip(&sequential), strip(&concurrent));
}

#[tokio::test]
async fn separate_evaluators_do_not_share_state() {
    let (_, first) = scenario_evaluator();
    let (_, second) = scenario_evaluator();

    first.run(&scenario_records()).await;

    assert_eq!(first.report().total_prompts, 3);
    assert_eq!(second.report().total_prompts, 0);
}
