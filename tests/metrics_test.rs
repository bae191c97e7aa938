//! Metrics emitted by the selection client and the evaluation engine.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use vedrfolnir::telemetry;
use vedrfolnir::{
    ChatOptions, ChatProvider, ChatResponse, Evaluator, Message, PromptRecord, Result,
    RetryConfig, RetryingChatProvider, SelectionClient, VedrError, classify,
};

// ============================================================================
// Mock providers
// ============================================================================

struct FixedProvider {
    reply: &'static str,
}

#[async_trait]
impl ChatProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
        Ok(ChatResponse {
            content: self.reply.to_string(),
            ..Default::default()
        })
    }
}

struct FailingProvider;

#[async_trait]
impl ChatProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
        Err(VedrError::AuthenticationFailed)
    }
}

/// Throttled on the first call, answers after that.
struct ThrottledOnce {
    throttled: AtomicBool,
}

#[async_trait]
impl ChatProvider for ThrottledOnce {
    fn name(&self) -> &str {
        "throttled"
    }

    async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
        if !self.throttled.swap(true, Ordering::Relaxed) {
            return Err(VedrError::RateLimited {
                retry_after: Some(Duration::from_millis(1)),
            });
        }
        Ok(ChatResponse {
            content: SEARCH_REPLY.to_string(),
            ..Default::default()
        })
    }
}

const SEARCH_REPLY: &str =
    r#"{"selected_function": "searchWeb", "parameters": {"query": "x"}, "reasoning": "lookup"}"#;

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum counter values for `name`, optionally restricted to one `result` label.
fn counter_total(snapshot: &SnapshotVec, name: &str, result: Option<&str>) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| {
            result.is_none_or(|want| {
                key.key()
                    .labels()
                    .any(|l| l.key() == "result" && l.value() == want)
            })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Number of histogram samples recorded for `name`.
fn histogram_samples(snapshot: &SnapshotVec, name: &str) -> usize {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Histogram(samples) => samples.len(),
            _ => 0,
        })
        .sum()
}

fn records() -> Vec<PromptRecord> {
    vec![
        PromptRecord::new(0, "look this up", "searchWeb", classify(0)),
        PromptRecord::new(1, "play it again", "playMedia", classify(1)),
        PromptRecord::new(2, "", "searchWeb", classify(2)),
    ]
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn run_records_outcomes_by_result() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = SelectionClient::new(Arc::new(FixedProvider {
                    reply: SEARCH_REPLY,
                }));
                Evaluator::new(client).run(&records()).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::OUTCOMES_TOTAL, None), 2);
    assert_eq!(
        counter_total(&snapshot, telemetry::OUTCOMES_TOTAL, Some("correct")),
        1
    );
    assert_eq!(
        counter_total(&snapshot, telemetry::OUTCOMES_TOTAL, Some("incorrect")),
        1
    );
    assert_eq!(
        counter_total(&snapshot, telemetry::SKIPPED_RECORDS_TOTAL, None),
        1
    );
    assert_eq!(
        histogram_samples(&snapshot, telemetry::SELECTION_DURATION_SECONDS),
        2,
        "skipped records never reach the provider"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_selection_counts_as_unparseable() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = SelectionClient::new(Arc::new(FailingProvider));
                Evaluator::new(client).run(&records()[..2]).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(&snapshot, telemetry::OUTCOMES_TOTAL, Some("unparseable")),
        2
    );
    assert_eq!(
        histogram_samples(&snapshot, telemetry::SELECTION_DURATION_SECONDS),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_are_counted_by_reason() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let decision = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let inner = Arc::new(ThrottledOnce {
                    throttled: AtomicBool::new(false),
                });
                let retry = RetryConfig {
                    max_attempts: 3,
                    ..RetryConfig::default()
                };
                let client = SelectionClient::new(Arc::new(RetryingChatProvider::new(inner, retry)));
                client.select("look this up").await
            })
        })
    });
    assert!(decision.is_decoded());

    let snapshot = snapshotter.snapshot().into_vec();

    let rate_limited = snapshot
        .iter()
        .filter(|(key, _, _, _)| key.key().name() == telemetry::RETRIES_TOTAL)
        .filter(|(key, _, _, _)| {
            key.key()
                .labels()
                .any(|l| l.key() == "reason" && l.value() == "rate_limited")
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum::<u64>();
    assert_eq!(rate_limited, 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let client = SelectionClient::new(Arc::new(FixedProvider {
        reply: SEARCH_REPLY,
    }));
    let decision = client.select("look this up").await;
    assert_eq!(decision.selected_function(), Some("searchWeb"));
}
