//! Evaluation engine.
//!
//! [`Evaluator`] drives the selection client over a dataset, scores every
//! decision against its label, and owns the run's statistics and result log.
//! All state lives in the instance, so separate runs never share counters.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vedrfolnir::{Evaluator, OpenAiClient, PositionalClassifier, SelectionClient, dataset};
//!
//! #[tokio::main]
//! async fn main() -> vedrfolnir::Result<()> {
//!     let provider = Arc::new(OpenAiClient::new("sk-your-key")?);
//!     let evaluator = Evaluator::new(SelectionClient::new(provider));
//!
//!     let records = dataset::load_path(
//!         "prompts.csv",
//!         &dataset::Columns::default(),
//!         &PositionalClassifier,
//!     )?;
//!     evaluator.run(&records).await;
//!
//!     println!("{}", evaluator.report());
//!     Ok(())
//! }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, error, info};

use crate::actions;
use crate::report::EvaluationReport;
use crate::selection::SelectionClient;
use crate::stats::Statistics;
use crate::telemetry;
use crate::types::{Decision, DecisionOutcome, PromptRecord};
use crate::{Result, VedrError};

/// Prompts longer than this many characters qualify as interesting examples.
pub const DEFAULT_EXAMPLE_MIN_CHARS: usize = 50;

/// Maximum successes and failures listed in a report.
pub const DEFAULT_EXAMPLE_LIMIT: usize = 3;

/// Tunables for one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// Selection calls allowed in flight at once. 1 = strictly sequential.
    pub concurrency: usize,
    pub example_min_chars: usize,
    pub example_limit: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            example_min_chars: DEFAULT_EXAMPLE_MIN_CHARS,
            example_limit: DEFAULT_EXAMPLE_LIMIT,
        }
    }
}

impl EvaluationSettings {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn example_min_chars(mut self, n: usize) -> Self {
        self.example_min_chars = n;
        self
    }

    pub fn example_limit(mut self, n: usize) -> Self {
        self.example_limit = n;
        self
    }
}

#[derive(Debug, Default)]
struct EvalState {
    stats: Statistics,
    log: Vec<DecisionOutcome>,
    skipped: u64,
}

/// Scores model decisions and accumulates run statistics.
pub struct Evaluator {
    client: SelectionClient,
    settings: EvaluationSettings,
    state: Mutex<EvalState>,
}

impl Evaluator {
    /// Create an evaluator with default settings.
    pub fn new(client: SelectionClient) -> Self {
        Self::with_settings(client, EvaluationSettings::default())
    }

    pub fn with_settings(client: SelectionClient, settings: EvaluationSettings) -> Self {
        Self {
            client,
            settings,
            state: Mutex::new(EvalState::default()),
        }
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Evaluate a single record and fold its outcome into the run state.
    ///
    /// Returns [`VedrError::DataFormat`] without touching any state when the
    /// record has no prompt text or no expected function.
    pub async fn evaluate_one(&self, record: &PromptRecord) -> Result<DecisionOutcome> {
        validate(record)?;
        let decision = self.client.select(&record.text).await;
        let outcome = score(record, decision);
        self.fold(outcome.clone());
        Ok(outcome)
    }

    /// Evaluate every record in dataset order.
    ///
    /// Per-record failures are logged and skipped; the run always continues.
    /// With `concurrency > 1` selection calls overlap, but outcomes are
    /// folded strictly in input order so the result log matches a
    /// sequential run.
    pub async fn run(&self, records: &[PromptRecord]) {
        let concurrency = self.settings.concurrency.max(1);
        info!(records = records.len(), concurrency, "starting evaluation");

        let mut decisions = stream::iter(records.iter().map(|record| async move {
            let decision = match validate(record) {
                Ok(()) => Ok(self.client.select(&record.text).await),
                Err(e) => Err(e),
            };
            (record, decision)
        }))
        .buffered(concurrency);

        while let Some((record, decision)) = decisions.next().await {
            match decision {
                Ok(decision) => {
                    let outcome = score(record, decision);
                    info!(
                        position = record.position,
                        correct = outcome.is_correct,
                        "processed prompt: {}...",
                        preview(&record.text)
                    );
                    self.fold(outcome);
                }
                Err(e) => {
                    error!(position = record.position, error = %e, "error processing prompt");
                    metrics::counter!(telemetry::SKIPPED_RECORDS_TOTAL).increment(1);
                    self.lock().skipped += 1;
                }
            }
        }
    }

    /// Reduce the current state into a report. Does not mutate anything.
    pub fn report(&self) -> EvaluationReport {
        let state = self.lock();
        EvaluationReport::build(&state.stats, &state.log, state.skipped, &self.settings)
    }

    /// Snapshot of the statistics accumulated so far.
    pub fn statistics(&self) -> Statistics {
        self.lock().stats.clone()
    }

    /// Snapshot of the result log in fold order.
    pub fn outcomes(&self) -> Vec<DecisionOutcome> {
        self.lock().log.clone()
    }

    /// Records skipped because of per-record data errors.
    pub fn skipped(&self) -> u64 {
        self.lock().skipped
    }

    /// Apply one outcome to all accumulators and the log in a single step.
    fn fold(&self, outcome: DecisionOutcome) {
        let result = match (&outcome.selected_function, outcome.is_correct) {
            (None, _) => "unparseable",
            (Some(_), true) => "correct",
            (Some(_), false) => "incorrect",
        };
        metrics::counter!(telemetry::OUTCOMES_TOTAL, "result" => result).increment(1);

        let mut state = self.lock();
        state.stats.record(&outcome);
        state.log.push(outcome);
    }

    fn lock(&self) -> MutexGuard<'_, EvalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(record: &PromptRecord) -> Result<()> {
    if record.text.trim().is_empty() {
        return Err(VedrError::DataFormat(format!(
            "record {} has no prompt text",
            record.position
        )));
    }
    if record.expected_function.trim().is_empty() {
        return Err(VedrError::DataFormat(format!(
            "record {} has no expected function",
            record.position
        )));
    }
    if actions::find(&record.expected_function).is_none() {
        debug!(
            position = record.position,
            expected = %record.expected_function,
            "expected function is not in the action catalog"
        );
    }
    Ok(())
}

/// Score a decision against the record's label. An undecodable decision
/// never matches.
pub fn score(record: &PromptRecord, decision: Decision) -> DecisionOutcome {
    let selected_function = decision.selected_function().map(str::to_string);
    let is_correct = selected_function.as_deref() == Some(record.expected_function.as_str());
    DecisionOutcome {
        position: record.position,
        prompt: record.text.clone(),
        expected_function: record.expected_function.clone(),
        category: record.category,
        selected_function,
        decision,
        is_correct,
        timestamp: Utc::now(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
