//! Evaluation report: the final, immutable snapshot of a run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::Result;
use crate::engine::EvaluationSettings;
use crate::stats::{Statistics, Tally};
use crate::types::DecisionOutcome;

/// Totals and derived accuracy for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakdown {
    pub total: u64,
    pub correct: u64,
    pub accuracy: f64,
}

impl From<Tally> for Breakdown {
    fn from(tally: Tally) -> Self {
        Self {
            total: tally.total,
            correct: tally.correct,
            accuracy: tally.accuracy(),
        }
    }
}

/// Outcomes picked for qualitative review.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterestingExamples {
    pub successes: Vec<DecisionOutcome>,
    pub failures: Vec<DecisionOutcome>,
}

/// Final report of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total_prompts: u64,
    pub correct: u64,
    pub overall_accuracy: f64,
    /// Keyed by expected function, in first-seen order.
    pub function_breakdown: IndexMap<String, Breakdown>,
    /// Every named category (zero-total included), then `Unknown` if seen.
    pub ambiguity_type_breakdown: IndexMap<String, Breakdown>,
    pub interesting_examples: InterestingExamples,
    /// Records skipped because of data errors.
    pub skipped_records: u64,
}

impl EvaluationReport {
    /// Reduce statistics and the result log into a report.
    ///
    /// Examples are the first `example_limit` successes and failures, in log
    /// order, whose prompt is longer than `example_min_chars` characters.
    pub fn build(
        stats: &Statistics,
        log: &[DecisionOutcome],
        skipped_records: u64,
        settings: &EvaluationSettings,
    ) -> Self {
        let overall = stats.overall();

        let pick = |want_correct: bool| -> Vec<DecisionOutcome> {
            log.iter()
                .filter(|o| o.is_correct == want_correct)
                .filter(|o| o.prompt.chars().count() > settings.example_min_chars)
                .take(settings.example_limit)
                .cloned()
                .collect()
        };

        Self {
            total_prompts: overall.total,
            correct: overall.correct,
            overall_accuracy: overall.accuracy(),
            function_breakdown: stats
                .by_function()
                .iter()
                .map(|(name, tally)| (name.clone(), Breakdown::from(*tally)))
                .collect(),
            ambiguity_type_breakdown: stats
                .by_category()
                .iter()
                .map(|(category, tally)| (category.label().to_string(), Breakdown::from(*tally)))
                .collect(),
            interesting_examples: InterestingExamples {
                successes: pick(true),
                failures: pick(false),
            },
            skipped_records,
        }
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report to `<dir>/evaluation_report_<timestamp>.json`,
    /// creating `dir` if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.save_at(dir, Local::now())
    }

    /// Like [`save`](Self::save) with an explicit timestamp for the file name.
    pub fn save_at(&self, dir: impl AsRef<Path>, at: DateTime<Local>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "evaluation_report_{}.json",
            at.format("%Y%m%d_%H%M%S")
        ));
        fs::write(&path, self.to_json_pretty()?)?;
        info!(path = %path.display(), "report saved");
        Ok(path)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ambiguity Resolution Evaluation Report ===")?;
        writeln!(f)?;
        writeln!(f, "Total Prompts Processed: {}", self.total_prompts)?;
        writeln!(f, "Overall Accuracy: {:.2}%", self.overall_accuracy)?;
        if self.skipped_records > 0 {
            writeln!(f, "Skipped Records: {}", self.skipped_records)?;
        }

        writeln!(f)?;
        writeln!(f, "Function Breakdown:")?;
        for (name, b) in &self.function_breakdown {
            writeln!(f)?;
            writeln!(f, "{name}:")?;
            writeln!(f, "  Total Calls: {}", b.total)?;
            writeln!(f, "  Correct Calls: {}", b.correct)?;
            writeln!(f, "  Accuracy: {:.2}%", b.accuracy)?;
        }

        writeln!(f)?;
        writeln!(f, "Ambiguity Type Breakdown:")?;
        for (label, b) in &self.ambiguity_type_breakdown {
            writeln!(
                f,
                "  {label}: {}/{} ({:.2}%)",
                b.correct, b.total, b.accuracy
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Interesting Examples:")?;
        write_examples(f, "Successful Resolutions:", &self.interesting_examples.successes)?;
        write_examples(f, "Failed Resolutions:", &self.interesting_examples.failures)
    }
}

fn write_examples(f: &mut fmt::Formatter<'_>, title: &str, examples: &[DecisionOutcome]) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    for example in examples {
        writeln!(f)?;
        writeln!(f, "Prompt: {}", example.prompt)?;
        writeln!(
            f,
            "Selected Function: {}",
            example.selected_function.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Expected Function: {}", example.expected_function)?;
        writeln!(
            f,
            "LLM Reasoning: {}",
            example.decision.reasoning().unwrap_or("N/A")
        )?;
    }
    Ok(())
}
