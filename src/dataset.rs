//! Labeled prompt dataset loader.
//!
//! The dataset is a CSV file with a header row. Row order is significant:
//! each record's ambiguity category comes from its position, assigned by a
//! [`CategoryClassifier`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::category::CategoryClassifier;
use crate::types::PromptRecord;
use crate::{Result, VedrError};

/// Default header of the prompt column.
pub const DEFAULT_PROMPT_COLUMN: &str = "prompt";

/// Default header of the expected-function column.
pub const DEFAULT_EXPECTED_COLUMN: &str = "function(s) to call";

/// Column names to read from the dataset header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub prompt: String,
    pub expected: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT_COLUMN.to_string(),
            expected: DEFAULT_EXPECTED_COLUMN.to_string(),
        }
    }
}

/// Load records from a CSV file on disk.
pub fn load_path(
    path: impl AsRef<Path>,
    columns: &Columns,
    classifier: &dyn CategoryClassifier,
) -> Result<Vec<PromptRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        VedrError::DataFormat(format!("failed to open dataset {}: {e}", path.display()))
    })?;
    let records = load(file, columns, classifier)?;
    debug!(path = %path.display(), count = records.len(), "dataset loaded");
    Ok(records)
}

/// Load records from any CSV source, preserving storage order.
///
/// Fails with [`VedrError::DataFormat`] only when a required column is
/// missing from the header. A row that lacks a field, or cannot be decoded,
/// still yields a record at its position with the missing values empty; the
/// evaluator rejects it and the rest of the run goes on.
///
/// Prompt text is kept verbatim. Headers and labels are trimmed.
pub fn load<R: Read>(
    source: R,
    columns: &Columns,
    classifier: &dyn CategoryClassifier,
) -> Result<Vec<PromptRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| VedrError::DataFormat(format!("missing column '{name}'")))
    };
    let prompt_idx = column_index(&columns.prompt)?;
    let expected_idx = column_index(&columns.expected)?;

    let mut records = Vec::new();
    for (position, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(row = position + 1, error = %e, "unreadable dataset row");
                records.push(PromptRecord::new(
                    position,
                    "",
                    "",
                    classifier.classify(position),
                ));
                continue;
            }
        };
        if row.len() <= prompt_idx.max(expected_idx) {
            warn!(
                row = position + 1,
                fields = row.len(),
                "dataset row is missing fields"
            );
        }
        let text = row.get(prompt_idx).unwrap_or_default();
        let expected_function = row.get(expected_idx).unwrap_or_default().trim();
        records.push(PromptRecord::new(
            position,
            text,
            expected_function,
            classifier.classify(position),
        ));
    }
    Ok(records)
}
