//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! All metrics are prefixed with `vedrfolnir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total scored outcomes.
///
/// Labels: `result` ("correct" | "incorrect" | "unparseable").
pub const OUTCOMES_TOTAL: &str = "vedrfolnir_outcomes_total";

/// Duration of one selection call (request plus decode) in seconds.
///
/// Labels: `provider`.
pub const SELECTION_DURATION_SECONDS: &str = "vedrfolnir_selection_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `reason` ("rate_limited" | "server_error" |
/// "empty_response" | "transport").
pub const RETRIES_TOTAL: &str = "vedrfolnir_retries_total";

/// Records skipped because of per-record data errors.
pub const SKIPPED_RECORDS_TOTAL: &str = "vedrfolnir_skipped_records_total";
